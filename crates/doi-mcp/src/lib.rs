//! MCP server exposing the diff quiz to agents and IDEs.
//!
//! Implements a Model Context Protocol server using rmcp. The host runs the
//! git commands from `get_git_commands` itself, passes the output to
//! `analyze_diff` or `build_quiz_prompt`, quizzes the developer, and stores
//! the result with `record_vibe_debt`.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use doi_core::DoiConfig;
//!
//! # async fn example() -> Result<(), doi_core::DoiError> {
//! doi_mcp::server::run_server(PathBuf::from("."), DoiConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod server;
pub mod tools;
