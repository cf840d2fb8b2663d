//! MCP server setup and lifecycle.

use std::path::PathBuf;

use doi_core::{DoiConfig, DoiError};
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};

use crate::tools::DoiServer;

const SERVER_INSTRUCTIONS: &str = "\
doi checks that a developer understands the branch they are about to ship.\n\
Typical flow:\n\
- get_git_commands: git commands to run in the repository\n\
- analyze_diff: turn their output into a categorized summary with key files\n\
- build_quiz_prompt: prompts for writing multiple-choice questions about the change\n\
- record_vibe_debt: grade the developer's answers and store missed questions\n\
- list_vibe_debt: show stored vibe-debt records";

#[tool_handler]
impl ServerHandler for DoiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "doi".to_string(),
                title: Some("Do I understand this?".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some("Diff comprehension quiz and vibe-debt tracker".to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the MCP server on stdio transport.
///
/// Blocks until the client closes stdin.
///
/// # Errors
///
/// Returns [`DoiError`] if the server fails to initialize or hits a
/// transport error.
pub async fn run_server(repo_path: PathBuf, config: DoiConfig) -> Result<(), DoiError> {
    let server = DoiServer::with_config(repo_path, config);
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| DoiError::Config(format!("MCP server failed to start: {e}")))?;

    service
        .waiting()
        .await
        .map_err(|e| DoiError::Config(format!("MCP server error: {e}")))?;

    Ok(())
}
