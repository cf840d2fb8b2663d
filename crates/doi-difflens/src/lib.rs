//! Git diff parsing, change categorization, and key-file ranking.
//!
//! Turns raw `git diff --numstat` / `--name-status` / `git log` text into a
//! [`doi_core::GitDiff`], then derives a [`summary::DiffSummary`]: changes
//! grouped by category, the files most worth reviewing, and the inferred
//! purpose of the branch. Everything past the parser is pure and
//! deterministic; the only I/O lives in [`commands::GitCommand::run`].

pub mod categorize;
pub mod commands;
pub mod intent;
pub mod keyfiles;
pub mod parser;
pub mod patterns;
pub mod summary;

pub use categorize::{categorize_changes, CategorizedChange};
pub use intent::infer_intent;
pub use keyfiles::identify_key_files;
pub use patterns::{CategoryRules, ChangeCategory};
pub use summary::{generate_diff_summary, generate_overview, Analyzer, DiffSummary};
