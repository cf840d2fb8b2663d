//! Core types, configuration, and error handling for doi.
//!
//! This crate provides the shared foundation used by all other doi crates:
//! - [`DoiError`]: unified error type using `thiserror`
//! - [`DoiConfig`]: configuration loaded from `.doi.toml`
//! - Shared types: [`ChangedFile`], [`ChangeType`], [`DiffStats`],
//!   [`BranchCommit`], [`GitDiff`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, CategoryConfig, DebtConfig, DoiConfig, QuizConfig};
pub use error::DoiError;
pub use types::{BranchCommit, ChangeType, ChangedFile, DiffStats, GitDiff, OutputFormat};

/// A convenience `Result` type for doi operations.
pub type Result<T> = std::result::Result<T, DoiError>;
