//! Comprehension quiz over a branch diff.
//!
//! [`prompt`] builds the LLM prompt that asks for multiple-choice questions
//! about a [`doi_difflens::DiffSummary`] and parses the reply, [`present`]
//! formats questions and results for the host UI, and [`debt`] persists
//! missed or skipped questions as vibe-debt records.

pub mod debt;
pub mod present;
pub mod prompt;

pub use debt::{DebtItem, DebtStore, QuizAnswer, QuizOutcome, QuizScore, VibeDebtRecord};
pub use prompt::{QuestionKind, QuizQuestion};
