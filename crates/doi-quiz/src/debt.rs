//! Vibe-debt records: the quiz questions a developer missed or skipped,
//! stored as one JSON file per quiz run.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use doi_core::{DebtConfig, DoiError, GitDiff};
use doi_difflens::DiffSummary;
use serde::{Deserialize, Serialize};

use crate::present::letter_to_index;
use crate::prompt::{QuestionKind, QuizQuestion};

/// Newest record layout this build can read.
pub const RECORD_VERSION: u32 = 1;

/// How a single question went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizOutcome {
    Correct,
    Incorrect,
    Skipped,
}

impl QuizOutcome {
    /// Incorrect and skipped answers become debt.
    pub fn is_debt(self) -> bool {
        !matches!(self, QuizOutcome::Correct)
    }
}

impl fmt::Display for QuizOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizOutcome::Correct => write!(f, "correct"),
            QuizOutcome::Incorrect => write!(f, "incorrect"),
            QuizOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// A question together with the user's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question: QuizQuestion,
    pub outcome: QuizOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
}

impl QuizAnswer {
    /// Grade a raw response. Empty or missing input is a skip; a letter is
    /// resolved against the options, anything else is compared to the answer
    /// ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_quiz::prompt::{question_id, QuestionKind, QuizQuestion};
    /// use doi_quiz::{QuizAnswer, QuizOutcome};
    ///
    /// let q = QuizQuestion {
    ///     id: question_id(None, "Why?"),
    ///     kind: QuestionKind::Purpose,
    ///     question: "Why?".into(),
    ///     file: None,
    ///     options: vec!["Speed".into(), "Safety".into()],
    ///     answer: "Safety".into(),
    ///     explanation: None,
    /// };
    /// assert_eq!(QuizAnswer::grade(q.clone(), Some("b")).outcome, QuizOutcome::Correct);
    /// assert_eq!(QuizAnswer::grade(q.clone(), Some("Speed")).outcome, QuizOutcome::Incorrect);
    /// assert_eq!(QuizAnswer::grade(q, None).outcome, QuizOutcome::Skipped);
    /// ```
    pub fn grade(question: QuizQuestion, user_answer: Option<&str>) -> Self {
        let user_answer = user_answer.map(str::trim).filter(|a| !a.is_empty());
        let outcome = match user_answer {
            None => QuizOutcome::Skipped,
            Some(given) => {
                let chosen = letter_to_index(given)
                    .and_then(|i| question.options.get(i))
                    .map(String::as_str)
                    .unwrap_or(given);
                if chosen.trim().eq_ignore_ascii_case(question.answer.trim()) {
                    QuizOutcome::Correct
                } else {
                    QuizOutcome::Incorrect
                }
            }
        };
        Self {
            outcome,
            user_answer: user_answer.map(str::to_string),
            question,
        }
    }
}

/// Tally of quiz outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn from_answers(answers: &[QuizAnswer]) -> Self {
        let mut score = Self {
            total: answers.len(),
            ..Self::default()
        };
        for answer in answers {
            match answer.outcome {
                QuizOutcome::Correct => score.correct += 1,
                QuizOutcome::Incorrect => score.incorrect += 1,
                QuizOutcome::Skipped => score.skipped += 1,
            }
        }
        score
    }
}

/// A question the developer could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtItem {
    pub question_id: String,
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub outcome: QuizOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl DebtItem {
    fn from_answer(answer: &QuizAnswer) -> Self {
        let q = &answer.question;
        Self {
            question_id: q.id.clone(),
            kind: q.kind,
            question: q.question.clone(),
            file: q.file.clone(),
            correct_answer: q.answer.clone(),
            user_answer: answer.user_answer.clone(),
            outcome: answer.outcome,
            explanation: q.explanation.clone(),
        }
    }
}

/// One quiz run on one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeDebtRecord {
    pub version: u32,
    pub branch: String,
    pub base_branch: String,
    pub created_at: DateTime<Utc>,
    pub intent: String,
    pub overview: String,
    #[serde(default)]
    pub key_files: Vec<String>,
    pub score: QuizScore,
    /// Only incorrect or skipped answers, in quiz order.
    #[serde(default)]
    pub debt: Vec<DebtItem>,
}

impl VibeDebtRecord {
    /// Build a record from a finished quiz.
    pub fn from_results(
        summary: &DiffSummary,
        diff: &GitDiff,
        answers: &[QuizAnswer],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            branch: diff.current_branch.clone(),
            base_branch: diff.base_branch.clone(),
            created_at: now,
            intent: summary.inferred_intent.clone(),
            overview: summary.overview.clone(),
            key_files: summary.key_files.clone(),
            score: QuizScore::from_answers(answers),
            debt: answers
                .iter()
                .filter(|a| a.outcome.is_debt())
                .map(DebtItem::from_answer)
                .collect(),
        }
    }

    pub fn has_debt(&self) -> bool {
        !self.debt.is_empty()
    }

    /// `{branch}-{YYYYMMDD-HHMMSS}.json`, with every branch character
    /// outside `[A-Za-z0-9._-]` replaced by `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use doi_core::GitDiff;
    /// use doi_difflens::generate_diff_summary;
    /// use doi_quiz::VibeDebtRecord;
    ///
    /// let diff = GitDiff { current_branch: "feature/login flow".into(), ..GitDiff::default() };
    /// let now = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
    /// let record = VibeDebtRecord::from_results(&generate_diff_summary(&diff), &diff, &[], now);
    /// assert_eq!(record.file_name(), "feature-login-flow-20260309-140507.json");
    /// ```
    pub fn file_name(&self) -> String {
        let mut branch: String = self
            .branch
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        if branch.is_empty() {
            branch.push_str("detached");
        }
        format!("{branch}-{}.json", self.created_at.format("%Y%m%d-%H%M%S"))
    }
}

/// Directory of vibe-debt records.
#[derive(Debug, Clone)]
pub struct DebtStore {
    dir: PathBuf,
    save_clean: bool,
}

impl DebtStore {
    /// A store at `dir` that skips records without debt.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            save_clean: false,
        }
    }

    /// A store configured by `[debt]`, with a relative `dir` resolved
    /// against `repo_root`.
    pub fn from_config(repo_root: &Path, config: &DebtConfig) -> Self {
        Self {
            dir: repo_root.join(&config.dir),
            save_clean: config.save_clean,
        }
    }

    /// Also save records that have no debt.
    pub fn save_clean(mut self, save_clean: bool) -> Self {
        self.save_clean = save_clean;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `record` as pretty JSON and return its path.
    ///
    /// Returns `Ok(None)` without touching the disk when the record has no
    /// debt and clean records are not kept.
    pub fn save(&self, record: &VibeDebtRecord) -> Result<Option<PathBuf>, DoiError> {
        if !record.has_debt() && !self.save_clean {
            return Ok(None);
        }

        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| {
                DoiError::Config(format!(
                    "failed to create vibe-debt directory {}: {e}",
                    self.dir.display()
                ))
            })?;
        }

        let path = self.dir.join(record.file_name());
        let content = serde_json::to_string_pretty(record).map_err(|e| {
            DoiError::Config(format!("failed to serialize vibe-debt record: {e}"))
        })?;
        std::fs::write(&path, content).map_err(|e| {
            DoiError::Config(format!(
                "failed to write vibe-debt record to {}: {e}",
                path.display()
            ))
        })?;
        Ok(Some(path))
    }

    /// Read one record.
    ///
    /// # Errors
    ///
    /// [`DoiError::FileNotFound`] for a missing file, [`DoiError::Config`]
    /// for unreadable JSON or a record written by a newer version.
    pub fn load(&self, path: &Path) -> Result<VibeDebtRecord, DoiError> {
        if !path.exists() {
            return Err(DoiError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            DoiError::Config(format!(
                "failed to read vibe-debt record from {}: {e}",
                path.display()
            ))
        })?;
        let record: VibeDebtRecord = serde_json::from_str(&content).map_err(|e| {
            DoiError::Config(format!(
                "failed to parse vibe-debt record {}: {e}",
                path.display()
            ))
        })?;
        if record.version > RECORD_VERSION {
            return Err(DoiError::Config(format!(
                "vibe-debt record {} has version {}, newest supported is {RECORD_VERSION}",
                path.display(),
                record.version
            )));
        }
        Ok(record)
    }

    /// Paths of all `.json` records, sorted by file name.
    ///
    /// A missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<PathBuf>, DoiError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Every record with its path, in [`list`](Self::list) order.
    pub fn load_all(&self) -> Result<Vec<(PathBuf, VibeDebtRecord)>, DoiError> {
        self.list()?
            .into_iter()
            .map(|path| {
                let record = self.load(&path)?;
                Ok((path, record))
            })
            .collect()
    }
}
