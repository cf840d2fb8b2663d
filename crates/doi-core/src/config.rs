use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DoiError;

/// Top-level configuration loaded from `.doi.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use doi_core::DoiConfig;
///
/// let config = DoiConfig::default();
/// assert_eq!(config.analysis.base_branch, "main");
/// assert_eq!(config.analysis.key_file_limit, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoiConfig {
    /// Diff analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Quiz generation settings.
    #[serde(default)]
    pub quiz: QuizConfig,
    /// Vibe-debt storage settings.
    #[serde(default)]
    pub debt: DebtConfig,
    /// Extra path patterns per category.
    #[serde(default)]
    pub categories: CategoryConfig,
}

impl DoiConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DoiError::FileNotFound`] if the file does not exist,
    /// [`DoiError::Io`] if it cannot be read, or [`DoiError::Toml`] if the
    /// content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use doi_core::DoiConfig;
    /// use std::path::Path;
    ///
    /// let config = DoiConfig::from_file(Path::new(".doi.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, DoiError> {
        if !path.exists() {
            return Err(DoiError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DoiError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_core::DoiConfig;
    ///
    /// let toml = r#"
    /// [quiz]
    /// question_count = 8
    /// "#;
    /// let config = DoiConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.quiz.question_count, 8);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DoiError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DoiError> {
        if self.analysis.key_file_limit == 0 {
            return Err(DoiError::Config(
                "analysis.key_file_limit must be at least 1".into(),
            ));
        }
        if self.quiz.question_count == 0 {
            return Err(DoiError::Config(
                "quiz.question_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Diff analysis configuration.
///
/// # Examples
///
/// ```
/// use doi_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.base_branch, "main");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Branch to diff against (default: `"main"`).
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Number of key files to surface (default: 5).
    #[serde(default = "default_key_file_limit")]
    pub key_file_limit: usize,
}

fn default_base_branch() -> String {
    "main".into()
}

fn default_key_file_limit() -> usize {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            key_file_limit: default_key_file_limit(),
        }
    }
}

/// Quiz generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Number of questions to ask for (default: 5).
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    /// Include the raw patch in the question prompt (default: false).
    #[serde(default)]
    pub include_diff_excerpt: bool,
    /// Maximum patch lines embedded in the prompt (default: 400).
    #[serde(default = "default_max_excerpt_lines")]
    pub max_excerpt_lines: usize,
}

fn default_question_count() -> usize {
    5
}

fn default_max_excerpt_lines() -> usize {
    400
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            include_diff_excerpt: false,
            max_excerpt_lines: default_max_excerpt_lines(),
        }
    }
}

/// Vibe-debt storage configuration.
///
/// # Examples
///
/// ```
/// use doi_core::DebtConfig;
/// use std::path::PathBuf;
///
/// let config = DebtConfig::default();
/// assert_eq!(config.dir, PathBuf::from(".doi/vibe-debt"));
/// assert!(!config.save_clean);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtConfig {
    /// Directory records are written to, relative to the repository root.
    #[serde(default = "default_debt_dir")]
    pub dir: PathBuf,
    /// Also write a record when every question was answered correctly.
    #[serde(default)]
    pub save_clean: bool,
}

fn default_debt_dir() -> PathBuf {
    PathBuf::from(".doi/vibe-debt")
}

impl Default for DebtConfig {
    fn default() -> Self {
        Self {
            dir: default_debt_dir(),
            save_clean: false,
        }
    }
}

/// Extra glob patterns appended to the built-in category tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Additional configuration-file globs.
    #[serde(default)]
    pub configuration: Vec<String>,
    /// Additional test-file globs.
    #[serde(default)]
    pub testing: Vec<String>,
    /// Additional documentation globs.
    #[serde(default)]
    pub documentation: Vec<String>,
}

impl CategoryConfig {
    /// `true` when no extra patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.configuration.is_empty() && self.testing.is_empty() && self.documentation.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = DoiConfig::default();
        assert_eq!(config.analysis.base_branch, "main");
        assert_eq!(config.analysis.key_file_limit, 5);
        assert_eq!(config.quiz.question_count, 5);
        assert!(!config.quiz.include_diff_excerpt);
        assert_eq!(config.quiz.max_excerpt_lines, 400);
        assert_eq!(config.debt.dir, PathBuf::from(".doi/vibe-debt"));
        assert!(config.categories.is_empty());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[analysis]
base_branch = "develop"
key_file_limit = 3

[quiz]
question_count = 7
include_diff_excerpt = true

[debt]
dir = "notes/debt"
save_clean = true

[categories]
configuration = ["deploy/**"]
testing = ["qa/**/*.rs"]
"#;
        let config = DoiConfig::from_toml(toml).unwrap();
        assert_eq!(config.analysis.base_branch, "develop");
        assert_eq!(config.analysis.key_file_limit, 3);
        assert_eq!(config.quiz.question_count, 7);
        assert!(config.quiz.include_diff_excerpt);
        assert_eq!(config.quiz.max_excerpt_lines, 400);
        assert_eq!(config.debt.dir, PathBuf::from("notes/debt"));
        assert!(config.debt.save_clean);
        assert_eq!(config.categories.configuration, vec!["deploy/**"]);
        assert!(config.categories.documentation.is_empty());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = DoiConfig::from_toml("").unwrap();
        assert_eq!(config.analysis.base_branch, "main");
        assert_eq!(config.quiz.question_count, 5);
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(matches!(
            DoiConfig::from_toml("{{invalid}}"),
            Err(DoiError::Toml(_))
        ));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = DoiConfig::from_toml("[analysis]\nkey_file_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("key_file_limit"));

        let err = DoiConfig::from_toml("[quiz]\nquestion_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("question_count"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = DoiConfig::from_file(Path::new("/nonexistent/.doi.toml")).unwrap_err();
        assert!(matches!(err, DoiError::FileNotFound(_)));
    }
}
