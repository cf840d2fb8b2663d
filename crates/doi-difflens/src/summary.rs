use std::fmt;

use doi_core::{CategoryConfig, DiffStats, DoiError, GitDiff};
use serde::{Deserialize, Serialize};

use crate::categorize::{categorize_with, plural, CategorizedChange};
use crate::intent::infer_intent_with;
use crate::keyfiles::{identify_key_files_with, DEFAULT_KEY_FILE_LIMIT};
use crate::patterns::CategoryRules;

/// Everything the quiz layer needs to know about a branch diff.
///
/// Derived from a [`GitDiff`] on every call; never cached.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile, DiffStats, GitDiff};
/// use doi_difflens::generate_diff_summary;
///
/// let files = vec![ChangedFile::new("src/x.ts", ChangeType::Added, 40, 0)];
/// let diff = GitDiff {
///     current_branch: "feature/login-flow".into(),
///     stats: DiffStats::from_files(&files),
///     files,
///     ..GitDiff::default()
/// };
/// let summary = generate_diff_summary(&diff);
/// assert_eq!(summary.key_files, vec!["src/x.ts"]);
/// assert_eq!(
///     summary.overview,
///     "A small change across 1 file to add new functionality: login flow."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// One-sentence description of size, breadth, and purpose.
    pub overview: String,
    /// Files grouped by category, in priority order.
    pub changes: Vec<CategorizedChange>,
    /// Inferred purpose of the branch.
    pub inferred_intent: String,
    /// Most review-worthy paths, best first.
    pub key_files: Vec<String>,
    /// Aggregate line counts, passed through from the diff.
    pub stats: DiffStats,
    /// Every changed path, in diff order.
    pub files_changed: Vec<String>,
}

/// Size bucket for a diff's total changed lines.
///
/// # Examples
///
/// ```
/// use doi_difflens::summary::size_descriptor;
///
/// assert_eq!(size_descriptor(49), "small");
/// assert_eq!(size_descriptor(60), "moderate");
/// assert_eq!(size_descriptor(499), "substantial");
/// assert_eq!(size_descriptor(500), "large");
/// ```
pub fn size_descriptor(total_lines: u32) -> &'static str {
    if total_lines < 50 {
        "small"
    } else if total_lines < 200 {
        "moderate"
    } else if total_lines < 500 {
        "substantial"
    } else {
        "large"
    }
}

/// Analyzer with a fixed pattern table and key-file limit.
///
/// The free functions in this crate use [`Analyzer::default`]; build one
/// from configuration when `.doi.toml` adds category patterns or changes the
/// key-file limit.
///
/// # Examples
///
/// ```
/// use doi_core::{CategoryConfig, GitDiff};
/// use doi_difflens::Analyzer;
///
/// let analyzer = Analyzer::from_config(&CategoryConfig::default(), 3).unwrap();
/// let summary = analyzer.summarize(&GitDiff::default());
/// assert!(summary.changes.is_empty());
/// assert!(summary.key_files.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    rules: CategoryRules,
    key_file_limit: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            rules: CategoryRules::default(),
            key_file_limit: DEFAULT_KEY_FILE_LIMIT,
        }
    }
}

impl Analyzer {
    /// Build an analyzer from explicit rules.
    pub fn new(rules: CategoryRules, key_file_limit: usize) -> Self {
        Self {
            rules,
            key_file_limit,
        }
    }

    /// Build an analyzer from the `[categories]` table and key-file limit.
    ///
    /// # Errors
    ///
    /// Returns [`DoiError::Config`] if a category glob is invalid.
    pub fn from_config(categories: &CategoryConfig, key_file_limit: usize) -> Result<Self, DoiError> {
        Ok(Self::new(CategoryRules::with_extra(categories)?, key_file_limit))
    }

    /// Pattern table in use.
    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Group the diff's files by category.
    pub fn categorize(&self, diff: &GitDiff) -> Vec<CategorizedChange> {
        categorize_with(&self.rules, &diff.files)
    }

    /// Most review-worthy paths.
    pub fn key_files(&self, diff: &GitDiff) -> Vec<String> {
        identify_key_files_with(&self.rules, &diff.files, self.key_file_limit)
    }

    /// Inferred purpose of the branch.
    pub fn intent(&self, diff: &GitDiff) -> String {
        infer_intent_with(&self.rules, diff)
    }

    /// One-sentence overview.
    pub fn overview(&self, diff: &GitDiff) -> String {
        overview_for(diff, &self.intent(diff))
    }

    /// Full summary.
    pub fn summarize(&self, diff: &GitDiff) -> DiffSummary {
        let inferred_intent = self.intent(diff);
        DiffSummary {
            overview: overview_for(diff, &inferred_intent),
            changes: self.categorize(diff),
            inferred_intent,
            key_files: self.key_files(diff),
            stats: diff.stats,
            files_changed: diff.files.iter().map(|f| f.path.clone()).collect(),
        }
    }
}

/// One-sentence overview of the diff's size, breadth, and intent.
///
/// # Examples
///
/// ```
/// use doi_core::{DiffStats, GitDiff};
/// use doi_difflens::generate_overview;
///
/// let diff = GitDiff {
///     current_branch: "fix/Token-Refresh".into(),
///     stats: DiffStats { lines_added: 45, lines_removed: 15 },
///     ..GitDiff::default()
/// };
/// assert_eq!(
///     generate_overview(&diff),
///     "A moderate change across 0 files to fix a bug: token refresh."
/// );
/// ```
pub fn generate_overview(diff: &GitDiff) -> String {
    Analyzer::default().overview(diff)
}

/// Summarize a diff with the built-in tables and a key-file limit of 5.
pub fn generate_diff_summary(diff: &GitDiff) -> DiffSummary {
    Analyzer::default().summarize(diff)
}

fn overview_for(diff: &GitDiff, intent: &str) -> String {
    let size = size_descriptor(diff.stats.total_lines());
    let count = diff.files.len();
    format!(
        "A {size} change across {count} {} to {}.",
        plural(count, "file"),
        intent.to_lowercase()
    )
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diff Summary")?;
        writeln!(f, "============")?;
        writeln!(f, "{}\n", self.overview)?;
        writeln!(f, "Intent: {}", self.inferred_intent)?;
        writeln!(
            f,
            "Stats:  {} files, +{} -{}\n",
            self.files_changed.len(),
            self.stats.lines_added,
            self.stats.lines_removed
        )?;

        for change in &self.changes {
            writeln!(f, "{:<16} {}", change.category.label(), change.description)?;
            for path in &change.files {
                writeln!(f, "  {path}")?;
            }
        }

        if !self.key_files.is_empty() {
            writeln!(f, "\nKey files:")?;
            for (i, path) in self.key_files.iter().enumerate() {
                writeln!(f, "  {}. {path}", i + 1)?;
            }
        }
        Ok(())
    }
}

impl DiffSummary {
    /// Render the summary as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_core::GitDiff;
    /// use doi_difflens::generate_diff_summary;
    ///
    /// let md = generate_diff_summary(&GitDiff::default()).to_markdown();
    /// assert!(md.starts_with("# Diff Summary"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Diff Summary\n\n");
        out.push_str(&format!("{}\n\n", self.overview));
        out.push_str(&format!("**Intent:** {}\n\n", self.inferred_intent));
        out.push_str(&format!(
            "**Stats:** {} files, +{} additions, -{} deletions\n\n",
            self.files_changed.len(),
            self.stats.lines_added,
            self.stats.lines_removed
        ));

        if !self.changes.is_empty() {
            out.push_str("## Changes\n\n");
            for change in &self.changes {
                out.push_str(&format!(
                    "### {}\n\n{}\n\n",
                    change.category.label(),
                    change.description
                ));
                for path in &change.files {
                    out.push_str(&format!("- `{path}`\n"));
                }
                out.push('\n');
            }
        }

        if !self.key_files.is_empty() {
            out.push_str("## Key files\n\n");
            for (i, path) in self.key_files.iter().enumerate() {
                out.push_str(&format!("{}. `{path}`\n", i + 1));
            }
        }
        out
    }
}
