use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a file changed between the base branch and `HEAD`.
///
/// Unknown values coming from JSON input deserialize as [`ChangeType::Modified`].
///
/// # Examples
///
/// ```
/// use doi_core::ChangeType;
///
/// let ct: ChangeType = serde_json::from_str("\"added\"").unwrap();
/// assert_eq!(ct, ChangeType::Added);
///
/// let unknown: ChangeType = serde_json::from_str("\"copied\"").unwrap();
/// assert_eq!(unknown, ChangeType::Modified);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// File did not exist on the base branch.
    Added,
    /// File was removed.
    Deleted,
    /// File was moved to a new path.
    Renamed,
    /// File exists on both sides with different content. Unknown labels land here.
    #[serde(other)]
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Modified => write!(f, "modified"),
            ChangeType::Deleted => write!(f, "deleted"),
            ChangeType::Renamed => write!(f, "renamed"),
        }
    }
}

impl FromStr for ChangeType {
    type Err = String;

    /// Lenient parse: anything that is not added, deleted or renamed is a modification.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "added" | "add" | "a" => Ok(ChangeType::Added),
            "deleted" | "delete" | "d" => Ok(ChangeType::Deleted),
            "renamed" | "rename" | "r" => Ok(ChangeType::Renamed),
            "" => Err("empty change type".to_string()),
            _ => Ok(ChangeType::Modified),
        }
    }
}

/// A single file-level entry of a branch diff.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile};
///
/// let file = ChangedFile::new("src/lib.rs", ChangeType::Modified, 12, 3);
/// assert_eq!(file.total_lines(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path relative to the repository root (`/`-separated).
    pub path: String,
    /// Kind of change.
    pub change_type: ChangeType,
    /// Lines added.
    #[serde(default)]
    pub lines_added: u32,
    /// Lines removed.
    #[serde(default)]
    pub lines_removed: u32,
}

impl ChangedFile {
    /// Build a file entry.
    pub fn new(
        path: impl Into<String>,
        change_type: ChangeType,
        lines_added: u32,
        lines_removed: u32,
    ) -> Self {
        Self {
            path: path.into(),
            change_type,
            lines_added,
            lines_removed,
        }
    }

    /// Lines added plus lines removed, saturating at `u32::MAX`.
    pub fn total_lines(&self) -> u32 {
        self.lines_added.saturating_add(self.lines_removed)
    }
}

/// Aggregate line counts for a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    /// Total lines added across all files.
    #[serde(default)]
    pub lines_added: u32,
    /// Total lines removed across all files.
    #[serde(default)]
    pub lines_removed: u32,
}

impl DiffStats {
    /// Sum the line counts of `files`.
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_core::{ChangeType, ChangedFile, DiffStats};
    ///
    /// let files = vec![
    ///     ChangedFile::new("a.rs", ChangeType::Added, 10, 0),
    ///     ChangedFile::new("b.rs", ChangeType::Modified, 4, 2),
    /// ];
    /// let stats = DiffStats::from_files(&files);
    /// assert_eq!(stats.lines_added, 14);
    /// assert_eq!(stats.lines_removed, 2);
    /// ```
    pub fn from_files(files: &[ChangedFile]) -> Self {
        files.iter().fold(Self::default(), |acc, f| Self {
            lines_added: acc.lines_added.saturating_add(f.lines_added),
            lines_removed: acc.lines_removed.saturating_add(f.lines_removed),
        })
    }

    /// Lines added plus lines removed, saturating at `u32::MAX`.
    pub fn total_lines(&self) -> u32 {
        self.lines_added.saturating_add(self.lines_removed)
    }
}

/// A commit on the working branch that is not on the base branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCommit {
    /// Full commit hash.
    #[serde(default)]
    pub hash: String,
    /// Author name.
    #[serde(default)]
    pub author: String,
    /// Author date, ISO 8601 as printed by git.
    #[serde(default)]
    pub date: String,
    /// Subject line of the commit message.
    pub message: String,
}

/// Everything known about a branch's changes relative to its base.
///
/// Commits are ordered newest-first, the way `git log` prints them.
///
/// # Examples
///
/// ```
/// use doi_core::GitDiff;
///
/// let json = r#"{"currentBranch":"feature/login","files":[]}"#;
/// let diff: GitDiff = serde_json::from_str(json).unwrap();
/// assert_eq!(diff.current_branch, "feature/login");
/// assert!(diff.commits.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitDiff {
    /// Branch the diff is taken against.
    #[serde(default)]
    pub base_branch: String,
    /// Branch checked out at `HEAD`.
    #[serde(default)]
    pub current_branch: String,
    /// Changed files in diff order.
    #[serde(default)]
    pub files: Vec<ChangedFile>,
    /// Aggregate line counts.
    #[serde(default)]
    pub stats: DiffStats,
    /// Branch commits, newest first.
    #[serde(default)]
    pub commits: Vec<BranchCommit>,
}

/// Output format for CLI and tool results.
///
/// # Examples
///
/// ```
/// use doi_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn change_type_display() {
        assert_eq!(ChangeType::Added.to_string(), "added");
        assert_eq!(ChangeType::Modified.to_string(), "modified");
        assert_eq!(ChangeType::Deleted.to_string(), "deleted");
        assert_eq!(ChangeType::Renamed.to_string(), "renamed");
    }

    #[test]
    fn change_type_from_str_is_lenient() {
        assert_eq!("A".parse::<ChangeType>().unwrap(), ChangeType::Added);
        assert_eq!("Renamed".parse::<ChangeType>().unwrap(), ChangeType::Renamed);
        assert_eq!("typechange".parse::<ChangeType>().unwrap(), ChangeType::Modified);
        assert!("".parse::<ChangeType>().is_err());
    }

    #[test]
    fn change_type_unknown_json_is_modified() {
        let ct: ChangeType = serde_json::from_str("\"unmerged\"").unwrap();
        assert_eq!(ct, ChangeType::Modified);
        assert_eq!(serde_json::to_string(&ChangeType::Renamed).unwrap(), "\"renamed\"");
    }

    #[test]
    fn changed_file_serializes_camel_case() {
        let file = ChangedFile::new("src/x.ts", ChangeType::Added, 40, 0);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["changeType"], "added");
        assert_eq!(json["linesAdded"], 40);
        assert!(json.get("lines_added").is_none());
    }

    #[test]
    fn changed_file_missing_counts_default_to_zero() {
        let file: ChangedFile =
            serde_json::from_str(r#"{"path":"a.rs","changeType":"modified"}"#).unwrap();
        assert_eq!(file.lines_added, 0);
        assert_eq!(file.lines_removed, 0);
    }

    #[test]
    fn stats_from_empty_files() {
        assert_eq!(DiffStats::from_files(&[]), DiffStats::default());
        assert_eq!(DiffStats::default().total_lines(), 0);
    }

    #[test]
    fn huge_counts_saturate() {
        let files = vec![
            ChangedFile::new("a.rs", ChangeType::Modified, u32::MAX, 1),
            ChangedFile::new("b.rs", ChangeType::Added, 1, u32::MAX),
        ];
        assert_eq!(files[0].total_lines(), u32::MAX);

        let stats = DiffStats::from_files(&files);
        assert_eq!(stats.lines_added, u32::MAX);
        assert_eq!(stats.lines_removed, u32::MAX);
        assert_eq!(stats.total_lines(), u32::MAX);
    }
}
