//! Parsers for the textual output of the git commands in [`crate::commands`].
//!
//! Binary files show up in `--numstat` with `-` instead of line counts;
//! those counts are coerced to zero rather than rejected.

use std::collections::{HashMap, HashSet};

use doi_core::{BranchCommit, ChangeType, ChangedFile, DiffStats, DoiError, GitDiff};

/// Field separator used by the [`crate::commands::log`] format string.
pub const LOG_FIELD_SEPARATOR: char = '\x1f';

/// One line of `git diff --numstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    /// Path after any rename.
    pub path: String,
    /// Lines added (0 for binary files).
    pub lines_added: u32,
    /// Lines removed (0 for binary files).
    pub lines_removed: u32,
}

/// One line of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    /// Path after any rename or copy.
    pub path: String,
    /// Change classification.
    pub change_type: ChangeType,
}

/// Raw text captured from the git commands, before parsing.
#[derive(Debug, Clone, Default)]
pub struct RawGitOutput {
    /// Branch the diff was taken against.
    pub base_branch: String,
    /// Output of `git rev-parse --abbrev-ref HEAD`.
    pub current_branch: String,
    /// Output of `git diff --numstat`.
    pub numstat: String,
    /// Output of `git diff --name-status`.
    pub name_status: String,
    /// Output of the log template.
    pub log: String,
}

/// Parse `git diff --numstat` output.
///
/// # Errors
///
/// Returns [`DoiError::Parse`] for lines without three tab-separated fields
/// or with counts that are neither numbers nor `-`.
///
/// # Examples
///
/// ```
/// use doi_difflens::parser::parse_numstat;
///
/// let entries = parse_numstat("10\t2\tsrc/lib.rs\n-\t-\tlogo.png\n").unwrap();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].lines_added, 10);
/// assert_eq!(entries[1].lines_added, 0);
/// ```
pub fn parse_numstat(input: &str) -> Result<Vec<NumstatEntry>, DoiError> {
    let mut entries = Vec::new();
    for line in input.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(added), Some(removed), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(DoiError::Parse(format!("invalid numstat line: {line}")));
        };
        entries.push(NumstatEntry {
            path: resolve_rename_path(path),
            lines_added: parse_count(added, line)?,
            lines_removed: parse_count(removed, line)?,
        });
    }
    Ok(entries)
}

/// Parse `git diff --name-status` output.
///
/// `A` is added, `D` deleted, `R<score>` renamed; every other status letter
/// is treated as a modification. Renames and copies report the new path.
///
/// # Errors
///
/// Returns [`DoiError::Parse`] for a line with a status but no path.
///
/// # Examples
///
/// ```
/// use doi_core::ChangeType;
/// use doi_difflens::parser::parse_name_status;
///
/// let entries = parse_name_status("A\tsrc/new.rs\nR087\tsrc/a.rs\tsrc/b.rs\n").unwrap();
/// assert_eq!(entries[0].change_type, ChangeType::Added);
/// assert_eq!(entries[1].change_type, ChangeType::Renamed);
/// assert_eq!(entries[1].path, "src/b.rs");
/// ```
pub fn parse_name_status(input: &str) -> Result<Vec<NameStatusEntry>, DoiError> {
    let mut entries = Vec::new();
    for line in input.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let status = fields[0].trim();
        let path = match fields.as_slice() {
            [_, _, new_path, ..] if !new_path.is_empty() => *new_path,
            [_, path, ..] if !path.is_empty() => *path,
            _ => return Err(DoiError::Parse(format!("invalid name-status line: {line}"))),
        };
        let change_type = match status.chars().next() {
            Some('A') => ChangeType::Added,
            Some('D') => ChangeType::Deleted,
            Some('R') => ChangeType::Renamed,
            _ => ChangeType::Modified,
        };
        entries.push(NameStatusEntry {
            path: unquote(path).to_string(),
            change_type,
        });
    }
    Ok(entries)
}

/// Parse the output of the log template into commits, newest first.
///
/// Missing trailing fields become empty strings.
///
/// # Examples
///
/// ```
/// use doi_difflens::parser::parse_log;
///
/// let log = "abc\x1fAda\x1f2024-05-01T10:00:00+02:00\x1fadd parser\n";
/// let commits = parse_log(log);
/// assert_eq!(commits[0].author, "Ada");
/// assert_eq!(commits[0].message, "add parser");
/// ```
pub fn parse_log(input: &str) -> Vec<BranchCommit> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.splitn(4, LOG_FIELD_SEPARATOR);
            let mut next = || fields.next().unwrap_or_default().to_string();
            BranchCommit {
                hash: next(),
                author: next(),
                date: next(),
                message: next(),
            }
        })
        .collect()
}

/// Parse `git rev-parse --abbrev-ref HEAD` output.
///
/// # Errors
///
/// Returns [`DoiError::Parse`] when the output is blank.
pub fn parse_branch(input: &str) -> Result<String, DoiError> {
    let branch = input.trim();
    if branch.is_empty() {
        return Err(DoiError::Parse("empty branch name".into()));
    }
    Ok(branch.to_string())
}

/// Combine the captured git output into a [`GitDiff`].
///
/// The name-status listing decides file order and change type; numstat
/// supplies line counts. Files missing from numstat get zero counts, and
/// files only present in numstat are appended as modifications.
///
/// # Errors
///
/// Propagates [`DoiError::Parse`] from the individual parsers.
///
/// # Examples
///
/// ```
/// use doi_difflens::parser::{build_git_diff, RawGitOutput};
///
/// let raw = RawGitOutput {
///     base_branch: "main".into(),
///     current_branch: "feature/login\n".into(),
///     numstat: "40\t0\tsrc/x.ts\n".into(),
///     name_status: "A\tsrc/x.ts\n".into(),
///     log: String::new(),
/// };
/// let diff = build_git_diff(&raw).unwrap();
/// assert_eq!(diff.current_branch, "feature/login");
/// assert_eq!(diff.stats.lines_added, 40);
/// ```
pub fn build_git_diff(raw: &RawGitOutput) -> Result<GitDiff, DoiError> {
    let numstat = parse_numstat(&raw.numstat)?;
    let name_status = parse_name_status(&raw.name_status)?;

    let counts: HashMap<&str, (u32, u32)> = numstat
        .iter()
        .map(|e| (e.path.as_str(), (e.lines_added, e.lines_removed)))
        .collect();
    let listed: HashSet<&str> = name_status.iter().map(|e| e.path.as_str()).collect();

    let mut files: Vec<ChangedFile> = name_status
        .iter()
        .map(|e| {
            let (added, removed) = counts.get(e.path.as_str()).copied().unwrap_or((0, 0));
            ChangedFile::new(e.path.clone(), e.change_type, added, removed)
        })
        .collect();
    files.extend(
        numstat
            .iter()
            .filter(|e| !listed.contains(e.path.as_str()))
            .map(|e| {
                ChangedFile::new(
                    e.path.clone(),
                    ChangeType::Modified,
                    e.lines_added,
                    e.lines_removed,
                )
            }),
    );

    Ok(GitDiff {
        base_branch: raw.base_branch.trim().to_string(),
        current_branch: parse_branch(&raw.current_branch)?,
        stats: DiffStats::from_files(&files),
        files,
        commits: parse_log(&raw.log),
    })
}

fn parse_count(raw: &str, line: &str) -> Result<u32, DoiError> {
    let raw = raw.trim();
    if raw == "-" {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| DoiError::Parse(format!("invalid line count {raw:?} in numstat line: {line}")))
}

fn unquote(path: &str) -> &str {
    path.trim().trim_matches('"')
}

/// Resolve numstat rename notation to the new path:
/// `old => new` and `dir/{old => new}/file`.
fn resolve_rename_path(raw: &str) -> String {
    let raw = unquote(raw);
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Some((_, new)) = raw[open + 1..close].split_once(" => ") {
                let joined = format!("{}{}{}", &raw[..open], new, &raw[close + 1..]);
                return joined.replace("//", "/").trim_start_matches('/').to_string();
            }
        }
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => raw.to_string(),
    }
}
