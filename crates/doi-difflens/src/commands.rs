//! Git command templates for collecting a branch diff.
//!
//! The host can print these and run them itself, feeding the output back to
//! [`crate::parser`], or call [`collect`] to run them in-process.

use std::fmt;
use std::path::Path;
use std::process::Command;

use doi_core::DoiError;

use crate::parser::RawGitOutput;

/// A git invocation: a short name plus the arguments after `git`.
///
/// # Examples
///
/// ```
/// use doi_difflens::commands;
///
/// let cmd = commands::numstat("main").unwrap();
/// assert_eq!(cmd.to_string(), "git diff --numstat -M main...HEAD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    /// Identifier used by the host to route the output back.
    pub name: &'static str,
    /// Arguments passed to `git`.
    pub args: Vec<String>,
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", self.args.join(" "))
    }
}

impl GitCommand {
    fn new(name: &'static str, args: &[&str]) -> Self {
        Self {
            name,
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Run the command in `repo` and return its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`DoiError::Git`] if git cannot be spawned or exits non-zero.
    pub fn run(&self, repo: &Path) -> Result<String, DoiError> {
        let output = Command::new("git")
            .args(&self.args)
            .current_dir(repo)
            .output()
            .map_err(|e| DoiError::Git(format!("failed to run `{self}`: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DoiError::Git(format!("`{self}` failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reject refs that git would read as options or that could not be a branch.
///
/// # Errors
///
/// Returns [`DoiError::Git`] describing the problem.
///
/// # Examples
///
/// ```
/// use doi_difflens::commands::validate_ref;
///
/// assert!(validate_ref("origin/main").is_ok());
/// assert!(validate_ref("--output=/tmp/x").is_err());
/// assert!(validate_ref("main..HEAD").is_err());
/// ```
pub fn validate_ref(base: &str) -> Result<(), DoiError> {
    if base.is_empty() {
        return Err(DoiError::Git("base branch must not be empty".into()));
    }
    if base.starts_with('-') {
        return Err(DoiError::Git(format!("base branch {base:?} must not start with '-'")));
    }
    if base.contains("..") {
        return Err(DoiError::Git(format!("base branch {base:?} must not contain '..'")));
    }
    if base.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(DoiError::Git(format!(
            "base branch {base:?} must not contain whitespace"
        )));
    }
    Ok(())
}

/// `git rev-parse --abbrev-ref HEAD`
pub fn current_branch() -> GitCommand {
    GitCommand::new("current_branch", &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// `git merge-base <base> HEAD`
pub fn merge_base(base: &str) -> Result<GitCommand, DoiError> {
    validate_ref(base)?;
    Ok(GitCommand::new("merge_base", &["merge-base", base, "HEAD"]))
}

/// `git diff --numstat -M <base>...HEAD`
pub fn numstat(base: &str) -> Result<GitCommand, DoiError> {
    validate_ref(base)?;
    Ok(GitCommand::new(
        "numstat",
        &["diff", "--numstat", "-M", format!("{base}...HEAD").as_str()],
    ))
}

/// `git diff --name-status -M <base>...HEAD`
pub fn name_status(base: &str) -> Result<GitCommand, DoiError> {
    validate_ref(base)?;
    Ok(GitCommand::new(
        "name_status",
        &["diff", "--name-status", "-M", format!("{base}...HEAD").as_str()],
    ))
}

/// `git log` of the branch's own commits, one unit-separated record per line.
pub fn log(base: &str) -> Result<GitCommand, DoiError> {
    validate_ref(base)?;
    Ok(GitCommand::new(
        "log",
        &[
            "log",
            "--no-merges",
            "--format=%H%x1f%an%x1f%aI%x1f%s",
            format!("{base}..HEAD").as_str(),
        ],
    ))
}

/// `git diff -M <base>...HEAD`, the full patch used as a prompt excerpt.
pub fn patch(base: &str) -> Result<GitCommand, DoiError> {
    validate_ref(base)?;
    Ok(GitCommand::new(
        "patch",
        &["diff", "-M", format!("{base}...HEAD").as_str()],
    ))
}

/// The commands whose output [`crate::parser::build_git_diff`] needs, in run order.
///
/// # Examples
///
/// ```
/// use doi_difflens::commands;
///
/// let names: Vec<_> = commands::all("main").unwrap().iter().map(|c| c.name).collect();
/// assert_eq!(names, ["current_branch", "numstat", "name_status", "log"]);
/// ```
pub fn all(base: &str) -> Result<Vec<GitCommand>, DoiError> {
    Ok(vec![
        current_branch(),
        numstat(base)?,
        name_status(base)?,
        log(base)?,
    ])
}

/// Run every command from [`all`] in `repo` and capture the output.
///
/// # Errors
///
/// Returns [`DoiError::Git`] for an invalid base or the first failing command.
pub fn collect(repo: &Path, base: &str) -> Result<RawGitOutput, DoiError> {
    Ok(RawGitOutput {
        base_branch: base.to_string(),
        current_branch: current_branch().run(repo)?,
        numstat: numstat(base)?.run(repo)?,
        name_status: name_status(base)?.run(repo)?,
        log: log(base)?.run(repo)?,
    })
}
