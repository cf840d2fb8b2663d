//! Best-effort guess at what a branch is for.
//!
//! Tried in order: branch-name prefix, oldest commit message, then the mix of
//! change categories.

use doi_core::GitDiff;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::categorize::categorize_with;
use crate::patterns::{CategoryRules, ChangeCategory};

/// Branch prefix → intent phrase, tried top to bottom.
const BRANCH_INTENTS: &[(&str, &str)] = &[
    (r"(?i)^(feat|feature)[/_-]", "add new functionality"),
    (r"(?i)^fix[/_-]", "fix a bug"),
    (r"(?i)^(bug|bugfix)[/_-]", "fix a bug"),
    (r"(?i)^refactor[/_-]", "refactor existing code"),
    (r"(?i)^(perf|performance)[/_-]", "improve performance"),
    (r"(?i)^docs?[/_-]", "update documentation"),
    (r"(?i)^tests?[/_-]", "improve test coverage"),
    (r"(?i)^chore[/_-]", "perform maintenance"),
    (r"(?i)^hotfix[/_-]", "apply an urgent fix"),
    (r"(?i)^release[/_-]", "prepare a release"),
    (r"(?i)^deps?[/_-]", "update dependencies"),
    (r"(?i)^upgrade[/_-]", "upgrade dependencies"),
    (r"(?i)^(migration|migrate)[/_-]", "migrate data or infrastructure"),
];

static BRANCH_TABLE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    BRANCH_INTENTS
        .iter()
        .map(|(pattern, intent)| (Regex::new(pattern).expect("built-in branch pattern"), *intent))
        .collect()
});

const BRANCH_DELIMITERS: &[char] = &['/', '-', '_'];

/// Infer the purpose of the change using the built-in pattern tables.
///
/// # Examples
///
/// ```
/// use doi_core::GitDiff;
/// use doi_difflens::infer_intent;
///
/// let diff = GitDiff {
///     current_branch: "feature/login-flow".into(),
///     ..GitDiff::default()
/// };
/// assert_eq!(infer_intent(&diff), "add new functionality: login flow");
/// ```
pub fn infer_intent(diff: &GitDiff) -> String {
    infer_intent_with(CategoryRules::builtin(), diff)
}

/// Infer the purpose of the change, categorizing with `rules` when neither
/// the branch name nor the commits say anything.
pub fn infer_intent_with(rules: &CategoryRules, diff: &GitDiff) -> String {
    if let Some(intent) = intent_from_branch(&diff.current_branch) {
        return intent;
    }

    if let Some(oldest) = diff.commits.last() {
        return format!("Based on commits: {}", oldest.message);
    }

    let categories: Vec<ChangeCategory> = categorize_with(rules, &diff.files)
        .iter()
        .map(|c| c.category)
        .collect();
    let fallback = if categories.contains(&ChangeCategory::NewFeature) {
        "Add new functionality to the codebase"
    } else if categories.contains(&ChangeCategory::Deletion) {
        "Remove unused code or features"
    } else if categories.contains(&ChangeCategory::Refactoring) {
        "Improve code structure without changing behavior"
    } else if categories.contains(&ChangeCategory::Configuration) {
        "Update project configuration"
    } else {
        "Make changes to the codebase"
    };
    fallback.to_string()
}

/// Intent derived from a conventional branch prefix such as `fix/` or `feat-`.
///
/// # Examples
///
/// ```
/// use doi_difflens::intent::intent_from_branch;
///
/// assert_eq!(intent_from_branch("fix/null-token").as_deref(), Some("fix a bug: null token"));
/// assert_eq!(intent_from_branch("chore/").as_deref(), Some("perform maintenance"));
/// assert_eq!(intent_from_branch("main"), None);
/// ```
pub fn intent_from_branch(branch: &str) -> Option<String> {
    let (_, intent) = BRANCH_TABLE.iter().find(|(re, _)| re.is_match(branch))?;

    let description = branch
        .split(BRANCH_DELIMITERS)
        .skip(1)
        // runs like `--` yield empty segments
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let description = description.trim();

    if description.is_empty() {
        Some((*intent).to_string())
    } else {
        Some(format!("{intent}: {description}"))
    }
}
