//! Path-pattern tables that map file paths to change categories.
//!
//! The built-in tables are compiled once and never mutated. Extra glob
//! patterns from `.doi.toml` are appended per category without changing the
//! order in which categories are tried.

use std::fmt;

use doi_core::{CategoryConfig, DoiError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The kind of change a file represents.
///
/// # Examples
///
/// ```
/// use doi_difflens::ChangeCategory;
///
/// assert_eq!(ChangeCategory::NewFeature.to_string(), "new-feature");
/// let json = serde_json::to_string(&ChangeCategory::ModifiedLogic).unwrap();
/// assert_eq!(json, "\"modified-logic\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeCategory {
    /// Newly added source files.
    NewFeature,
    /// Edits to existing logic.
    ModifiedLogic,
    /// Renamed or moved files.
    Refactoring,
    /// Removed files.
    Deletion,
    /// Build, tooling, and project configuration.
    Configuration,
    /// Test code and fixtures.
    Testing,
    /// Prose: READMEs, changelogs, docs folders.
    Documentation,
}

impl ChangeCategory {
    /// Every category, in presentation priority order.
    pub const ALL: [ChangeCategory; 7] = [
        ChangeCategory::NewFeature,
        ChangeCategory::ModifiedLogic,
        ChangeCategory::Refactoring,
        ChangeCategory::Deletion,
        ChangeCategory::Configuration,
        ChangeCategory::Testing,
        ChangeCategory::Documentation,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ChangeCategory::NewFeature => "New feature",
            ChangeCategory::ModifiedLogic => "Modified logic",
            ChangeCategory::Refactoring => "Refactoring",
            ChangeCategory::Deletion => "Deletion",
            ChangeCategory::Configuration => "Configuration",
            ChangeCategory::Testing => "Testing",
            ChangeCategory::Documentation => "Documentation",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCategory::NewFeature => write!(f, "new-feature"),
            ChangeCategory::ModifiedLogic => write!(f, "modified-logic"),
            ChangeCategory::Refactoring => write!(f, "refactoring"),
            ChangeCategory::Deletion => write!(f, "deletion"),
            ChangeCategory::Configuration => write!(f, "configuration"),
            ChangeCategory::Testing => write!(f, "testing"),
            ChangeCategory::Documentation => write!(f, "documentation"),
        }
    }
}

/// Order in which category pattern lists are tried. The first category with
/// a matching pattern wins, so a path matching both a configuration and a
/// testing pattern is configuration.
///
/// The first four categories carry no path patterns and are only reachable
/// through the change-type fallback.
pub const CATEGORY_PATTERN_ORDER: [ChangeCategory; 7] = [
    ChangeCategory::NewFeature,
    ChangeCategory::ModifiedLogic,
    ChangeCategory::Refactoring,
    ChangeCategory::Deletion,
    ChangeCategory::Configuration,
    ChangeCategory::Testing,
    ChangeCategory::Documentation,
];

const CONFIGURATION_PATTERNS: &[&str] = &[
    r"(^|/)package(-lock)?\.json$",
    r"(^|/)tsconfig[^/]*\.json$",
    r"\.config\.(js|ts|mjs|cjs|json)$",
    r"(^|/)\.(eslintrc|prettierrc|babelrc|npmrc|nvmrc|editorconfig)[^/]*$",
    r"(^|/)\.env(\.[^/]*)?$",
    r"\.(toml|ya?ml|ini|cfg|lock)$",
    r"(^|/)(Dockerfile|docker-compose)[^/]*$",
    r"(^|/)Makefile$",
    r"(^|/)requirements[^/]*\.txt$",
    r"(^|/)go\.(mod|sum)$",
    r"(^|/)\.git(ignore|attributes)$",
    r"(^|/)\.github/",
];

const TESTING_PATTERNS: &[&str] = &[
    r"\.(test|spec)\.",
    r"(^|/)__tests__/",
    r"(^|/)tests?/",
    r"_test\.go$",
    r"(^|/)test_[^/]*\.py$",
    r"_test\.py$",
    r"_spec\.rb$",
    r"(^|/)e2e/",
    r"(^|/)fixtures/",
];

const DOCUMENTATION_PATTERNS: &[&str] = &[
    r"\.(md|mdx|rst|adoc)$",
    r"(^|/)docs?/",
    r"(?i)(^|/)(readme|changelog|license|contributing)(\.[^/]*)?$",
    r"\.txt$",
];

static BUILTIN: Lazy<CategoryRules> = Lazy::new(CategoryRules::compile_builtin);

#[derive(Debug, Clone)]
struct PatternSet {
    category: ChangeCategory,
    regexes: Vec<Regex>,
    globs: Vec<glob::Pattern>,
}

impl PatternSet {
    fn matches(&self, path: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(path))
            || self.globs.iter().any(|g| g.matches(path))
    }
}

/// Ordered category → pattern table used by the categorizer and the
/// key-file ranker.
///
/// # Examples
///
/// ```
/// use doi_difflens::{CategoryRules, ChangeCategory};
///
/// let rules = CategoryRules::builtin();
/// assert_eq!(rules.path_category("README.md"), Some(ChangeCategory::Documentation));
/// assert_eq!(rules.path_category("src/app.test.ts"), Some(ChangeCategory::Testing));
/// assert_eq!(rules.path_category("src/app.ts"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CategoryRules {
    sets: Vec<PatternSet>,
}

impl CategoryRules {
    /// The built-in tables, compiled on first use.
    pub fn builtin() -> &'static CategoryRules {
        &BUILTIN
    }

    /// Built-in tables extended with the globs from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DoiError::Config`] naming the first invalid glob.
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_core::CategoryConfig;
    /// use doi_difflens::{CategoryRules, ChangeCategory};
    ///
    /// let config = CategoryConfig {
    ///     configuration: vec!["deploy/**".into()],
    ///     ..CategoryConfig::default()
    /// };
    /// let rules = CategoryRules::with_extra(&config).unwrap();
    /// assert_eq!(
    ///     rules.path_category("deploy/prod/app.sh"),
    ///     Some(ChangeCategory::Configuration)
    /// );
    /// ```
    pub fn with_extra(config: &CategoryConfig) -> Result<Self, DoiError> {
        let mut rules = BUILTIN.clone();
        let extras = [
            (ChangeCategory::Configuration, &config.configuration),
            (ChangeCategory::Testing, &config.testing),
            (ChangeCategory::Documentation, &config.documentation),
        ];
        for (category, patterns) in extras {
            let Some(set) = rules.sets.iter_mut().find(|s| s.category == category) else {
                continue;
            };
            for pat in patterns {
                let compiled = glob::Pattern::new(pat).map_err(|e| {
                    DoiError::Config(format!("invalid {category} pattern {pat:?}: {e}"))
                })?;
                set.globs.push(compiled);
            }
        }
        Ok(rules)
    }

    /// Category decided by path patterns alone, or `None` when no pattern matches.
    pub fn path_category(&self, path: &str) -> Option<ChangeCategory> {
        self.sets
            .iter()
            .find(|set| set.matches(path))
            .map(|set| set.category)
    }

    /// `true` if `path` pattern-categorizes as `category`.
    pub fn is(&self, path: &str, category: ChangeCategory) -> bool {
        self.path_category(path) == Some(category)
    }

    fn compile_builtin() -> Self {
        let sets = CATEGORY_PATTERN_ORDER
            .iter()
            .map(|&category| {
                let sources: &[&str] = match category {
                    ChangeCategory::Configuration => CONFIGURATION_PATTERNS,
                    ChangeCategory::Testing => TESTING_PATTERNS,
                    ChangeCategory::Documentation => DOCUMENTATION_PATTERNS,
                    _ => &[],
                };
                PatternSet {
                    category,
                    regexes: sources
                        .iter()
                        .map(|src| Regex::new(src).expect("built-in category pattern"))
                        .collect(),
                    globs: Vec::new(),
                }
            })
            .collect();
        Self { sets }
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(path: &str) -> Option<ChangeCategory> {
        CategoryRules::builtin().path_category(path)
    }

    #[test]
    fn configuration_paths() {
        for path in [
            "package.json",
            "web/package-lock.json",
            "tsconfig.build.json",
            "vite.config.ts",
            ".eslintrc.cjs",
            ".env.local",
            "Cargo.toml",
            ".github/workflows/ci.yml",
            "Dockerfile",
            "docker-compose.override.yml",
            "requirements-dev.txt",
            "go.sum",
            ".gitignore",
        ] {
            assert_eq!(category(path), Some(ChangeCategory::Configuration), "{path}");
        }
    }

    #[test]
    fn testing_paths() {
        for path in [
            "src/app.test.ts",
            "src/app.spec.js",
            "src/__tests__/app.tsx",
            "tests/integration.rs",
            "pkg/server_test.go",
            "test_models.py",
            "spec/models/user_spec.rb",
            "e2e/login.ts",
        ] {
            assert_eq!(category(path), Some(ChangeCategory::Testing), "{path}");
        }
    }

    #[test]
    fn documentation_paths() {
        for path in ["README.md", "docs/guide.html", "CHANGELOG", "LICENSE", "notes.txt", "book/intro.rst"] {
            assert_eq!(category(path), Some(ChangeCategory::Documentation), "{path}");
        }
    }

    #[test]
    fn source_paths_have_no_pattern_category() {
        for path in ["src/main.rs", "lib/auth.ts", "app/models/user.rb", "contest/solver.py"] {
            assert_eq!(category(path), None, "{path}");
        }
    }

    #[test]
    fn earlier_category_wins_on_overlap() {
        // matches the yaml configuration pattern and the tests/ testing pattern
        assert_eq!(category("tests/fixtures/data.yml"), Some(ChangeCategory::Configuration));
        // matches the tests/ testing pattern and the .md documentation pattern
        assert_eq!(category("tests/README.md"), Some(ChangeCategory::Testing));
    }

    #[test]
    fn extra_globs_extend_builtin() {
        let config = CategoryConfig {
            testing: vec!["qa/**".into()],
            documentation: vec!["*.adr".into()],
            ..CategoryConfig::default()
        };
        let rules = CategoryRules::with_extra(&config).unwrap();
        assert_eq!(rules.path_category("qa/smoke.rs"), Some(ChangeCategory::Testing));
        assert_eq!(rules.path_category("decisions/0001.adr"), Some(ChangeCategory::Documentation));
        assert_eq!(rules.path_category("README.md"), Some(ChangeCategory::Documentation));
        assert_eq!(CategoryRules::builtin().path_category("qa/smoke.rs"), None);
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let config = CategoryConfig {
            configuration: vec!["[".into()],
            ..CategoryConfig::default()
        };
        let err = CategoryRules::with_extra(&config).unwrap_err();
        assert!(matches!(err, DoiError::Config(_)));
    }

    #[test]
    fn pattern_order_matches_priority() {
        assert_eq!(CATEGORY_PATTERN_ORDER, ChangeCategory::ALL);
    }
}
