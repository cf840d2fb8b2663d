//! Key-file ranking: which changed files deserve review attention first.
//!
//! The score multipliers compound, so they are applied in a fixed order:
//! source extension, added file, test file, configuration, documentation.

use std::path::Path;

use doi_core::{ChangeType, ChangedFile};

use crate::patterns::{CategoryRules, ChangeCategory};

/// Default number of key files returned.
pub const DEFAULT_KEY_FILE_LIMIT: usize = 5;

const SOURCE_EXTENSIONS: &[&str] = &["ts", "js", "tsx", "jsx", "py", "go", "rs", "java", "cpp", "c"];

const SOURCE_BOOST: f64 = 1.5;
const ADDED_BOOST: f64 = 1.3;
const TEST_PENALTY: f64 = 0.7;
const CONFIG_PENALTY: f64 = 0.5;
const DOCS_PENALTY: f64 = 0.3;

/// Top `limit` paths by importance score, using the built-in pattern tables.
///
/// Returns at most `min(limit, files.len())` paths. Equal scores keep input order.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile};
/// use doi_difflens::identify_key_files;
///
/// let files = vec![
///     ChangedFile::new("README.md", ChangeType::Modified, 100, 0),
///     ChangedFile::new("src/auth.rs", ChangeType::Modified, 40, 10),
/// ];
/// assert_eq!(identify_key_files(&files, 1), vec!["src/auth.rs"]);
/// ```
pub fn identify_key_files(files: &[ChangedFile], limit: usize) -> Vec<String> {
    identify_key_files_with(CategoryRules::builtin(), files, limit)
}

/// Top `limit` paths by importance score, using `rules` for the
/// configuration and documentation penalties.
pub fn identify_key_files_with(
    rules: &CategoryRules,
    files: &[ChangedFile],
    limit: usize,
) -> Vec<String> {
    let mut scored: Vec<(&ChangedFile, f64)> =
        files.iter().map(|f| (f, score_file(rules, f))).collect();
    // sort_by is stable: ties keep input order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(limit)
        .map(|(f, _)| f.path.clone())
        .collect()
}

/// Importance score of a single file.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile};
/// use doi_difflens::keyfiles::score_file;
/// use doi_difflens::CategoryRules;
///
/// let file = ChangedFile::new("src/new.rs", ChangeType::Added, 10, 0);
/// let score = score_file(CategoryRules::builtin(), &file);
/// assert!((score - 10.0 * 1.5 * 1.3).abs() < 1e-9);
/// ```
pub fn score_file(rules: &CategoryRules, file: &ChangedFile) -> f64 {
    let mut score = f64::from(file.total_lines());

    if is_source_file(&file.path) {
        score *= SOURCE_BOOST;
    }
    if file.change_type == ChangeType::Added {
        score *= ADDED_BOOST;
    }
    if is_test_file(&file.path) {
        score *= TEST_PENALTY;
    }
    match rules.path_category(&file.path) {
        Some(ChangeCategory::Configuration) => score *= CONFIG_PENALTY,
        Some(ChangeCategory::Documentation) => score *= DOCS_PENALTY,
        _ => {}
    }

    score
}

fn is_source_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn is_test_file(path: &str) -> bool {
    path.contains(".test.") || path.contains(".spec.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, change_type: ChangeType, added: u32, removed: u32) -> ChangedFile {
        ChangedFile::new(path, change_type, added, removed)
    }

    fn score(f: &ChangedFile) -> f64 {
        score_file(CategoryRules::builtin(), f)
    }

    #[test]
    fn empty_input() {
        assert!(identify_key_files(&[], 5).is_empty());
    }

    #[test]
    fn limit_bounds_output() {
        let files: Vec<_> = (0..8)
            .map(|i| file(&format!("src/f{i}.rs"), ChangeType::Modified, i, 0))
            .collect();
        assert_eq!(identify_key_files(&files, 5).len(), 5);
        assert_eq!(identify_key_files(&files[..3], 5).len(), 3);
        assert!(identify_key_files(&files, 0).is_empty());
    }

    #[test]
    fn huge_line_counts_still_rank() {
        let files = vec![
            file("src/small.rs", ChangeType::Modified, 3, 0),
            file("src/huge.rs", ChangeType::Modified, u32::MAX, 1),
        ];
        assert_eq!(identify_key_files(&files, 5), vec!["src/huge.rs", "src/small.rs"]);
    }

    #[test]
    fn multipliers_compound_in_order() {
        let f = file("src/widget.test.tsx", ChangeType::Added, 60, 40);
        let expected = 100.0 * 1.5 * 1.3 * 0.7;
        assert!((score(&f) - expected).abs() < 1e-9);

        let f = file("package.json", ChangeType::Modified, 10, 10);
        assert!((score(&f) - 20.0 * 0.5).abs() < 1e-9);

        let f = file("docs/guide.md", ChangeType::Added, 10, 0);
        assert!((score(&f) - 10.0 * 1.3 * 0.3).abs() < 1e-9);

        let f = file("src/a.rs", ChangeType::Modified, 10, 0);
        assert!((score(&f) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn config_js_file_gets_source_boost_and_config_penalty() {
        let f = file("jest.config.js", ChangeType::Modified, 10, 0);
        assert!((score(&f) - 10.0 * 1.5 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn source_outranks_larger_docs_change() {
        let files = vec![
            file("CHANGELOG.md", ChangeType::Modified, 200, 0),
            file("src/core.rs", ChangeType::Modified, 50, 0),
            file("src/app.test.ts", ChangeType::Modified, 60, 0),
        ];
        // 200*0.3=60, 50*1.5=75, 60*1.5*0.7=63
        assert_eq!(
            identify_key_files(&files, 5),
            vec!["src/core.rs", "src/app.test.ts", "CHANGELOG.md"]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let files = vec![
            file("src/b.rs", ChangeType::Modified, 10, 0),
            file("src/a.rs", ChangeType::Modified, 10, 0),
            file("src/c.rs", ChangeType::Modified, 10, 0),
        ];
        assert_eq!(
            identify_key_files(&files, 3),
            vec!["src/b.rs", "src/a.rs", "src/c.rs"]
        );
    }

    #[test]
    fn returned_scores_are_non_increasing() {
        let files = vec![
            file("README.md", ChangeType::Modified, 30, 3),
            file("src/x.ts", ChangeType::Added, 40, 0),
            file("src/y.py", ChangeType::Modified, 12, 30),
            file("Cargo.toml", ChangeType::Modified, 80, 2),
            file("assets/logo.svg", ChangeType::Added, 0, 0),
        ];
        let keys = identify_key_files(&files, 5);
        let scores: Vec<f64> = keys
            .iter()
            .map(|p| score(files.iter().find(|f| &f.path == p).unwrap()))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        for key in &keys {
            assert!(files.iter().any(|f| &f.path == key));
        }
    }
}
