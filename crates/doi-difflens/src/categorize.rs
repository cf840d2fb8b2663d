use std::collections::HashMap;

use doi_core::{ChangeType, ChangedFile};
use serde::{Deserialize, Serialize};

use crate::patterns::{CategoryRules, ChangeCategory};

/// Files of one category together with a generated description.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile};
/// use doi_difflens::{categorize_changes, ChangeCategory};
///
/// let files = vec![ChangedFile::new("src/x.ts", ChangeType::Added, 40, 0)];
/// let changes = categorize_changes(&files);
/// assert_eq!(changes[0].category, ChangeCategory::NewFeature);
/// assert_eq!(changes[0].description, "Added 1 new file (+40 lines)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedChange {
    /// Category shared by every file in the group.
    pub category: ChangeCategory,
    /// One-line description of the group.
    pub description: String,
    /// Member paths in input order.
    pub files: Vec<String>,
}

/// Categorize `files` using the built-in pattern tables.
///
/// Every input file lands in exactly one group. Groups are ordered by
/// [`ChangeCategory::ALL`]; categories with no files are omitted.
pub fn categorize_changes(files: &[ChangedFile]) -> Vec<CategorizedChange> {
    categorize_with(CategoryRules::builtin(), files)
}

/// Categorize `files` using `rules`.
pub fn categorize_with(rules: &CategoryRules, files: &[ChangedFile]) -> Vec<CategorizedChange> {
    let mut groups: HashMap<ChangeCategory, Vec<&ChangedFile>> = HashMap::new();
    for file in files {
        groups
            .entry(categorize_file(rules, file))
            .or_default()
            .push(file);
    }

    ChangeCategory::ALL
        .iter()
        .filter_map(|category| {
            let members = groups.remove(category)?;
            Some(CategorizedChange {
                category: *category,
                description: describe(*category, &members),
                files: members.iter().map(|f| f.path.clone()).collect(),
            })
        })
        .collect()
}

/// Category of a single file: path patterns first, change type second.
///
/// # Examples
///
/// ```
/// use doi_core::{ChangeType, ChangedFile};
/// use doi_difflens::categorize::categorize_file;
/// use doi_difflens::{CategoryRules, ChangeCategory};
///
/// let test = ChangedFile::new("src/app.test.ts", ChangeType::Added, 10, 0);
/// assert_eq!(categorize_file(CategoryRules::builtin(), &test), ChangeCategory::Testing);
/// ```
pub fn categorize_file(rules: &CategoryRules, file: &ChangedFile) -> ChangeCategory {
    if let Some(category) = rules.path_category(&file.path) {
        return category;
    }
    match file.change_type {
        ChangeType::Added => ChangeCategory::NewFeature,
        ChangeType::Deleted => ChangeCategory::Deletion,
        ChangeType::Renamed => ChangeCategory::Refactoring,
        ChangeType::Modified => ChangeCategory::ModifiedLogic,
    }
}

fn describe(category: ChangeCategory, files: &[&ChangedFile]) -> String {
    let n = files.len();
    let added = files
        .iter()
        .fold(0u64, |acc, f| acc + u64::from(f.lines_added));
    let removed = files
        .iter()
        .fold(0u64, |acc, f| acc + u64::from(f.lines_removed));
    let any_added = files.iter().any(|f| f.change_type == ChangeType::Added);

    match category {
        ChangeCategory::NewFeature => {
            format!("Added {n} new {} (+{added} lines)", plural(n, "file"))
        }
        ChangeCategory::ModifiedLogic => format!(
            "Modified logic in {n} {} (+{added}/-{removed} lines)",
            plural(n, "file")
        ),
        ChangeCategory::Refactoring => format!("Refactored/renamed {n} {}", plural(n, "file")),
        ChangeCategory::Deletion => {
            format!("Removed {n} {} (-{removed} lines)", plural(n, "file"))
        }
        ChangeCategory::Configuration => {
            format!("Updated configuration in {n} {}", plural(n, "file"))
        }
        ChangeCategory::Testing => format!(
            "{} {} (+{added}/-{removed} lines)",
            plural(n, "Test"),
            if any_added { "added" } else { "modified" }
        ),
        ChangeCategory::Documentation => format!(
            "Documentation {}",
            if any_added { "added" } else { "updated" }
        ),
    }
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn file(path: &str, change_type: ChangeType, added: u32, removed: u32) -> ChangedFile {
        ChangedFile::new(path, change_type, added, removed)
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(categorize_changes(&[]).is_empty());
    }

    #[test]
    fn huge_line_counts_are_summed_exactly() {
        let files = vec![
            file("src/a.rs", ChangeType::Modified, u32::MAX, 1),
            file("src/b.rs", ChangeType::Modified, 1, u32::MAX),
        ];
        let changes = categorize_changes(&files);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].description,
            "Modified logic in 2 files (+4294967296/-4294967296 lines)"
        );
    }

    #[test]
    fn readme_and_new_source_file() {
        let files = vec![
            file("README.md", ChangeType::Modified, 5, 1),
            file("src/x.ts", ChangeType::Added, 40, 0),
        ];
        let changes = categorize_changes(&files);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].category, ChangeCategory::NewFeature);
        assert_eq!(changes[0].description, "Added 1 new file (+40 lines)");
        assert_eq!(changes[0].files, vec!["src/x.ts"]);
        assert_eq!(changes[1].category, ChangeCategory::Documentation);
        assert_eq!(changes[1].description, "Documentation updated");
        assert_eq!(changes[1].files, vec!["README.md"]);
    }

    #[test]
    fn path_pattern_beats_change_type() {
        let changes = categorize_changes(&[file("src/app.test.ts", ChangeType::Added, 12, 0)]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].category, ChangeCategory::Testing);
        assert_eq!(changes[0].description, "Test added (+12/-0 lines)");
    }

    #[test]
    fn change_type_fallback() {
        let files = vec![
            file("src/old.rs", ChangeType::Deleted, 0, 30),
            file("src/moved.rs", ChangeType::Renamed, 0, 0),
            file("src/a.rs", ChangeType::Modified, 3, 2),
            file("src/b.rs", ChangeType::Modified, 7, 1),
        ];
        let changes = categorize_changes(&files);
        let categories: Vec<_> = changes.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![
                ChangeCategory::ModifiedLogic,
                ChangeCategory::Refactoring,
                ChangeCategory::Deletion
            ]
        );
        assert_eq!(changes[0].description, "Modified logic in 2 files (+10/-3 lines)");
        assert_eq!(changes[0].files, vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(changes[1].description, "Refactored/renamed 1 file");
        assert_eq!(changes[2].description, "Removed 1 file (-30 lines)");
    }

    #[test]
    fn plural_descriptions() {
        let files = vec![
            file("Cargo.toml", ChangeType::Modified, 1, 1),
            file(".github/workflows/ci.yml", ChangeType::Added, 20, 0),
            file("tests/a.rs", ChangeType::Modified, 4, 4),
            file("tests/b.rs", ChangeType::Modified, 1, 0),
            file("docs/new.md", ChangeType::Added, 9, 0),
        ];
        let changes = categorize_changes(&files);
        assert_eq!(changes[0].description, "Updated configuration in 2 files");
        assert_eq!(changes[1].description, "Tests modified (+5/-4 lines)");
        assert_eq!(changes[2].description, "Documentation added");
    }

    #[test]
    fn every_file_lands_in_exactly_one_group() {
        let files = vec![
            file("src/a.rs", ChangeType::Added, 1, 0),
            file("src/b.rs", ChangeType::Modified, 1, 1),
            file("README.md", ChangeType::Modified, 1, 0),
            file("package.json", ChangeType::Modified, 2, 2),
            file("src/c.spec.ts", ChangeType::Added, 3, 0),
            file("src/d.rs", ChangeType::Deleted, 0, 9),
            file("src/e.rs", ChangeType::Renamed, 0, 0),
            file("src/f.rs", ChangeType::Added, 5, 0),
        ];
        let changes = categorize_changes(&files);

        let grouped: Vec<&String> = changes.iter().flat_map(|c| c.files.iter()).collect();
        assert_eq!(grouped.len(), files.len());
        let unique: HashSet<&String> = grouped.iter().copied().collect();
        assert_eq!(unique.len(), files.len());
        for f in &files {
            assert!(unique.contains(&f.path));
        }
    }

    #[test]
    fn groups_follow_priority_order() {
        let files = vec![
            file("README.md", ChangeType::Modified, 1, 0),
            file("src/gone.rs", ChangeType::Deleted, 0, 4),
            file("src/new.rs", ChangeType::Added, 4, 0),
        ];
        let categories: Vec<_> = categorize_changes(&files)
            .iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(
            categories,
            vec![
                ChangeCategory::NewFeature,
                ChangeCategory::Deletion,
                ChangeCategory::Documentation
            ]
        );
    }

    #[test]
    fn output_is_deterministic() {
        let files = vec![
            file("src/a.rs", ChangeType::Added, 1, 0),
            file("docs/x.md", ChangeType::Modified, 1, 0),
        ];
        assert_eq!(categorize_changes(&files), categorize_changes(&files));
    }
}
