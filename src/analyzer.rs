//! Recursive directory analysis: sizes, counts, extensions and categories.
//!
//! Analysis fails fast when the root is missing, unlike
//! [`build_tree`](crate::tree::build_tree) which always returns a renderable
//! tree. Failures on individual entries are logged and skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::category::{CategoryTable, extension_of};
use crate::error::{AnalyzeResult, MfmError, guarded};
use crate::filter::EntryFilter;
use crate::inspect::{FileDescriptor, inspect};
use crate::traverse::{resolve_root, skip_walk_error, walk};

/// Options for [`analyze`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Count entries whose name starts with `.`. Hidden directories are
    /// still descended when this is off.
    pub include_hidden: bool,
    /// Levels below the root to visit; unbounded when `None`.
    pub max_depth: Option<usize>,
    /// Glob patterns of entries to skip (with their subtree).
    pub exclude_patterns: Vec<String>,
}

/// Count and size of the files in one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBucket {
    pub count: u64,
    pub total_size: u64,
}

/// Aggregate statistics gathered during one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStatistics {
    pub total_size: u64,
    pub file_count: u64,
    pub dir_count: u64,
    /// Lowercase extension (with dot, `""` for none) to occurrence count.
    pub extensions: BTreeMap<String, u64>,
    pub by_category: BTreeMap<String, CategoryBucket>,
}

impl DirectoryStatistics {
    fn record_file(&mut self, file: &FileDescriptor, table: &CategoryTable) {
        self.file_count += 1;
        self.total_size += file.size();

        let ext = extension_of(file.name());
        let category = table.resolve_extension(&ext).to_string();
        *self.extensions.entry(ext).or_insert(0) += 1;

        let bucket = self.by_category.entry(category).or_default();
        bucket.count += 1;
        bucket.total_size += file.size();
    }

    /// Number of entries counted (files plus directories).
    pub fn entry_count(&self) -> u64 {
        self.file_count + self.dir_count
    }
}

/// Walks `root` and aggregates statistics.
///
/// Regular files feed the size, extension and category figures; directories
/// below the root are counted; other entry kinds are ignored. A hidden name
/// only skips that entry, so visible files inside hidden directories still
/// count. Exclude patterns skip whole subtrees. Fails with
/// [`MfmError::NotFound`] if `root` is missing or not a directory.
pub fn analyze(
    root: &Path,
    options: &AnalyzeOptions,
    table: &CategoryTable,
) -> Result<DirectoryStatistics, MfmError> {
    let root = resolve_root(root)?;
    let filter = EntryFilter::new::<String>(true, &options.exclude_patterns, &[])?;
    let mut stats = DirectoryStatistics::default();

    for entry in walk(&root, options.max_depth, &filter).filter_map(skip_walk_error) {
        let hidden = EntryFilter::is_hidden(&entry.file_name().to_string_lossy());
        if hidden && !options.include_hidden {
            continue;
        }
        let descriptor = match inspect(entry.path(), table) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                log::warn!("Could not get info for {}: {}", entry.path().display(), err);
                continue;
            }
        };

        if descriptor.is_file() {
            stats.record_file(&descriptor, table);
        } else if descriptor.is_dir() {
            stats.dir_count += 1;
        } else {
            log::debug!("Ignoring special file {}", entry.path().display());
        }
    }

    log::debug!(
        "Analyzed {}: {} files, {} directories, {} bytes",
        root.display(),
        stats.file_count,
        stats.dir_count,
        stats.total_size
    );
    Ok(stats)
}

/// Public entry point for [`analyze`].
pub fn analyze_directory(
    root: &Path,
    options: &AnalyzeOptions,
    table: &CategoryTable,
) -> AnalyzeResult {
    guarded("analyze", || analyze(root, options, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryRule, OTHER};
    use std::fs;
    use tempfile::TempDir;

    fn table() -> CategoryTable {
        CategoryTable::new(vec![
            CategoryRule::new("Documents", [".txt"], 1),
            CategoryRule::new("Images", [".jpg"], 2),
            CategoryRule::new("Code", [".py"], 3),
        ])
    }

    fn populate(root: &Path) {
        fs::write(root.join("test.txt"), "test content").unwrap();
        fs::write(root.join("test.jpg"), b"fake image content").unwrap();
        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/test.py"), "print('hello')").unwrap();
    }

    #[test]
    fn test_analyze_counts_and_sizes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        populate(temp_dir.path());

        let stats = analyze(temp_dir.path(), &AnalyzeOptions::default(), &table()).unwrap();
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.dir_count, 1);
        assert_eq!(stats.total_size, 12 + 18 + 14);
        assert_eq!(stats.extensions.len(), 3);
        assert_eq!(stats.extensions.get(".txt"), Some(&1));
        assert_eq!(stats.extensions.get(".py"), Some(&1));
        assert_eq!(
            stats.by_category.get("Images"),
            Some(&CategoryBucket {
                count: 1,
                total_size: 18
            })
        );
    }

    #[test]
    fn test_analyze_hidden_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        populate(temp_dir.path());
        fs::write(temp_dir.path().join(".secret"), "abc").unwrap();
        fs::create_dir(temp_dir.path().join(".cache")).unwrap();
        fs::write(temp_dir.path().join(".cache/blob.bin"), "abcd").unwrap();

        let stats = analyze(temp_dir.path(), &AnalyzeOptions::default(), &table()).unwrap();
        // .secret and .cache are skipped; .cache/blob.bin is visible
        assert_eq!(stats.entry_count(), 5);
        assert_eq!(stats.extensions.get(".bin"), Some(&1));
        assert_eq!(stats.extensions.get(""), None);

        let options = AnalyzeOptions {
            include_hidden: true,
            ..Default::default()
        };
        let stats = analyze(temp_dir.path(), &options, &table()).unwrap();
        assert_eq!(stats.file_count, 5);
        assert_eq!(stats.dir_count, 2);
        assert_eq!(stats.extensions.get(""), Some(&1));
        assert_eq!(stats.by_category.get(OTHER).map(|b| b.count), Some(2));
    }

    #[test]
    fn test_analyze_counts_visible_files_inside_hidden_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp_dir.path().join(".cache")).unwrap();
        fs::write(temp_dir.path().join(".cache/blob.txt"), "bb").unwrap();

        let stats = analyze(temp_dir.path(), &AnalyzeOptions::default(), &table()).unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.dir_count, 0);
        assert_eq!(stats.total_size, 3);
        assert_eq!(stats.by_category.get("Documents").map(|b| b.count), Some(2));
    }

    #[test]
    fn test_analyze_exclude_and_depth() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        populate(temp_dir.path());

        let options = AnalyzeOptions {
            exclude_patterns: vec!["subdir".to_string()],
            ..Default::default()
        };
        let stats = analyze(temp_dir.path(), &options, &table()).unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.dir_count, 0);

        let options = AnalyzeOptions {
            max_depth: Some(1),
            ..Default::default()
        };
        let stats = analyze(temp_dir.path(), &options, &table()).unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.dir_count, 1);
    }

    #[test]
    fn test_analyze_missing_root_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");

        let err = analyze(&missing, &AnalyzeOptions::default(), &table()).unwrap_err();
        assert!(err.is_not_found());

        let result = analyze_directory(&missing, &AnalyzeOptions::default(), &table());
        assert!(!result.success());
    }
}
