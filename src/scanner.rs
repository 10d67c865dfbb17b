//! Flat recursive listing of a directory.

use serde::Serialize;
use std::path::Path;

use crate::category::CategoryTable;
use crate::error::{MfmError, ScanResult, guarded};
use crate::filter::EntryFilter;
use crate::inspect::{FileDescriptor, inspect};
use crate::traverse::{resolve_root, skip_walk_error, walk};

/// Options for [`scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub include_hidden: bool,
    /// Levels below the root to visit; unbounded when `None`.
    pub max_depth: Option<usize>,
    pub exclude_patterns: Vec<String>,
}

/// Every visited entry, split into files and directories.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub files: Vec<FileDescriptor>,
    pub dirs: Vec<FileDescriptor>,
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,
}

impl ScanReport {
    fn push(&mut self, descriptor: FileDescriptor) {
        if descriptor.is_dir() {
            self.dirs.push(descriptor);
            self.total_dirs += 1;
        } else if descriptor.is_file() {
            self.total_size += descriptor.size();
            self.files.push(descriptor);
            self.total_files += 1;
        } else {
            log::debug!("Ignoring special file {}", descriptor.path().display());
        }
    }

    /// Files and directories in one iterator, directories first.
    pub fn entries(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.dirs.iter().chain(self.files.iter())
    }
}

/// Collects a descriptor for every entry under `root`, in name order.
///
/// Entries that cannot be inspected are logged and left out. Entries that
/// are neither regular files nor directories (sockets, FIFOs) are not
/// reported, matching [`analyze`](crate::analyzer::analyze).
pub fn scan(
    root: &Path,
    options: &ScanOptions,
    table: &CategoryTable,
) -> Result<ScanReport, MfmError> {
    let root = resolve_root(root)?;
    let filter =
        EntryFilter::new::<String>(options.include_hidden, &options.exclude_patterns, &[])?;
    let mut report = ScanReport::default();

    for entry in walk(&root, options.max_depth, &filter).filter_map(skip_walk_error) {
        match inspect(entry.path(), table) {
            Ok(descriptor) => {
                log::debug!("Scanned {}", descriptor.path().display());
                report.push(descriptor);
            }
            Err(err) => log::warn!("Error scanning {}: {}", entry.path().display(), err),
        }
    }

    Ok(report)
}

/// Public entry point for [`scan`]. A missing root comes back as a
/// `NotFound` failure.
pub fn scan_directory(root: &Path, options: &ScanOptions, table: &CategoryTable) -> ScanResult {
    guarded("scan", || scan(root, options, table))
}

/// Lists the direct children of `root`.
pub fn list_directory(root: &Path, include_hidden: bool, table: &CategoryTable) -> ScanResult {
    let options = ScanOptions {
        include_hidden,
        max_depth: Some(1),
        exclude_patterns: Vec::new(),
    };
    guarded("list", || scan(root, &options, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("test.txt"), "test content").unwrap();
        fs::write(root.join(".hidden"), "hidden content").unwrap();
        fs::create_dir_all(root.join("subdir/nested")).unwrap();
        fs::write(root.join("subdir/inner.py"), "print(1)").unwrap();
        fs::write(root.join("subdir/nested/deep.md"), "# deep").unwrap();
        temp_dir
    }

    #[test]
    fn test_scan_recurses_fully_by_default() {
        let temp_dir = setup();
        let report = scan(temp_dir.path(), &ScanOptions::default(), &CategoryTable::builtin())
            .expect("scan failed");

        assert_eq!(report.total_files, 3);
        assert_eq!(report.total_dirs, 2);
        assert_eq!(report.total_size, 12 + 8 + 6);
        let deep = report
            .files
            .iter()
            .find(|f| f.name() == "deep.md")
            .expect("deep file listed");
        assert_eq!(deep.category(), Some("Documents"));
    }

    #[test]
    fn test_scan_depth_limit() {
        let temp_dir = setup();
        let options = ScanOptions {
            max_depth: Some(2),
            ..Default::default()
        };
        let report = scan(temp_dir.path(), &options, &CategoryTable::builtin()).unwrap();
        let names: Vec<_> = report.files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["inner.py", "test.txt"]);
        assert_eq!(report.total_dirs, 2);
    }

    #[test]
    fn test_scan_hidden_and_excluded() {
        let temp_dir = setup();
        let options = ScanOptions {
            include_hidden: true,
            exclude_patterns: vec!["nested".to_string()],
            ..Default::default()
        };
        let report = scan(temp_dir.path(), &options, &CategoryTable::builtin()).unwrap();
        assert!(report.files.iter().any(|f| f.name() == ".hidden"));
        assert!(report.files.iter().all(|f| f.name() != "deep.md"));
        assert_eq!(report.total_dirs, 1);
    }

    #[test]
    fn test_list_directory_only_children() {
        let temp_dir = setup();
        let result = list_directory(temp_dir.path(), false, &CategoryTable::builtin());
        let report = result.payload().expect("list succeeded");
        let names: Vec<_> = report.entries().map(|e| e.name()).collect();
        assert_eq!(names, vec!["subdir", "test.txt"]);
    }

    #[test]
    fn test_scan_missing_root_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = scan_directory(
            &temp_dir.path().join("missing"),
            &ScanOptions::default(),
            &CategoryTable::builtin(),
        );
        assert!(!result.success());
        assert!(result.error().is_some_and(MfmError::is_not_found));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_ignores_special_files() {
        use std::os::unix::net::UnixListener;

        let temp_dir = setup();
        let _listener = UnixListener::bind(temp_dir.path().join("app.sock")).unwrap();

        let report = scan(temp_dir.path(), &ScanOptions::default(), &CategoryTable::builtin())
            .expect("scan failed");
        assert_eq!(report.total_files, 3);
        assert_eq!(report.total_size, 12 + 8 + 6);
        assert!(report.entries().all(|e| e.name() != "app.sock"));
    }
}
