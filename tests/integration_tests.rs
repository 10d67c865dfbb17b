/// Integration tests for mfm
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the master folder manager.
///
/// Test categories:
/// 1. Organization workflows and collision naming
/// 2. Analysis, scanning and tree building
/// 3. Single-file operations
/// 4. Settings bookkeeping
use mfm::category::{CategoryRule, CategoryTable, OTHER};
use mfm::config::{MAX_RECENT_PATHS, Settings};
use mfm::{
    AnalyzeOptions, OrganizeOptions, ScanOptions, TransferMode, TreeOptions, analyze,
    analyze_directory, build_tree, copy_file, create_master_folders, delete_path, hash_file,
    inspect_path, move_file, organize_files, rename_file, scan_directory,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary directory with configurable
/// file structure for testing.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with a temporary directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    /// Get the path to the test directory.
    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content, creating parent directories as needed.
    fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
        file_path
    }

    /// Create a file with specific content (string version).
    fn create_text_file(&self, name: &str, content: &str) -> PathBuf {
        self.create_file(name, content.as_bytes())
    }

    /// Create a subdirectory in the test directory.
    fn create_subdir(&self, name: &str) -> PathBuf {
        let dir_path = self.path().join(name);
        fs::create_dir_all(&dir_path).expect("Failed to create subdirectory");
        dir_path
    }

    /// Assert that a file exists at the given relative path.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that a file does NOT exist at the given relative path.
    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Names of the entries directly inside a directory, sorted.
    fn list(&self, rel_path: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path().join(rel_path))
            .expect("Failed to read directory")
            .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn scenario_table() -> CategoryTable {
    CategoryTable::new(vec![
        CategoryRule::new("Documents", [".txt"], 1),
        CategoryRule::new("Images", [".jpg"], 2),
        CategoryRule::new("Code", [".py"], 3),
    ])
}

// ============================================================================
// 1. Organization workflows
// ============================================================================

#[test]
fn test_organize_three_categories() {
    let fixture = TestFixture::new();
    fixture.create_text_file("source/doc.txt", "document");
    fixture.create_file("source/image.jpg", b"\xFF\xD8\xFF");
    fixture.create_text_file("source/script.py", "print('hello')");

    let result = organize_files(
        &fixture.path().join("source"),
        &fixture.path().join("dest"),
        &OrganizeOptions::default(),
        &scenario_table(),
    );

    let counts = result.payload().expect("organize succeeded");
    assert_eq!(counts.get("Documents"), Some(&1));
    assert_eq!(counts.get("Images"), Some(&1));
    assert_eq!(counts.get("Code"), Some(&1));
    assert_eq!(counts.len(), 3);

    fixture.assert_file_exists("dest/Documents/doc.txt");
    fixture.assert_file_exists("dest/Images/image.jpg");
    fixture.assert_file_exists("dest/Code/script.py");
    fixture.assert_file_not_exists("source/doc.txt");
}

#[test]
fn test_organize_duplicate_content_keeps_both() {
    let fixture = TestFixture::new();
    fixture.create_text_file("source/a.txt", "same content");
    fixture.create_text_file("source/b.txt", "same content");

    let result = organize_files(
        &fixture.path().join("source"),
        &fixture.path().join("dest"),
        &OrganizeOptions::default(),
        &scenario_table(),
    );

    assert_eq!(result.payload().and_then(|c| c.get("Documents")), Some(&2));
    assert_eq!(fixture.list("dest/Documents"), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_repeated_runs_never_chain_copy_markers() {
    let fixture = TestFixture::new();
    let source = fixture.path().join("source");
    let dest = fixture.path().join("dest");
    let options = OrganizeOptions::default();

    for run in 0..3 {
        fixture.create_text_file("source/doc.txt", &format!("run {run}"));
        let result = organize_files(&source, &dest, &options, &scenario_table());
        assert!(result.success());
    }

    assert_eq!(
        fixture.list("dest/Documents"),
        vec!["doc (copy 1).txt", "doc (copy 2).txt", "doc.txt"]
    );
    assert_eq!(
        fs::read_to_string(dest.join("Documents/doc.txt")).unwrap(),
        "run 0"
    );
    assert_eq!(
        fs::read_to_string(dest.join("Documents/doc (copy 2).txt")).unwrap(),
        "run 2"
    );
}

#[test]
fn test_organize_copy_mode_keeps_sources() {
    let fixture = TestFixture::new();
    fixture.create_text_file("source/nested/deep/notes.txt", "notes");
    fixture.create_text_file("source/unknown.xyz", "???");

    let options = OrganizeOptions {
        transfer: TransferMode::Copy,
        ..Default::default()
    };
    let result = organize_files(
        &fixture.path().join("source"),
        &fixture.path().join("dest"),
        &options,
        &scenario_table(),
    );

    let counts = result.payload().expect("organize succeeded");
    assert_eq!(counts.get("Documents"), Some(&1));
    assert_eq!(counts.get(OTHER), Some(&1));
    fixture.assert_file_exists("source/nested/deep/notes.txt");
    fixture.assert_file_exists("dest/Documents/notes.txt");
    fixture.assert_file_exists("dest/Other/unknown.xyz");
}

#[test]
fn test_organize_missing_source_is_failure() {
    let fixture = TestFixture::new();
    let result = organize_files(
        &fixture.path().join("missing"),
        &fixture.path().join("dest"),
        &OrganizeOptions::default(),
        &scenario_table(),
    );

    assert!(!result.success());
    assert!(result.error_message().is_some());
    fixture.assert_file_not_exists("dest");
}

#[test]
fn test_create_master_folders_with_builtin_table() {
    let fixture = TestFixture::new();
    let root = fixture.path().join("Master Folders");

    let result = create_master_folders(&root, &CategoryTable::builtin());
    let folders = result.payload().expect("folders created");

    assert!(folders.contains_key(OTHER));
    assert!(folders.contains_key("Coding_Projects"));
    for folder in folders.values() {
        assert!(folder.is_dir(), "{} should exist", folder.display());
    }
}

// ============================================================================
// 2. Analysis, scanning and tree building
// ============================================================================

#[test]
fn test_analyze_counts_match_visible_entries() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "12345");
    fixture.create_text_file("sub/b.py", "123");
    fixture.create_text_file("sub/inner/c.md", "1");
    fixture.create_text_file(".hidden/visible.txt", "1234");
    fixture.create_text_file(".hidden/.secret", "ignored");
    fixture.create_text_file(".dotfile", "ignored");

    let stats = analyze(
        fixture.path(),
        &AnalyzeOptions::default(),
        &CategoryTable::builtin(),
    )
    .expect("analyze succeeded");

    // a.txt, sub, sub/b.py, sub/inner, sub/inner/c.md, .hidden/visible.txt
    assert_eq!(stats.file_count + stats.dir_count, 6);
    assert_eq!(stats.total_size, 5 + 3 + 1 + 4);
    let category_total: u64 = stats.by_category.values().map(|b| b.total_size).sum();
    assert_eq!(category_total, stats.total_size);
}

#[test]
fn test_analyze_missing_root_fails_fast() {
    let fixture = TestFixture::new();
    let result = analyze_directory(
        &fixture.path().join("nope"),
        &AnalyzeOptions::default(),
        &CategoryTable::builtin(),
    );
    assert!(!result.success());
}

#[test]
fn test_scan_missing_root_is_structured_failure() {
    let fixture = TestFixture::new();
    let result = scan_directory(
        &fixture.path().join("nope"),
        &ScanOptions::default(),
        &CategoryTable::builtin(),
    );
    assert!(result.error().is_some_and(|e| e.is_not_found()));
}

#[test]
fn test_build_tree_missing_root_returns_named_node() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("vanished");

    let tree = build_tree(&missing, &TreeOptions::default());
    assert_eq!(tree.name, "vanished");
    assert_eq!(tree.children().count(), 0);
}

#[test]
fn test_build_tree_exclusion_beats_inclusion() {
    let fixture = TestFixture::new();
    fixture.create_text_file("keep.rs", "");
    fixture.create_text_file("skip.rs", "");
    fixture.create_text_file("notes.txt", "");

    let options = TreeOptions {
        max_depth: None,
        exclude_patterns: vec!["skip.rs".to_string()],
        include_patterns: vec!["*.rs".to_string()],
    };
    let tree = build_tree(fixture.path(), &options);
    let names: Vec<_> = tree.children().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["keep.rs"]);
}

#[test]
fn test_inspect_empty_file() {
    let fixture = TestFixture::new();
    let path = fixture.create_file("empty.dat", b"");

    let result = inspect_path(&path, &CategoryTable::builtin());
    let info = result.payload().expect("inspect succeeded");
    assert_eq!(info.size(), 0);
    assert!(info.is_file());
    assert!(!info.is_dir());
    assert_eq!(info.category(), Some(OTHER));
}

// ============================================================================
// 3. Single-file operations
// ============================================================================

#[test]
fn test_file_operations_report_failures() {
    let fixture = TestFixture::new();
    let existing = fixture.create_text_file("existing.txt", "content");
    let other = fixture.create_text_file("other.txt", "other");
    let missing = fixture.path().join("missing.txt");

    assert!(!move_file(&missing, &fixture.path().join("x.txt"), false).success());
    assert!(!copy_file(&existing, &other, false).success());
    assert!(!rename_file(&existing, "bad|name.txt").success());
    assert!(!rename_file(&existing, "").success());
    assert!(!delete_path(&missing, false).success());
    assert!(!hash_file(&existing, "whirlpool").success());
    assert!(!hash_file(&missing, "sha256").success());

    fixture.assert_file_exists("existing.txt");
    assert_eq!(fs::read_to_string(&other).unwrap(), "other");
}

#[test]
fn test_file_operations_workflow() {
    let fixture = TestFixture::new();
    let original = fixture.create_text_file("report.txt", "quarterly");
    fixture.create_subdir("archive");

    let copied = copy_file(&original, &fixture.path().join("archive/report.txt"), false)
        .into_result()
        .expect("copy succeeded");
    let renamed = rename_file(&copied, "report-2024.txt")
        .into_result()
        .expect("rename succeeded");
    let moved = move_file(&renamed, &fixture.path().join("final/report.txt"), false)
        .into_result()
        .expect("move succeeded");

    let original_hash = hash_file(&original, "sha256").into_result().unwrap();
    let moved_hash = hash_file(&moved, "sha256").into_result().unwrap();
    assert_eq!(original_hash.hash_value, moved_hash.hash_value);

    assert!(delete_path(&fixture.path().join("final"), true).success());
    fixture.assert_file_not_exists("final/report.txt");
    fixture.assert_file_exists("report.txt");
}

// ============================================================================
// 4. Settings bookkeeping
// ============================================================================

#[test]
fn test_recent_paths_persist_with_cap() {
    let fixture = TestFixture::new();
    let config = fixture.path().join("mfm.json");

    let mut settings = Settings::load(Some(&config)).expect("load failed");
    for i in 0..12 {
        settings.add_recent_path(format!("/data/{i}"));
    }
    settings.add_recent_path("/data/3");
    settings.save(&config).expect("save failed");

    let reloaded = Settings::load(Some(&config)).expect("reload failed");
    assert_eq!(reloaded.recent_paths.len(), MAX_RECENT_PATHS);
    assert_eq!(reloaded.recent_paths[0], PathBuf::from("/data/3"));
    assert_eq!(reloaded.recent_paths[1], PathBuf::from("/data/11"));
}

#[test]
fn test_settings_drive_categorization() {
    let fixture = TestFixture::new();
    let config = fixture.create_text_file(
        "mfm.json",
        r#"{ "categories": { "Notes": { "extensions": [".txt", ".md"], "priority": 1 } } }"#,
    );
    fixture.create_text_file("source/todo.md", "- [ ] thing");

    let settings = Settings::load(Some(&config)).expect("load failed");
    let result = organize_files(
        &fixture.path().join("source"),
        &fixture.path().join("dest"),
        &OrganizeOptions::default(),
        &settings.category_table(),
    );

    assert_eq!(result.payload().and_then(|c| c.get("Notes")), Some(&1));
    fixture.assert_file_exists("dest/Notes/todo.md");
}

// ============================================================================
// 5. Per-entry failures
// ============================================================================

#[cfg(unix)]
mod entry_failures {
    use super::*;
    use std::os::unix::fs::{PermissionsExt, symlink};

    fn set_mode(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .expect("Failed to set permissions");
    }

    /// Builds `a.txt`, an unreadable `locked/` directory and a dangling
    /// symlink. Returns `None` when permissions are not enforced (root).
    fn broken_tree(fixture: &TestFixture) -> Option<PathBuf> {
        fixture.create_text_file("a.txt", "12345");
        fixture.create_text_file("locked/inner.txt", "hidden away");
        symlink(fixture.path().join("gone.txt"), fixture.path().join("dangling.txt"))
            .expect("Failed to create symlink");

        let locked = fixture.path().join("locked");
        set_mode(&locked, 0o000);
        if fs::read_dir(&locked).is_ok() {
            set_mode(&locked, 0o755);
            return None;
        }
        Some(locked)
    }

    #[test]
    fn test_analyze_and_scan_skip_unreadable_entries() {
        let fixture = TestFixture::new();
        let Some(locked) = broken_tree(&fixture) else {
            return;
        };

        let stats = analyze_directory(
            fixture.path(),
            &AnalyzeOptions::default(),
            &CategoryTable::builtin(),
        );
        let report = scan_directory(
            fixture.path(),
            &ScanOptions::default(),
            &CategoryTable::builtin(),
        );
        set_mode(&locked, 0o755);

        let stats = stats.payload().expect("analyze succeeded");
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.dir_count, 1);
        assert_eq!(stats.total_size, 5);

        let report = report.payload().expect("scan succeeded");
        assert_eq!(report.total_files, 1);
        assert_eq!(report.total_dirs, 1);
        assert!(report.entries().all(|e| e.name() != "inner.txt"));
    }

    #[test]
    fn test_build_tree_keeps_unreadable_directory_empty() {
        let fixture = TestFixture::new();
        let Some(locked) = broken_tree(&fixture) else {
            return;
        };

        let tree = build_tree(fixture.path(), &TreeOptions::default());
        set_mode(&locked, 0o755);

        let node = tree.child("locked").expect("locked directory listed");
        assert!(node.is_dir());
        assert_eq!(node.children().count(), 0);
        assert!(tree.child("a.txt").is_some());
    }

    #[test]
    fn test_organize_continues_past_unmovable_file() {
        let fixture = TestFixture::new();
        fixture.create_text_file("src/ok.txt", "ok");
        fixture.create_text_file("src/stuck/stuck.txt", "stuck");
        let stuck = fixture.path().join("src/stuck");
        set_mode(&stuck, 0o555);
        if File::create(stuck.join(".write_check")).is_ok() {
            set_mode(&stuck, 0o755);
            return;
        }

        let result = organize_files(
            &fixture.path().join("src"),
            &fixture.path().join("dest"),
            &OrganizeOptions::default(),
            &scenario_table(),
        );
        set_mode(&stuck, 0o755);

        let counts = result.payload().expect("organize succeeded");
        assert_eq!(counts.get("Documents"), Some(&1));
        fixture.assert_file_exists("dest/Documents/ok.txt");
        fixture.assert_file_exists("src/stuck/stuck.txt");
        fixture.assert_file_not_exists("dest/Documents/stuck.txt");
    }
}
