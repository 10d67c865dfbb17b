//! Extension-based categorization of files.
//!
//! A [`CategoryTable`] holds an ordered list of [`CategoryRule`]s. Resolving a
//! file name extracts its lowercase extension and returns the label of the
//! first rule (in priority order) listing it, or [`OTHER`] when none does.
//!
//! # Examples
//!
//! ```
//! use mfm::category::{CategoryRule, CategoryTable, OTHER};
//!
//! let table = CategoryTable::new(vec![
//!     CategoryRule::new("Documents", [".txt", ".pdf"], 1),
//!     CategoryRule::new("Images", ["jpg"], 2),
//! ]);
//! assert_eq!(table.resolve("notes.TXT"), "Documents");
//! assert_eq!(table.resolve("photo.jpg"), "Images");
//! assert_eq!(table.resolve("Makefile"), OTHER);
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Label for files no rule claims.
pub const OTHER: &str = "Other";

/// Category definitions shipped with the tool: (name, extensions, priority).
pub(crate) const BUILTIN_RULES: &[(&str, &[&str], i64)] = &[
    (
        "Coding_Projects",
        &[".py", ".js", ".java", ".cpp", ".h", ".html", ".css", ".php"],
        1,
    ),
    (
        "Documents",
        &[".pdf", ".doc", ".docx", ".txt", ".md", ".xlsx", ".csv"],
        2,
    ),
    (
        "Images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".raw"],
        3,
    ),
    ("Music", &[".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg"], 4),
    ("Videos", &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv"], 5),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"], 6),
    ("Applications", &[".app", ".exe", ".dmg", ".pkg"], 7),
    ("Development", &[".git", ".env", ".json", ".yaml", ".xml"], 8),
];

/// Normalizes an extension to the stored form: lowercase with a leading dot.
///
/// The empty string stays empty and stands for "no extension".
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.is_empty() || lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

/// Returns the index of the extension dot in a bare file name, if any.
///
/// A leading dot (`.bashrc`) or a trailing one (`file.`) does not start an
/// extension.
pub(crate) fn extension_dot(name: &str) -> Option<usize> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == name.len() => None,
        Some(idx) => Some(idx),
    }
}

/// Extracts the lowercase extension of a file name, including the dot.
///
/// Returns an empty string when the name has no extension. Only the final
/// path component is considered.
///
/// ```
/// use mfm::category::extension_of;
///
/// assert_eq!(extension_of("archive.tar.GZ"), ".gz");
/// assert_eq!(extension_of(".bashrc"), "");
/// assert_eq!(extension_of("README"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    extension_dot(name)
        .map(|idx| name[idx..].to_lowercase())
        .unwrap_or_default()
}

/// One category with the extensions it claims and its resolution priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRule {
    name: String,
    extensions: BTreeSet<String>,
    priority: i64,
}

impl CategoryRule {
    /// Creates a rule; extensions are normalized and deduplicated.
    pub fn new<I, S>(name: impl Into<String>, extensions: I, priority: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            priority,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Whether this rule claims the (already normalized) extension.
    pub fn claims(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }
}

/// Ordered rule table used to resolve categories.
///
/// Rules are kept sorted by ascending priority, ties broken by name, so the
/// result of [`resolve`](Self::resolve) does not depend on the order the
/// rules were supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut table = Self { rules };
        table.sort();
        table
    }

    /// The table matching the default configuration document.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(name, exts, priority)| CategoryRule::new(*name, exts.iter(), *priority))
                .collect(),
        )
    }

    /// Adds a rule, keeping the priority order.
    pub fn add_rule(&mut self, rule: CategoryRule) {
        self.rules.push(rule);
        self.sort();
    }

    fn sort(&mut self) {
        self.rules
            .sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            for ext in &rule.extensions {
                if !seen.insert(ext.as_str()) {
                    log::debug!(
                        "Extension '{}' is listed by several categories; '{}' loses to an earlier rule",
                        ext,
                        rule.name
                    );
                }
            }
        }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Category labels in resolution order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(CategoryRule::name)
    }

    /// Resolves a normalized extension (e.g. `".txt"`, or `""` for none).
    pub fn resolve_extension(&self, ext: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.claims(ext))
            .map(CategoryRule::name)
            .unwrap_or(OTHER)
    }

    /// Resolves the category of a file name. Total and side-effect free.
    pub fn resolve(&self, file_name: &str) -> &str {
        self.resolve_extension(&extension_of(file_name))
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CategoryTable {
        CategoryTable::new(vec![
            CategoryRule::new("Documents", [".txt"], 1),
            CategoryRule::new("Images", [".jpg"], 2),
            CategoryRule::new("Code", [".py"], 3),
        ])
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("TXT"), ".txt");
        assert_eq!(normalize_extension(".Md"), ".md");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_extension_of_edge_cases() {
        assert_eq!(extension_of("report.PDF"), ".pdf");
        assert_eq!(extension_of("a.b.c"), ".c");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of(".hidden"), "");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of("dir/file.rs"), ".rs");
    }

    #[test]
    fn test_resolve_listed_extension() {
        let table = sample_table();
        assert_eq!(table.resolve("doc.txt"), "Documents");
        assert_eq!(table.resolve("image.JPG"), "Images");
        assert_eq!(table.resolve("script.py"), "Code");
    }

    #[test]
    fn test_resolve_unlisted_is_other() {
        let table = sample_table();
        assert_eq!(table.resolve("movie.mkv"), OTHER);
        assert_eq!(table.resolve("Makefile"), OTHER);
    }

    #[test]
    fn test_empty_extension_rule() {
        let mut table = sample_table();
        table.add_rule(CategoryRule::new("Bare", [""], 10));
        assert_eq!(table.resolve("Makefile"), "Bare");
        assert_eq!(table.resolve("x.unknown"), OTHER);
    }

    #[test]
    fn test_priority_decides_shared_extension() {
        let table = CategoryTable::new(vec![
            CategoryRule::new("Later", [".json"], 8),
            CategoryRule::new("Earlier", [".json"], 2),
        ]);
        assert_eq!(table.resolve("data.json"), "Earlier");
        let names: Vec<_> = table.categories().collect();
        assert_eq!(names, vec!["Earlier", "Later"]);
    }

    #[test]
    fn test_priority_ties_break_by_name() {
        let a = CategoryTable::new(vec![
            CategoryRule::new("Zeta", [".x"], 1),
            CategoryRule::new("Alpha", [".x"], 1),
        ]);
        let b = CategoryTable::new(vec![
            CategoryRule::new("Alpha", [".x"], 1),
            CategoryRule::new("Zeta", [".x"], 1),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.resolve("f.x"), "Alpha");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let table = CategoryTable::builtin();
        for name in ["a.py", "b.PNG", "c", ".env", "d.tar.gz", "e.unknown"] {
            assert_eq!(table.resolve(name), table.resolve(name));
        }
    }

    #[test]
    fn test_builtin_table() {
        let table = CategoryTable::builtin();
        assert_eq!(table.resolve("main.py"), "Coding_Projects");
        assert_eq!(table.resolve("notes.md"), "Documents");
        assert_eq!(table.resolve("song.flac"), "Music");
        assert_eq!(table.resolve("backup.bz2"), "Archives");
        assert_eq!(table.categories().count(), BUILTIN_RULES.len());
    }
}
