//! Entry filtering shared by the traversals.
//!
//! Three rules are applied, in this order:
//! 1. Hidden entries (name starting with `.`) are rejected unless enabled
//! 2. Entries matching any exclude pattern are rejected
//! 3. If include patterns exist, the entry must match one of them
//!
//! Patterns are glob patterns matched against the entry's own name. A
//! pattern containing `/` is matched against the entry path relative to the
//! traversal root instead, so `"logs"` never excludes `"my_logs"`.

use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::error::MfmError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled glob pattern together with what it is matched against.
#[derive(Debug, Clone)]
struct EntryPattern {
    pattern: Pattern,
    against_path: bool,
}

impl EntryPattern {
    fn compile(raw: &str) -> Result<Self, MfmError> {
        let pattern = Pattern::new(raw).map_err(|e| {
            MfmError::Validation(format!("Invalid glob pattern '{raw}': {}", e.msg))
        })?;
        Ok(Self {
            pattern,
            against_path: raw.contains('/'),
        })
    }

    fn matches(&self, relative: &Path) -> bool {
        if self.against_path {
            return self.pattern.matches_path_with(relative, MATCH_OPTIONS);
        }
        relative
            .file_name()
            .map(|name| self.pattern.matches_with(&name.to_string_lossy(), MATCH_OPTIONS))
            .unwrap_or(false)
    }
}

/// Compiled hidden/include/exclude rules.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include_hidden: bool,
    exclude: Vec<EntryPattern>,
    include: Vec<EntryPattern>,
}

impl EntryFilter {
    /// Compiles the patterns, failing on the first invalid one.
    pub fn new<S: AsRef<str>>(
        include_hidden: bool,
        exclude_patterns: &[S],
        include_patterns: &[S],
    ) -> Result<Self, MfmError> {
        let compile = |patterns: &[S]| {
            patterns
                .iter()
                .map(|p| EntryPattern::compile(p.as_ref()))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            include_hidden,
            exclude: compile(exclude_patterns)?,
            include: compile(include_patterns)?,
        })
    }

    /// A filter that keeps every entry, hidden ones included.
    pub fn allow_all() -> Self {
        Self {
            include_hidden: true,
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }

    /// Whether an entry name marks a hidden entry.
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }

    pub fn is_included(&self, relative: &Path) -> bool {
        self.include.is_empty() || self.include.iter().any(|p| p.matches(relative))
    }

    /// Decides whether the entry at `relative` (relative to the traversal
    /// root) is kept.
    pub fn accepts(&self, relative: &Path) -> bool {
        let hidden = relative
            .file_name()
            .is_some_and(|name| Self::is_hidden(&name.to_string_lossy()));
        if hidden && !self.include_hidden {
            return false;
        }
        if self.is_excluded(relative) {
            return false;
        }
        self.is_included(relative)
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_hidden_entries_rejected_by_default() {
        let filter = EntryFilter::new(false, NONE, NONE).unwrap();
        assert!(!filter.accepts(Path::new(".DS_Store")));
        assert!(!filter.accepts(Path::new("sub/.git")));
        assert!(filter.accepts(Path::new("visible.txt")));
    }

    #[test]
    fn test_hidden_entries_kept_when_enabled() {
        let filter = EntryFilter::new(true, NONE, NONE).unwrap();
        assert!(filter.accepts(Path::new(".DS_Store")));
    }

    #[test]
    fn test_exclude_matches_name_not_substring() {
        let filter = EntryFilter::new(true, &["logs", "*.tmp"], NONE).unwrap();
        assert!(!filter.accepts(Path::new("logs")));
        assert!(!filter.accepts(Path::new("app/logs")));
        assert!(!filter.accepts(Path::new("cache.tmp")));
        assert!(filter.accepts(Path::new("my_logs")));
        assert!(filter.accepts(Path::new("logs.txt")));
    }

    #[test]
    fn test_exclude_beats_include() {
        let filter = EntryFilter::new(true, &["secret.txt"], &["*.txt"]).unwrap();
        assert!(!filter.accepts(Path::new("secret.txt")));
        assert!(filter.accepts(Path::new("notes.txt")));
        assert!(!filter.accepts(Path::new("image.jpg")));
    }

    #[test]
    fn test_path_patterns_match_relative_path() {
        let filter = EntryFilter::new(true, &["build/*.o"], NONE).unwrap();
        assert!(!filter.accepts(Path::new("build/main.o")));
        assert!(filter.accepts(Path::new("src/main.o")));
        assert!(filter.accepts(Path::new("build/nested/main.o")));
    }

    #[test]
    fn test_character_class_and_wildcard() {
        let filter = EntryFilter::new(true, &["[0-9]*.tmp", "file?.txt"], NONE).unwrap();
        assert!(!filter.accepts(Path::new("1cache.tmp")));
        assert!(filter.accepts(Path::new("cache.tmp")));
        assert!(!filter.accepts(Path::new("file1.txt")));
        assert!(filter.accepts(Path::new("file12.txt")));
    }

    #[test]
    fn test_invalid_glob_is_validation_error() {
        let err = EntryFilter::new(true, &["[invalid"], NONE).unwrap_err();
        assert!(err.is_validation());
    }
}
