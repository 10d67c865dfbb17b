//! Walk plumbing shared by the analyzer, scanner and organizer.

use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::MfmError;
use crate::filter::EntryFilter;

/// Makes `path` absolute and folds `.` and `..` segments lexically.
pub(crate) fn absolute_clean(path: &Path) -> Result<PathBuf, MfmError> {
    let absolute = std::path::absolute(path).map_err(|e| MfmError::from_io(path, e))?;
    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    Ok(clean)
}

/// Makes `root` absolute and checks that it is an existing directory.
pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf, MfmError> {
    let absolute = absolute_clean(root)?;
    match fs::metadata(&absolute) {
        Ok(metadata) if metadata.is_dir() => Ok(absolute),
        Ok(_) => Err(MfmError::NotFound(format!(
            "Directory not found: {} is not a directory",
            absolute.display()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MfmError::NotFound(format!(
            "Directory not found: {}",
            absolute.display()
        ))),
        Err(e) => Err(MfmError::from_io(&absolute, e)),
    }
}

/// Iterates the descendants of `root` (never `root` itself) in name order.
///
/// Entries rejected by `filter` are skipped together with their subtree.
/// `max_depth` counts levels below `root`: its children are level 1.
/// Symbolic links are not followed.
pub(crate) fn walk<'a>(
    root: &'a Path,
    max_depth: Option<usize>,
    filter: &'a EntryFilter,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
    walk_pruned(root, max_depth, filter, &[])
}

/// Like [`walk`], additionally skipping the subtrees rooted at `pruned`.
pub(crate) fn walk_pruned<'a>(
    root: &'a Path,
    max_depth: Option<usize>,
    filter: &'a EntryFilter,
    pruned: &'a [PathBuf],
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    walker.into_iter().filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        if pruned.iter().any(|p| entry.path() == p) {
            return false;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        filter.accepts(relative)
    })
}

/// Logs a walk error and drops it.
pub(crate) fn skip_walk_error(result: walkdir::Result<DirEntry>) -> Option<DirEntry> {
    match result {
        Ok(entry) => Some(entry),
        Err(err) => {
            let path = err
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            log::warn!("Skipping {path}: {err}");
            None
        }
    }
}
