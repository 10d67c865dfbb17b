/// File organization into category folders under a master folder root.
///
/// This module provides:
/// - Creation of the master folder tree (one subfolder per category)
/// - Recursive organization of a source tree with move or copy semantics
/// - Collision-safe destination naming (`"name (copy N).ext"`)
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::category::{CategoryTable, OTHER, extension_dot};
use crate::error::{FoldersResult, MfmError, OrganizeResult, guarded};
use crate::filter::EntryFilter;
use crate::traverse::{absolute_clean, resolve_root, skip_walk_error, walk_pruned};

/// Matches a trailing `" (copy)"` or `" (copy N)"` marker on a file stem.
static COPY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(copy(?: \d+)?\)$").expect("copy marker pattern is valid"));

/// Files successfully placed, per category.
pub type CategoryCounts = BTreeMap<String, usize>;

/// How a file reaches its destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Rename, falling back to copy-then-remove across devices.
    #[default]
    Move,
    /// Copy, leaving the source in place.
    Copy,
}

/// Options for [`organize`].
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub transfer: TransferMode,
    /// Also organize files whose name starts with `.`.
    pub include_hidden: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            transfer: TransferMode::Move,
            include_hidden: true,
        }
    }
}

/// Record of one file placed by the organizer.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The path of the file before organization.
    pub original_path: PathBuf,
    /// The path the file now lives at.
    pub new_path: PathBuf,
    /// The category folder it was placed in.
    pub category: String,
}

/// Places files into category directories.
///
/// This struct is stateless and provides methods as associated functions.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Transfers `file_path` into `category_dir`, choosing a free name.
    ///
    /// The category directory is created when missing. Never overwrites: when
    /// the file name is taken a `" (copy N)"` suffix is added.
    pub fn place(
        file_path: &Path,
        category_dir: &Path,
        category: &str,
        mode: TransferMode,
    ) -> Result<Placement, MfmError> {
        if !category_dir.is_dir() {
            fs::create_dir_all(category_dir).map_err(|e| MfmError::from_io(category_dir, e))?;
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                MfmError::Validation(format!(
                    "File has no name component: {}",
                    file_path.display()
                ))
            })?;

        let destination = unique_destination(category_dir, &file_name);
        transfer(file_path, &destination, mode)?;

        Ok(Placement {
            original_path: file_path.to_path_buf(),
            new_path: destination,
            category: category.to_string(),
        })
    }
}

/// Removes one trailing copy marker from a file stem.
///
/// ```
/// use mfm::organizer::strip_copy_marker;
///
/// assert_eq!(strip_copy_marker("report (copy 2)"), "report");
/// assert_eq!(strip_copy_marker("report (copy)"), "report");
/// assert_eq!(strip_copy_marker("report (draft)"), "report (draft)");
/// ```
pub fn strip_copy_marker(stem: &str) -> &str {
    match COPY_MARKER.find(stem) {
        Some(marker) => &stem[..marker.start()],
        None => stem,
    }
}

/// First free path in `dir` for a file called `file_name`.
///
/// Tries the name itself, then `"<stem> (copy N)<ext>"` for N = 1, 2, ...
/// with any existing marker stripped from the stem first, so repeated runs
/// produce `(copy 2)` rather than `(copy 1) (copy 1)`.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !exists(&candidate) {
        return candidate;
    }

    let (stem, ext) = match extension_dot(file_name) {
        Some(idx) => file_name.split_at(idx),
        None => (file_name, ""),
    };
    let stem = strip_copy_marker(stem);

    let mut counter = 1u64;
    loop {
        let candidate = dir.join(format!("{stem} (copy {counter}){ext}"));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Existence check that also sees dangling symlinks.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Moves or copies `src` to `dst`.
pub(crate) fn transfer(src: &Path, dst: &Path, mode: TransferMode) -> Result<(), MfmError> {
    match mode {
        TransferMode::Copy => copy_preserving(src, dst),
        TransferMode::Move => match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                log::debug!(
                    "{} and {} are on different devices, copying instead",
                    src.display(),
                    dst.display()
                );
                copy_preserving(src, dst)?;
                fs::remove_file(src).map_err(|e| MfmError::from_io(src, e))
            }
            Err(e) => Err(MfmError::from_io(src, e)),
        },
    }
}

/// Copies file contents and permissions, then carries over the access and
/// modification times.
pub(crate) fn copy_preserving(src: &Path, dst: &Path) -> Result<(), MfmError> {
    let metadata = fs::metadata(src).map_err(|e| MfmError::from_io(src, e))?;
    fs::copy(src, dst).map_err(|e| MfmError::from_io(src, e))?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    let result = File::options()
        .write(true)
        .open(dst)
        .and_then(|file| file.set_times(times));
    if let Err(err) = result {
        log::warn!("Could not preserve timestamps on {}: {}", dst.display(), err);
    }
    Ok(())
}

/// Creates `root` and one subfolder per category plus [`OTHER`].
///
/// Idempotent: existing folders are left alone.
pub fn ensure_master_folders(
    root: &Path,
    table: &CategoryTable,
) -> Result<BTreeMap<String, PathBuf>, MfmError> {
    let root = absolute_clean(root)?;
    fs::create_dir_all(&root).map_err(|e| MfmError::from_io(&root, e))?;

    let mut folders = BTreeMap::new();
    for category in table.categories().chain(std::iter::once(OTHER)) {
        let folder = root.join(category);
        fs::create_dir_all(&folder).map_err(|e| MfmError::from_io(&folder, e))?;
        folders.insert(category.to_string(), folder);
    }

    log::info!("Master folders ready under {}", root.display());
    Ok(folders)
}

/// Public entry point for [`ensure_master_folders`].
pub fn create_master_folders(root: &Path, table: &CategoryTable) -> FoldersResult {
    guarded("create master folders", || ensure_master_folders(root, table))
}

/// Organizes every regular file under `source_dir` into
/// `dest_root/<category>/`.
///
/// Category folders are created up front. Files already inside those folders
/// (or anywhere under `dest_root` when it differs from `source_dir`) are left
/// alone, so organizing a directory in place works. A file that already sits
/// in its category folder is not touched. Per-file failures are logged and
/// skipped; the counts only cover files that were placed.
pub fn organize(
    source_dir: &Path,
    dest_root: &Path,
    options: &OrganizeOptions,
    table: &CategoryTable,
) -> Result<CategoryCounts, MfmError> {
    let source = resolve_root(source_dir)?;
    let folders = ensure_master_folders(dest_root, table)?;
    let dest_root = absolute_clean(dest_root)?;

    let mut pruned: Vec<PathBuf> = folders.values().cloned().collect();
    if dest_root != source {
        pruned.push(dest_root.clone());
    }

    let filter = EntryFilter::new::<&str>(options.include_hidden, &[], &[])?;
    let files: Vec<PathBuf> = walk_pruned(&source, None, &filter, &pruned)
        .filter_map(skip_walk_error)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    let mut counts = CategoryCounts::new();
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = table.resolve(&name);
        let category_dir = folders
            .get(category)
            .cloned()
            .unwrap_or_else(|| dest_root.join(category));
        if file.parent() == Some(category_dir.as_path()) {
            log::debug!("{} is already in place", file.display());
            continue;
        }

        match FileOrganizer::place(&file, &category_dir, category, options.transfer) {
            Ok(placement) => {
                log::debug!(
                    "{} -> {}",
                    placement.original_path.display(),
                    placement.new_path.display()
                );
                *counts.entry(placement.category).or_insert(0) += 1;
            }
            Err(err) => log::warn!("Error organizing {}: {}", file.display(), err),
        }
    }

    Ok(counts)
}

/// Public entry point for [`organize`].
pub fn organize_files(
    source_dir: &Path,
    dest_root: &Path,
    options: &OrganizeOptions,
    table: &CategoryTable,
) -> OrganizeResult {
    guarded("organize", || organize(source_dir, dest_root, options, table))
}
