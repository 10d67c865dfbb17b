//! Single-entry inspection: filesystem metadata turned into a validated,
//! immutable [`FileDescriptor`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::category::CategoryTable;
use crate::error::{InspectResult, MfmError, guarded};

/// Characters a file name may not contain.
const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Snapshot of one filesystem entry.
///
/// Built fresh on every [`inspect`] call and never cached: the filesystem
/// stays the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    name: String,
    path: PathBuf,
    size: u64,
    modified: DateTime<Utc>,
    is_dir: bool,
    is_file: bool,
    category: Option<String>,
}

impl FileDescriptor {
    /// Builds a descriptor, validating the name and path.
    ///
    /// The path is normalized lexically (`.` components dropped) and must be
    /// absolute without `..` segments. A category is only kept for regular
    /// files.
    pub fn new(
        name: impl Into<String>,
        path: &Path,
        size: u64,
        modified: DateTime<Utc>,
        is_dir: bool,
        is_file: bool,
        category: Option<String>,
    ) -> Result<Self, MfmError> {
        let name = name.into();
        validate_name(&name)?;
        let path = normalize_path(path)?;

        Ok(Self {
            name,
            path,
            size,
            modified,
            is_dir,
            is_file,
            category: if is_file { category } else { None },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Checks a bare file name against the descriptor rules.
pub fn validate_name(name: &str) -> Result<(), MfmError> {
    if name.is_empty() || name.trim() != name {
        return Err(MfmError::Validation(
            "Invalid filename: must not be empty or contain leading/trailing whitespace"
                .to_string(),
        ));
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(MfmError::Validation(
            "Filename contains path separators".to_string(),
        ));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(MfmError::Validation(
            "Filename contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Lexically normalizes `path`, rejecting `..` segments and relative paths.
pub fn normalize_path(path: &Path) -> Result<PathBuf, MfmError> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(MfmError::Validation(
                    "Path contains invalid parent directory references".to_string(),
                ));
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    if !normalized.is_absolute() {
        return Err(MfmError::Validation(format!(
            "Path must be absolute: {}",
            path.display()
        )));
    }
    Ok(normalized)
}

/// Reads the metadata of `path` and builds its descriptor.
///
/// Symbolic links are followed. Fails with [`MfmError::NotFound`] when the
/// entry does not exist and [`MfmError::Validation`] when its name or path
/// breaks the descriptor rules.
pub fn inspect(path: &Path, table: &CategoryTable) -> Result<FileDescriptor, MfmError> {
    let metadata = fs::metadata(path).map_err(|e| MfmError::from_io(path, e))?;
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| MfmError::from_io(path, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let category = metadata
        .is_file()
        .then(|| table.resolve(&name).to_string());

    FileDescriptor::new(
        name,
        path,
        metadata.len(),
        modified,
        metadata.is_dir(),
        metadata.is_file(),
        category,
    )
}

/// Public entry point for [`inspect`].
pub fn inspect_path(path: &Path, table: &CategoryTable) -> InspectResult {
    guarded("inspect", || inspect(path, table))
}
