//! Error kinds and the structured result returned by every public operation.
//!
//! Bulk traversals swallow per-entry failures (they are logged and skipped),
//! but a failure on the root argument of a bulk operation, or on a
//! single-target operation, comes back to the caller as
//! [`OperationResult::Failure`] so it can be rendered without unwinding.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::DirectoryStatistics;
use crate::file_ops::FileHash;
use crate::inspect::FileDescriptor;
use crate::organizer::CategoryCounts;
use crate::scanner::ScanReport;

/// Errors produced by the core operations.
#[derive(Debug, Error)]
pub enum MfmError {
    /// A path that must exist was absent at call time.
    #[error("{0}")]
    NotFound(String),

    /// Malformed name, path or parameter.
    #[error("{0}")]
    Validation(String),

    /// The destination is taken and overwriting was not requested.
    #[error("Destination file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Any other filesystem failure (permission denied, busy, ...).
    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MfmError {
    /// Converts an I/O error for `path`, mapping `NotFound` to the dedicated kind.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(format!("File not found: {}", path.display()))
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Outcome of a side-effecting or fallible operation.
///
/// Exactly one of payload and error is present: `success()` is true iff
/// `error_message()` is `None`.
#[derive(Debug)]
#[must_use]
pub enum OperationResult<T> {
    Success(T),
    Failure(MfmError),
}

impl<T> OperationResult<T> {
    pub fn success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Human-readable error text, present only on failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err.to_string()),
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&MfmError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T, MfmError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            Self::Success(value) => OperationResult::Success(f(value)),
            Self::Failure(err) => OperationResult::Failure(err),
        }
    }
}

impl<T> From<Result<T, MfmError>> for OperationResult<T> {
    fn from(result: Result<T, MfmError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err),
        }
    }
}

/// Runs a fallible operation and turns its error into a logged `Failure`.
///
/// Every public entry point of the core goes through this helper, so callers
/// never have to handle a propagating error for expected failure modes.
pub fn guarded<T>(
    operation: &str,
    run: impl FnOnce() -> Result<T, MfmError>,
) -> OperationResult<T> {
    match run() {
        Ok(value) => OperationResult::Success(value),
        Err(err) => {
            log::warn!("{operation} failed: {err}");
            OperationResult::Failure(err)
        }
    }
}

pub type InspectResult = OperationResult<FileDescriptor>;
pub type AnalyzeResult = OperationResult<DirectoryStatistics>;
pub type ScanResult = OperationResult<ScanReport>;
pub type OrganizeResult = OperationResult<CategoryCounts>;
pub type FoldersResult = OperationResult<BTreeMap<String, PathBuf>>;
pub type PathResult = OperationResult<PathBuf>;
pub type HashResult = OperationResult<FileHash>;
pub type UnitResult = OperationResult<()>;
