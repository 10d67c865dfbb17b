//! Single-target file operations: move, copy, rename, delete and hashing.
//!
//! Every public function here returns an [`OperationResult`] alias so the
//! CLI can report a failure without unwinding.
//!
//! [`OperationResult`]: crate::error::OperationResult

use serde::Serialize;
use sha2::Digest;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use crate::error::{HashResult, MfmError, PathResult, UnitResult, guarded};
use crate::inspect::validate_name;
use crate::organizer::{TransferMode, copy_preserving, transfer};

/// Read and write buffer size for streaming operations.
const CHUNK_SIZE: usize = 64 * 1024;

/// Supported content hash algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = MfmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == label)
            .ok_or_else(|| MfmError::Validation(format!("Unsupported hash algorithm: {s}")))
    }
}

/// Digest of one file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHash {
    pub algorithm: HashAlgorithm,
    /// Lowercase hexadecimal digest.
    pub hash_value: String,
    pub path: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf, MfmError> {
    std::path::absolute(path).map_err(|e| MfmError::from_io(path, e))
}

fn require_source(src: &Path) -> Result<fs::Metadata, MfmError> {
    fs::symlink_metadata(src).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            MfmError::NotFound(format!("Source file does not exist: {}", src.display()))
        }
        _ => MfmError::from_io(src, e),
    })
}

fn require_free(dst: &Path, overwrite: bool) -> Result<(), MfmError> {
    if !overwrite && fs::symlink_metadata(dst).is_ok() {
        return Err(MfmError::AlreadyExists(dst.to_path_buf()));
    }
    Ok(())
}

fn ensure_parent(dst: &Path) -> Result<(), MfmError> {
    match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| MfmError::from_io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Moves `src` to `dst`, returning the new absolute path.
///
/// Fails when the source is missing, or when `dst` exists and `overwrite`
/// is false. Missing parent directories of `dst` are created.
pub fn move_file(src: &Path, dst: &Path, overwrite: bool) -> PathResult {
    guarded("move", || {
        let src = absolute(src)?;
        let dst = absolute(dst)?;
        require_source(&src)?;
        require_free(&dst, overwrite)?;
        ensure_parent(&dst)?;

        transfer(&src, &dst, TransferMode::Move)?;
        log::info!("Moved {} to {}", src.display(), dst.display());
        Ok(dst)
    })
}

/// Copies the regular file `src` to `dst`, preserving permissions and
/// timestamps. Returns the new absolute path.
pub fn copy_file(src: &Path, dst: &Path, overwrite: bool) -> PathResult {
    guarded("copy", || {
        let src = absolute(src)?;
        let dst = absolute(dst)?;
        // Follows symlinks: copying a link copies its target's contents.
        require_source(&src)?;
        if !src.is_file() {
            return Err(MfmError::Validation(format!(
                "Source is not a file: {}",
                src.display()
            )));
        }
        require_free(&dst, overwrite)?;
        ensure_parent(&dst)?;

        copy_preserving(&src, &dst)?;
        log::info!("Copied {} to {}", src.display(), dst.display());
        Ok(dst)
    })
}

/// Renames `path` within its directory.
pub fn rename_file(path: &Path, new_name: &str) -> PathResult {
    guarded("rename", || {
        validate_name(new_name)?;
        let path = absolute(path)?;
        require_source(&path)?;

        let target = match path.parent() {
            Some(parent) => parent.join(new_name),
            None => {
                return Err(MfmError::Validation(format!(
                    "Cannot rename {}",
                    path.display()
                )));
            }
        };
        if target == path {
            return Ok(target);
        }
        require_free(&target, false)?;

        fs::rename(&path, &target).map_err(|e| MfmError::from_io(&path, e))?;
        log::info!("Renamed {} to {}", path.display(), target.display());
        Ok(target)
    })
}

/// Deletes a file, symlink or directory tree.
///
/// With `secure`, regular file contents are overwritten with zeros and synced
/// before unlinking. This is best-effort only: solid-state drives,
/// copy-on-write and journaling filesystems may keep the old blocks around.
pub fn delete_path(path: &Path, secure: bool) -> UnitResult {
    guarded("delete", || {
        let path = absolute(path)?;
        let metadata = fs::symlink_metadata(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                MfmError::NotFound(format!("Path does not exist: {}", path.display()))
            }
            _ => MfmError::from_io(&path, e),
        })?;

        if metadata.is_dir() {
            if secure {
                WalkDir::new(&path)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .for_each(|entry| zero_fill(entry.path()));
            }
            fs::remove_dir_all(&path).map_err(|e| MfmError::from_io(&path, e))?;
        } else {
            if secure && metadata.is_file() {
                zero_fill(&path);
            }
            fs::remove_file(&path).map_err(|e| MfmError::from_io(&path, e))?;
        }

        log::info!("Deleted {}", path.display());
        Ok(())
    })
}

/// Overwrites a file with zeros and syncs it. Failures are logged only.
fn zero_fill(path: &Path) {
    let result = File::options().write(true).open(path).and_then(|mut file| {
        let mut remaining = file.metadata()?.len();
        let zeros = vec![0u8; CHUNK_SIZE];
        while remaining > 0 {
            let chunk = remaining.min(CHUNK_SIZE as u64) as usize;
            file.write_all(&zeros[..chunk])?;
            remaining -= chunk as u64;
        }
        file.sync_all()
    });
    if let Err(err) = result {
        log::warn!("Could not overwrite {} before deletion: {}", path.display(), err);
    }
}

/// Feeds `reader` to `update` in fixed-size chunks.
fn stream(reader: &mut impl Read, mut update: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        update(&buffer[..bytes_read]);
    }
}

fn digest_hex<D: Digest>(reader: &mut impl Read) -> io::Result<String> {
    let mut hasher = D::new();
    stream(reader, |chunk| hasher.update(chunk))?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

/// Hashes the contents of the regular file at `path`.
pub fn hash_with(path: &Path, algorithm: HashAlgorithm) -> Result<FileHash, MfmError> {
    let path = absolute(path)?;
    let metadata = fs::metadata(&path).map_err(|e| MfmError::from_io(&path, e))?;
    if !metadata.is_file() {
        return Err(MfmError::Validation(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    let mut file = File::open(&path).map_err(|e| MfmError::from_io(&path, e))?;
    let hash_value = match algorithm {
        HashAlgorithm::Md5 => digest_hex::<md5::Md5>(&mut file),
        HashAlgorithm::Sha1 => digest_hex::<sha1::Sha1>(&mut file),
        HashAlgorithm::Sha256 => digest_hex::<sha2::Sha256>(&mut file),
        HashAlgorithm::Sha512 => digest_hex::<sha2::Sha512>(&mut file),
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            stream(&mut file, |chunk| {
                hasher.update(chunk);
            })
            .map(|()| hasher.finalize().to_hex().to_string())
        }
    }
    .map_err(|e| MfmError::from_io(&path, e))?;

    Ok(FileHash {
        algorithm,
        hash_value,
        path,
    })
}

/// Hashes `path` with the algorithm named `algorithm` (e.g. `"sha256"`).
pub fn hash_file(path: &Path, algorithm: &str) -> HashResult {
    guarded("hash", || hash_with(path, algorithm.parse()?))
}
