//! Mounted volume enumeration and disk usage.
//!
//! Linux reads `/proc/self/mounts`; macOS lists `/` plus the entries under
//! `/Volumes`. Usage figures come from `statvfs`. Other platforms report no
//! volumes.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{MfmError, OperationResult, guarded};

/// Capacity figures for one filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VolumeUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Used share of the space available to unprivileged users, 0 to 100.
    pub percent: f64,
}

impl VolumeUsage {
    fn from_blocks(fragment: u64, blocks: u64, blocks_free: u64, blocks_avail: u64) -> Self {
        let total = blocks.saturating_mul(fragment);
        let used = blocks.saturating_sub(blocks_free).saturating_mul(fragment);
        let free = blocks_avail.saturating_mul(fragment);
        let usable = used + free;
        let percent = if usable == 0 {
            0.0
        } else {
            ((used as f64 / usable as f64) * 1000.0).round() / 10.0
        };
        Self {
            total,
            used,
            free,
            percent,
        }
    }
}

/// One mounted volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeInfo {
    pub device: String,
    pub mount_point: PathBuf,
    pub fstype: String,
    pub options: String,
    #[serde(flatten)]
    pub usage: VolumeUsage,
}

/// A line of a mount table, before usage is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: PathBuf,
    pub fstype: String,
    pub options: String,
}

/// Decodes the octal escapes (`\040` for a space) used in mount tables.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses a `/proc/mounts`-style table, keeping block-device mounts only.
///
/// Pseudo filesystems (`proc`, `sysfs`, `tmpfs`, ...) have no device path and
/// are left out.
pub fn parse_mounts(table: &str) -> Vec<MountEntry> {
    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = unescape_mount_field(fields.next()?);
            let mount_point = PathBuf::from(unescape_mount_field(fields.next()?));
            let fstype = fields.next()?.to_string();
            let options = fields.next().unwrap_or_default().to_string();
            device.starts_with('/').then_some(MountEntry {
                device,
                mount_point,
                fstype,
                options,
            })
        })
        .collect()
}

/// Usage of the filesystem containing `path`.
#[cfg(unix)]
pub fn volume_usage(path: &Path) -> Result<VolumeUsage, MfmError> {
    let stat = rustix::fs::statvfs(path)
        .map_err(|errno| MfmError::from_io(path, std::io::Error::from(errno)))?;
    let fragment = if stat.f_frsize > 0 {
        stat.f_frsize
    } else {
        stat.f_bsize
    };
    Ok(VolumeUsage::from_blocks(
        fragment,
        stat.f_blocks,
        stat.f_bfree,
        stat.f_bavail,
    ))
}

#[cfg(not(unix))]
pub fn volume_usage(path: &Path) -> Result<VolumeUsage, MfmError> {
    Err(MfmError::Validation(format!(
        "Disk usage is not supported on this platform: {}",
        path.display()
    )))
}

/// Public entry point for [`volume_usage`].
pub fn volume_info(path: &Path) -> OperationResult<VolumeUsage> {
    guarded("volume info", || volume_usage(path))
}

#[cfg(target_os = "linux")]
fn mount_table() -> Result<Vec<MountEntry>, MfmError> {
    let path = Path::new("/proc/self/mounts");
    let table = std::fs::read_to_string(path).map_err(|e| MfmError::from_io(path, e))?;
    Ok(parse_mounts(&table))
}

#[cfg(target_os = "macos")]
fn mount_table() -> Result<Vec<MountEntry>, MfmError> {
    use std::ffi::CStr;

    let volumes = Path::new("/Volumes");
    let mut mounts = vec![PathBuf::from("/")];
    match std::fs::read_dir(volumes) {
        Ok(entries) => mounts.extend(entries.filter_map(Result::ok).map(|e| e.path())),
        Err(err) => log::warn!("Could not list {}: {}", volumes.display(), err),
    }

    Ok(mounts
        .into_iter()
        .map(|mount_point| {
            let (device, fstype) = match rustix::fs::statfs(&mount_point) {
                Ok(stat) => (
                    unsafe { CStr::from_ptr(stat.f_mntfromname.as_ptr()) }
                        .to_string_lossy()
                        .into_owned(),
                    unsafe { CStr::from_ptr(stat.f_fstypename.as_ptr()) }
                        .to_string_lossy()
                        .into_owned(),
                ),
                Err(_) => (String::new(), String::new()),
            };
            MountEntry {
                device,
                mount_point,
                fstype,
                options: String::new(),
            }
        })
        .collect())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn mount_table() -> Result<Vec<MountEntry>, MfmError> {
    Ok(Vec::new())
}

/// Every mounted volume whose usage can be read.
pub fn mounted_volumes() -> Result<Vec<VolumeInfo>, MfmError> {
    let volumes = mount_table()?
        .into_iter()
        .filter_map(|mount| match volume_usage(&mount.mount_point) {
            Ok(usage) => Some(VolumeInfo {
                device: mount.device,
                mount_point: mount.mount_point,
                fstype: mount.fstype,
                options: mount.options,
                usage,
            }),
            Err(err) => {
                log::warn!(
                    "Skipping volume {}: {}",
                    mount.mount_point.display(),
                    err
                );
                None
            }
        })
        .collect();
    Ok(volumes)
}

/// Public entry point for [`mounted_volumes`].
pub fn list_volumes() -> OperationResult<Vec<VolumeInfo>> {
    guarded("list volumes", mounted_volumes)
}

/// Whether `path` is the root of a mounted filesystem.
#[cfg(unix)]
pub fn is_mount_point(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return false;
    };
    if !metadata.is_dir() {
        return false;
    }
    let parent = path.join("..");
    let Ok(parent_metadata) = std::fs::metadata(&parent) else {
        return false;
    };
    metadata.dev() != parent_metadata.dev() || metadata.ino() == parent_metadata.ino()
}

#[cfg(not(unix))]
pub fn is_mount_point(path: &Path) -> bool {
    path.parent().is_none() && path.exists()
}

/// Configured quick-access volumes that are currently mounted.
pub fn available_volumes(settings: &Settings) -> Vec<PathBuf> {
    settings
        .quick_access_volumes
        .iter()
        .filter(|volume| volume.exists() && is_mount_point(volume))
        .cloned()
        .collect()
}
