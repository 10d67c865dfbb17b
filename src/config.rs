//! Persistent user settings.
//!
//! Settings live in a JSON document, by default `~/.mfm_config.json`
//! (overridden by `--config` or the `MFM_CONFIG` environment variable):
//!
//! ```json
//! {
//!   "master_folder_root": "~/Documents/Master Folders",
//!   "quick_access_volumes": ["/Volumes/Drive1", "/Volumes/Drive2"],
//!   "categories": {
//!     "Documents": { "extensions": [".pdf", ".txt"], "priority": 2 }
//!   },
//!   "recent_paths": [],
//!   "favorites": [],
//!   "excluded_patterns": [".git", "node_modules"]
//! }
//! ```
//!
//! Loading is forgiving:
//! - A missing file is created with the defaults
//! - An unparseable or invalid file is reported and the defaults are used,
//!   leaving the file untouched
//! - Missing fields take their default values

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::category::{BUILTIN_RULES, CategoryRule, CategoryTable, normalize_extension};

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "MFM_CONFIG";

/// File name of the settings document in the home directory.
pub const CONFIG_FILE_NAME: &str = ".mfm_config.json";

/// Most recent paths kept in [`Settings::recent_paths`].
pub const MAX_RECENT_PATHS: usize = 10;

const MAX_CATEGORY_NAME_LEN: usize = 50;

static EXTENSION_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.[a-z0-9]+$").expect("extension pattern is valid"));

/// Errors that can occur while loading, validating or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory to place the default settings file in.
    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    /// The settings document is not valid JSON for [`Settings`].
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A category definition breaks the naming or extension rules.
    #[error("Invalid category '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },

    /// An excluded pattern is not a valid glob.
    #[error("Invalid glob pattern '{0}'")]
    InvalidPattern(String),

    /// IO error while reading or writing the settings file.
    #[error("IO error on configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One category of the settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub priority: i64,
}

/// The settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the master folder tree; a leading `~` means the home directory.
    pub master_folder_root: PathBuf,
    pub quick_access_volumes: Vec<PathBuf>,
    pub categories: BTreeMap<String, CategorySpec>,
    /// Most recent first, without duplicates.
    pub recent_paths: Vec<PathBuf>,
    pub favorites: Vec<PathBuf>,
    /// Glob patterns skipped by the analyze, scan and tree commands.
    pub excluded_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_folder_root: PathBuf::from("~/Documents/Master Folders"),
            quick_access_volumes: vec![
                PathBuf::from("/Volumes/Drive1"),
                PathBuf::from("/Volumes/Drive2"),
            ],
            categories: BUILTIN_RULES
                .iter()
                .map(|(name, extensions, priority)| {
                    (
                        name.to_string(),
                        CategorySpec {
                            extensions: extensions.iter().map(|e| e.to_string()).collect(),
                            priority: *priority,
                        },
                    )
                })
                .collect(),
            recent_paths: Vec::new(),
            favorites: Vec::new(),
            excluded_patterns: [".git", "__pycache__", "node_modules", ".DS_Store", ".Trash"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Where loaded [`Settings`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    /// Read from an existing, valid file.
    File,
    /// The file was missing and the defaults were written to it.
    Created,
    /// The file was invalid; defaults are in use and the file is untouched.
    Defaults,
}

impl SettingsSource {
    /// Whether saving back to the file is safe.
    pub fn is_writable(self) -> bool {
        self != SettingsSource::Defaults
    }
}

impl Settings {
    /// Location of the settings file when none is given explicitly.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Loads settings from `path`, or from [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// Returns an error only when the file exists but cannot be read, or when
    /// a missing file cannot be created.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        Self::load_from(&path).map(|(settings, _)| settings)
    }

    /// Loads settings from `path` and reports where they came from.
    ///
    /// A file that cannot be parsed or validated is left as it is and
    /// [`SettingsSource::Defaults`] is returned; callers must not save over it.
    pub fn load_from(path: &Path) -> Result<(Self, SettingsSource), ConfigError> {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path)?;
            log::info!("Created default configuration at {}", path.display());
            return Ok((settings, SettingsSource::Created));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match Self::parse(&content) {
            Ok(settings) => Ok((settings, SettingsSource::File)),
            Err(err) => {
                log::warn!(
                    "Ignoring configuration {} ({}); using defaults",
                    path.display(),
                    err
                );
                Ok((Self::default(), SettingsSource::Defaults))
            }
        }
    }

    /// Parses and validates a settings document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes the settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(io_error)?;
        log::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Checks category names, extension formats and excluded patterns.
    ///
    /// Extensions are checked after normalization, so `"PDF"` is accepted as
    /// `".pdf"`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, spec) in &self.categories {
            let invalid = |reason: String| ConfigError::InvalidCategory {
                name: name.clone(),
                reason,
            };

            let length = name.chars().count();
            if length == 0 || length > MAX_CATEGORY_NAME_LEN {
                return Err(invalid(format!(
                    "name must be 1 to {MAX_CATEGORY_NAME_LEN} characters"
                )));
            }
            if let Some(ext) = spec
                .extensions
                .iter()
                .find(|ext| !EXTENSION_FORMAT.is_match(&normalize_extension(ext)))
            {
                return Err(invalid(format!("invalid extension '{ext}'")));
            }
        }

        if let Some(pattern) = self
            .excluded_patterns
            .iter()
            .find(|p| glob::Pattern::new(p).is_err())
        {
            return Err(ConfigError::InvalidPattern(pattern.clone()));
        }
        Ok(())
    }

    /// Builds the category table described by these settings.
    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(
            self.categories
                .iter()
                .map(|(name, spec)| CategoryRule::new(name.as_str(), &spec.extensions, spec.priority))
                .collect(),
        )
    }

    /// The master folder root with a leading `~` expanded.
    pub fn master_folder(&self) -> PathBuf {
        expand_home(&self.master_folder_root)
    }

    /// Records `path` as the most recently used one.
    pub fn add_recent_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.recent_paths.retain(|p| p != &path);
        self.recent_paths.insert(0, path);
        self.recent_paths.truncate(MAX_RECENT_PATHS);
    }

    /// Adds a favorite; returns false if it was already present.
    pub fn add_favorite(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.favorites.contains(&path) {
            return false;
        }
        self.favorites.push(path);
        true
    }

    /// Removes a favorite; returns false if it was not present.
    pub fn remove_favorite(&mut self, path: &Path) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|p| p != path);
        self.favorites.len() != before
    }
}

/// Expands a leading `~` component to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
