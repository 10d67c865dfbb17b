//! Command-line interface module for mfm.
//!
//! This module handles all CLI-related functionality including:
//! - Subcommand parsing (clap derive)
//! - Loading the settings document and recording recent paths
//! - Calling into the core with plain parameters
//! - Rendering the results through [`OutputFormatter`]

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::analyzer::{AnalyzeOptions, analyze_directory};
use crate::category::CategoryTable;
use crate::config::{Settings, SettingsSource};
use crate::error::OperationResult;
use crate::file_ops::{copy_file, delete_path, hash_file, move_file, rename_file};
use crate::inspect::inspect_path;
use crate::organizer::{OrganizeOptions, TransferMode, create_master_folders, organize_files};
use crate::output::OutputFormatter;
use crate::scanner::{ScanOptions, list_directory, scan_directory};
use crate::tree::{TreeOptions, build_tree};
use crate::volumes::{available_volumes, list_volumes};

/// Master folder manager: classify, analyze and organize files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to $MFM_CONFIG or ~/.mfm_config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// The available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the direct children of a directory
    List {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Show entries starting with '.'
        #[arg(long)]
        hidden: bool,
    },
    /// Show the metadata and category of one entry
    Inspect { path: PathBuf },
    /// Aggregate sizes, counts, extensions and categories
    Analyze {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        hidden: bool,
        /// Levels below the directory to visit
        #[arg(long)]
        depth: Option<usize>,
        /// Extra glob patterns to skip
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,
    },
    /// List every entry below a directory
    Scan {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        hidden: bool,
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,
    },
    /// Draw a directory tree
    Tree {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,
        /// Only keep entries matching one of these patterns
        #[arg(long = "include", value_name = "PATTERN")]
        include: Vec<String>,
    },
    /// Sort files into category folders
    Organize {
        source: PathBuf,
        /// Destination root (defaults to the configured master folder)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Copy instead of moving
        #[arg(long)]
        copy: bool,
        /// Leave files starting with '.' in place
        #[arg(long)]
        skip_hidden: bool,
    },
    /// Create the master folder tree
    CreateMasterFolders {
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Show mounted volumes and their usage
    Volumes {
        /// Only list the configured quick-access volumes that are mounted
        #[arg(long)]
        quick: bool,
    },
    /// Hash a file's contents
    Hash {
        file: PathBuf,
        /// md5, sha1, sha256, sha512 or blake3
        #[arg(long, default_value = "sha256")]
        algorithm: String,
    },
    /// Move a file or directory
    Move {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Copy a file, preserving its metadata
    Copy {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Rename an entry within its directory
    Rename { path: PathBuf, new_name: String },
    /// Delete a file or directory tree
    Delete {
        path: PathBuf,
        /// Overwrite file contents with zeros first (best-effort)
        #[arg(long)]
        secure: bool,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show recently used paths
    Recent,
    /// Manage favorite paths
    Favorites {
        #[command(subcommand)]
        action: Option<FavoriteAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoriteAction {
    Add { path: PathBuf },
    Remove { path: PathBuf },
    List,
}

/// Settings plus where they were loaded from, so they can be written back.
struct Session {
    settings: Settings,
    path: PathBuf,
    source: SettingsSource,
}

impl Session {
    fn open(config: Option<&Path>) -> Result<Self, String> {
        let path = match config {
            Some(path) => path.to_path_buf(),
            None => Settings::default_path().map_err(|e| e.to_string())?,
        };
        let (settings, source) =
            Settings::load_from(&path).map_err(|e| format!("Error loading configuration: {e}"))?;
        Ok(Self {
            settings,
            path,
            source,
        })
    }

    fn table(&self) -> CategoryTable {
        self.settings.category_table()
    }

    fn exclusions(&self, extra: &[String]) -> Vec<String> {
        self.settings
            .excluded_patterns
            .iter()
            .chain(extra)
            .cloned()
            .collect()
    }

    /// Writes the settings back. Refused when the file on disk was invalid,
    /// so it is never replaced by defaults.
    fn save(&self) -> Result<(), String> {
        if !self.source.is_writable() {
            return Err(format!(
                "Configuration {} is invalid; fix it before changing settings",
                self.path.display()
            ));
        }
        self.settings
            .save(&self.path)
            .map_err(|e| format!("Error saving configuration: {e}"))
    }

    /// Records a path in the recent list; failures only warn.
    fn remember(&mut self, path: &Path) {
        if !self.source.is_writable() {
            log::debug!("Not recording {}: configuration is read-only", path.display());
            return;
        }
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.settings.add_recent_path(path);
        if let Err(err) = self.save() {
            OutputFormatter::warning(&err);
        }
    }
}

/// Unwraps an operation result, turning a failure into the CLI error string.
fn finish<T>(result: OperationResult<T>) -> Result<T, String> {
    result.into_result().map_err(|e| e.to_string())
}

/// Runs one parsed command.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mfm::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["mfm", "tree", "/tmp", "--depth", "2"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let mut session = Session::open(cli.config.as_deref())?;

    match &cli.command {
        Command::List { path, hidden } => {
            let report = finish(list_directory(path, *hidden, &session.table()))?;
            session.remember(path);
            OutputFormatter::header(&path.display().to_string());
            for entry in report.entries() {
                OutputFormatter::plain(&OutputFormatter::descriptor_line(entry));
            }
            OutputFormatter::info(&format!(
                "{} directories, {} files, {}",
                report.total_dirs,
                report.total_files,
                OutputFormatter::size(report.total_size)
            ));
            Ok(())
        }

        Command::Inspect { path } => {
            let info = finish(inspect_path(path, &session.table()))?;
            OutputFormatter::descriptor_details(&info);
            Ok(())
        }

        Command::Analyze {
            path,
            hidden,
            depth,
            exclude,
        } => {
            let options = AnalyzeOptions {
                include_hidden: *hidden,
                max_depth: *depth,
                exclude_patterns: session.exclusions(exclude),
            };
            let spinner = OutputFormatter::create_spinner(&format!("Analyzing {}", path.display()));
            let result = analyze_directory(path, &options, &session.table());
            spinner.finish_and_clear();

            let stats = finish(result)?;
            session.remember(path);
            OutputFormatter::statistics_table(&stats);
            Ok(())
        }

        Command::Scan {
            path,
            hidden,
            depth,
            exclude,
        } => {
            let options = ScanOptions {
                include_hidden: *hidden,
                max_depth: *depth,
                exclude_patterns: session.exclusions(exclude),
            };
            let spinner = OutputFormatter::create_spinner(&format!("Scanning {}", path.display()));
            let result = scan_directory(path, &options, &session.table());
            spinner.finish_and_clear();

            let report = finish(result)?;
            session.remember(path);
            for entry in report.entries() {
                OutputFormatter::plain(&format!(
                    "{}  {}",
                    OutputFormatter::descriptor_line(entry),
                    entry.path().display()
                ));
            }
            OutputFormatter::info(&format!(
                "{} directories, {} files, {}",
                report.total_dirs,
                report.total_files,
                OutputFormatter::size(report.total_size)
            ));
            Ok(())
        }

        Command::Tree {
            path,
            depth,
            exclude,
            include,
        } => {
            let options = TreeOptions {
                max_depth: *depth,
                exclude_patterns: session.exclusions(exclude),
                include_patterns: include.clone(),
            };
            let tree = build_tree(path, &options);
            if path.is_dir() {
                session.remember(path);
            }
            print!("{}", OutputFormatter::render_tree(&tree));
            Ok(())
        }

        Command::Organize {
            source,
            dest,
            copy,
            skip_hidden,
        } => {
            let dest = dest
                .clone()
                .unwrap_or_else(|| session.settings.master_folder());
            let options = OrganizeOptions {
                transfer: if *copy {
                    TransferMode::Copy
                } else {
                    TransferMode::Move
                },
                include_hidden: !*skip_hidden,
            };

            OutputFormatter::info(&format!(
                "Organizing {} into {}",
                source.display(),
                dest.display()
            ));
            let spinner = OutputFormatter::create_spinner("Organizing files...");
            let result = organize_files(source, &dest, &options, &session.table());
            spinner.finish_and_clear();

            let counts = finish(result)?;
            session.remember(source);
            if counts.is_empty() {
                OutputFormatter::warning("No files were organized");
            } else {
                OutputFormatter::summary_table(&counts);
                OutputFormatter::success("Organization complete");
            }
            Ok(())
        }

        Command::CreateMasterFolders { root } => {
            let root = root
                .clone()
                .unwrap_or_else(|| session.settings.master_folder());
            let folders = finish(create_master_folders(&root, &session.table()))?;
            for folder in folders.values() {
                OutputFormatter::plain(&format!("  {}", folder.display()));
            }
            OutputFormatter::success(&format!(
                "{} master folders ready under {}",
                folders.len(),
                root.display()
            ));
            Ok(())
        }

        Command::Volumes { quick } => {
            if *quick {
                let volumes = available_volumes(&session.settings);
                OutputFormatter::header("QUICK ACCESS");
                if volumes.is_empty() {
                    OutputFormatter::warning("No quick-access volumes are mounted");
                }
                for volume in volumes {
                    OutputFormatter::plain(&format!("  {}", volume.display()));
                }
            } else {
                let volumes = finish(list_volumes())?;
                OutputFormatter::volumes_table(&volumes);
            }
            Ok(())
        }

        Command::Hash { file, algorithm } => {
            let hash = finish(hash_file(file, algorithm))?;
            OutputFormatter::plain(&format!(
                "{}  {}  ({})",
                hash.hash_value,
                hash.path.display(),
                hash.algorithm
            ));
            Ok(())
        }

        Command::Move {
            source,
            destination,
            overwrite,
        } => {
            let new_path = finish(move_file(source, destination, *overwrite))?;
            OutputFormatter::success(&format!("Moved to {}", new_path.display()));
            Ok(())
        }

        Command::Copy {
            source,
            destination,
            overwrite,
        } => {
            let new_path = finish(copy_file(source, destination, *overwrite))?;
            OutputFormatter::success(&format!("Copied to {}", new_path.display()));
            Ok(())
        }

        Command::Rename { path, new_name } => {
            let new_path = finish(rename_file(path, new_name))?;
            OutputFormatter::success(&format!("Renamed to {}", new_path.display()));
            Ok(())
        }

        Command::Delete { path, secure, yes } => {
            if !*yes {
                return Err(format!(
                    "Refusing to delete {} without --yes",
                    path.display()
                ));
            }
            if *secure {
                OutputFormatter::warning(
                    "Secure delete is best-effort; SSDs and copy-on-write filesystems may keep old data",
                );
            }
            finish(delete_path(path, *secure))?;
            OutputFormatter::success(&format!("Deleted {}", path.display()));
            Ok(())
        }

        Command::Recent => {
            OutputFormatter::header("RECENT PATHS");
            if session.settings.recent_paths.is_empty() {
                OutputFormatter::plain("  (none)");
            }
            for (i, path) in session.settings.recent_paths.iter().enumerate() {
                OutputFormatter::plain(&format!("  {:>2}. {}", i + 1, path.display()));
            }
            Ok(())
        }

        Command::Favorites { action } => match action {
            Some(FavoriteAction::Add { path }) => {
                let path = std::path::absolute(path).map_err(|e| e.to_string())?;
                if session.settings.add_favorite(&path) {
                    session.save()?;
                    OutputFormatter::success(&format!("Added {}", path.display()));
                } else {
                    OutputFormatter::warning(&format!("{} is already a favorite", path.display()));
                }
                Ok(())
            }
            Some(FavoriteAction::Remove { path }) => {
                let path = std::path::absolute(path).map_err(|e| e.to_string())?;
                if session.settings.remove_favorite(&path) {
                    session.save()?;
                    OutputFormatter::success(&format!("Removed {}", path.display()));
                    Ok(())
                } else {
                    Err(format!("{} is not a favorite", path.display()))
                }
            }
            Some(FavoriteAction::List) | None => {
                OutputFormatter::header("FAVORITES");
                if session.settings.favorites.is_empty() {
                    OutputFormatter::plain("  (none)");
                }
                for path in &session.settings.favorites {
                    OutputFormatter::plain(&format!("  {}", path.display()));
                }
                Ok(())
            }
        },
    }
}
