//! mfm - master folder manager
//!
//! This library classifies files into categories by extension, analyzes and
//! scans directory trees, organizes files into a master folder tree with
//! collision-safe naming, and offers single-file operations, volume listing
//! and a JSON settings document.

pub mod analyzer;
pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod filter;
pub mod inspect;
pub mod organizer;
pub mod output;
pub mod scanner;
pub mod tree;
pub mod volumes;

mod traverse;

pub use analyzer::{AnalyzeOptions, DirectoryStatistics, analyze, analyze_directory};
pub use category::{CategoryRule, CategoryTable, OTHER};
pub use config::{ConfigError, Settings};
pub use error::{MfmError, OperationResult, guarded};
pub use file_ops::{
    FileHash, HashAlgorithm, copy_file, delete_path, hash_file, move_file, rename_file,
};
pub use inspect::{FileDescriptor, inspect, inspect_path};
pub use organizer::{
    CategoryCounts, OrganizeOptions, TransferMode, create_master_folders, ensure_master_folders,
    organize, organize_files,
};
pub use scanner::{ScanOptions, ScanReport, list_directory, scan, scan_directory};
pub use tree::{NodeKind, TreeNode, TreeOptions, build_tree};
pub use volumes::{VolumeInfo, available_volumes, list_volumes, volume_info};

pub use cli::{Cli, run_cli};
