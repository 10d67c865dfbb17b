//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress spinners, and formatted tables. Renderers that build a `String`
//! are kept separate from the ones that print, so tree and table layout can be
//! checked without a terminal.

use colored::*;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::analyzer::DirectoryStatistics;
use crate::inspect::FileDescriptor;
use crate::organizer::CategoryCounts;
use crate::tree::{NodeKind, TreeNode};
use crate::volumes::VolumeInfo;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Spinners for long traversals
/// - Summary tables for statistics, organize counts and volumes
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mfm::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Human-readable byte count (`1.50 KiB`).
    pub fn size(bytes: u64) -> String {
        format_size(bytes, BINARY)
    }

    /// Creates a ticking spinner for operations of unknown length.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mfm::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Scanning...");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// One-line summary of a descriptor: kind marker, name, size, category.
    pub fn descriptor_line(info: &FileDescriptor) -> String {
        if info.is_dir() {
            return format!("{} {}/", "d".blue(), info.name().blue().bold());
        }
        let category = info
            .category()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();
        format!(
            "{} {} ({}){}",
            "f".normal(),
            info.name(),
            Self::size(info.size()),
            category.dimmed()
        )
    }

    /// Prints every field of a descriptor.
    pub fn descriptor_details(info: &FileDescriptor) {
        Self::header(info.name());
        println!("  Path:      {}", info.path().display());
        println!(
            "  Type:      {}",
            if info.is_dir() {
                "directory"
            } else if info.is_file() {
                "file"
            } else {
                "other"
            }
        );
        println!("  Size:      {} ({} bytes)", Self::size(info.size()), info.size());
        println!("  Modified:  {}", info.modified().format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(category) = info.category() {
            println!("  Category:  {}", category.green());
        }
    }

    /// Prints a summary table with file counts by category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mfm::output::OutputFormatter;
    /// use mfm::organizer::CategoryCounts;
    ///
    /// let mut counts = CategoryCounts::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Images".to_string(), 8);
    /// OutputFormatter::summary_table(&counts);
    /// ```
    pub fn summary_table(category_counts: &CategoryCounts) {
        Self::header("SUMMARY");

        let total_files: usize = category_counts.values().sum();
        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            let file_word = if *count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }

    /// Prints directory statistics: totals, categories and top extensions.
    pub fn statistics_table(stats: &DirectoryStatistics) {
        Self::header("STATISTICS");
        println!("  Files:       {}", stats.file_count.to_string().green());
        println!("  Directories: {}", stats.dir_count.to_string().green());
        println!("  Total size:  {}", Self::size(stats.total_size).bold());

        if !stats.by_category.is_empty() {
            let width = stats
                .by_category
                .keys()
                .map(|name| name.len())
                .max()
                .unwrap_or(0)
                .max(8);
            Self::header("BY CATEGORY");
            println!(
                "{:<width$} | {:>7} | {}",
                "Category".bold(),
                "Files".bold(),
                "Size".bold(),
                width = width
            );
            println!("{}", "-".repeat(width + 24));
            for (category, bucket) in &stats.by_category {
                println!(
                    "{:<width$} | {:>7} | {}",
                    category,
                    bucket.count,
                    Self::size(bucket.total_size),
                    width = width
                );
            }
        }

        if !stats.extensions.is_empty() {
            Self::header("TOP EXTENSIONS");
            let mut extensions: Vec<_> = stats.extensions.iter().collect();
            extensions.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (ext, count) in extensions.into_iter().take(10) {
                let label = if ext.is_empty() { "(none)" } else { ext.as_str() };
                println!("  {:<12} {}", label, count);
            }
        }
    }

    /// Prints mounted volumes with their usage.
    pub fn volumes_table(volumes: &[VolumeInfo]) {
        Self::header("VOLUMES");
        if volumes.is_empty() {
            println!("  (none)");
            return;
        }
        for volume in volumes {
            let percent = format!("{:.1}%", volume.usage.percent);
            let percent = if volume.usage.percent >= 90.0 {
                percent.red()
            } else {
                percent.green()
            };
            println!(
                "  {} {} ({}, {})",
                volume.mount_point.display().to_string().bold(),
                volume.device.dimmed(),
                volume.fstype,
                volume.options.dimmed()
            );
            println!(
                "      {} used of {}, {} free [{}]",
                Self::size(volume.usage.used),
                Self::size(volume.usage.total),
                Self::size(volume.usage.free),
                percent
            );
        }
    }

    /// Renders a tree as ASCII art, directories first then files, each group
    /// in name order.
    pub fn render_tree(root: &TreeNode) -> String {
        let mut result = format!("{}/\n", root.name);
        Self::render_children(root, "", &mut result);
        result
    }

    fn render_children(node: &TreeNode, prefix: &str, result: &mut String) {
        let mut children: Vec<&TreeNode> = node.children().collect();
        children.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));

        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            match &child.kind {
                NodeKind::Directory { .. } => {
                    result.push_str(&format!("{prefix}{connector}{}/\n", child.name));
                    let new_prefix = if is_last {
                        format!("{prefix}    ")
                    } else {
                        format!("{prefix}│   ")
                    };
                    Self::render_children(child, &new_prefix, result);
                }
                NodeKind::File { size, .. } => {
                    result.push_str(&format!(
                        "{prefix}{connector}{} ({})\n",
                        child.name,
                        Self::size(*size)
                    ));
                }
            }
        }
    }
}
