//! Nested directory tree construction.
//!
//! Unlike the analyzer and scanner, [`build_tree`] is best-effort all the way
//! up to the root: a missing or unreadable root still yields a single empty
//! directory node named after it, so callers can always render something.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::category::extension_of;
use crate::filter::EntryFilter;

/// Options for [`build_tree`].
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Levels below the root to expand; unbounded when `None`.
    pub max_depth: Option<usize>,
    pub exclude_patterns: Vec<String>,
    /// When non-empty, only entries matching one of these are kept.
    pub include_patterns: Vec<String>,
}

/// What a [`TreeNode`] stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Directory { children: BTreeMap<String, TreeNode> },
    File { size: u64, extension: Option<String> },
}

/// One node of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl TreeNode {
    fn directory(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Directory {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Children in name order; empty for files.
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        let children = match &self.kind {
            NodeKind::Directory { children } => Some(children.values()),
            NodeKind::File { .. } => None,
        };
        children.into_iter().flatten()
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        match &self.kind {
            NodeKind::Directory { children } => children.get(name),
            NodeKind::File { .. } => None,
        }
    }
}

/// Name shown for the root: its file name, or the whole path when it has
/// none (e.g. `/`).
fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Builds the tree rooted at `root`.
///
/// Directory read failures are logged and leave that subtree empty. Symbolic
/// links to directories are shown but not descended into.
pub fn build_tree(root: &Path, options: &TreeOptions) -> TreeNode {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let mut node = TreeNode::directory(root_name(&root), root.clone());

    let filter = match EntryFilter::new(true, &options.exclude_patterns, &options.include_patterns)
    {
        Ok(filter) => filter,
        Err(err) => {
            log::warn!("Cannot build tree for {}: {}", root.display(), err);
            return node;
        }
    };

    match fs::metadata(&root) {
        Ok(metadata) if metadata.is_dir() => {
            let builder = TreeBuilder {
                root: &root,
                filter: &filter,
                max_depth: options.max_depth,
            };
            if let NodeKind::Directory { children } = &mut node.kind {
                builder.fill(&root, 1, children);
            }
        }
        Ok(_) => log::warn!("Tree root {} is not a directory", root.display()),
        Err(err) => log::warn!("Tree root {} unavailable: {}", root.display(), err),
    }

    node
}

struct TreeBuilder<'a> {
    root: &'a Path,
    filter: &'a EntryFilter,
    max_depth: Option<usize>,
}

impl TreeBuilder<'_> {
    /// Adds the entries of `dir` (which sit at `depth`) to `children`.
    fn fill(&self, dir: &Path, depth: usize, children: &mut BTreeMap<String, TreeNode>) {
        if self.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Error reading directory {}: {}", dir.display(), err);
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Error reading entry in {}: {}", dir.display(), err);
                    continue;
                }
            };

            let path = entry.path();
            let relative = path.strip_prefix(self.root).unwrap_or(&path);
            if !self.filter.accepts(relative) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(node) = self.node(&path, name.clone(), depth) {
                children.insert(name, node);
            }
        }
    }

    fn node(&self, path: &Path, name: String, depth: usize) -> Option<TreeNode> {
        let link = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Error processing {}: {}", path.display(), err);
                return None;
            }
        };

        // Symlinks are described by their target but never expanded.
        let is_link = link.file_type().is_symlink();
        let metadata = if is_link {
            match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::debug!("Dangling symlink {}: {}", path.display(), err);
                    link
                }
            }
        } else {
            link
        };

        if metadata.is_dir() {
            let mut node = TreeNode::directory(name, path.to_path_buf());
            if let NodeKind::Directory { children } = &mut node.kind {
                if !is_link {
                    self.fill(path, depth + 1, children);
                }
            }
            return Some(node);
        }

        let extension = Some(extension_of(&name)).filter(|ext| !ext.is_empty());
        Some(TreeNode {
            name,
            path: path.to_path_buf(),
            kind: NodeKind::File {
                size: metadata.len(),
                extension,
            },
        })
    }
}
