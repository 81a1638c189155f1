//! Working tree traversal.
//!
//! Produces the nested project structure together with a flat inventory of
//! every entry, both in the same deterministic order: entries are visited
//! depth first and siblings are sorted by name.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SummaryError;
use crate::ignore::{IgnoreMatcher, GIT_DIR};

/// Nested directory structure of the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTree {
    /// The repository root.
    pub root: TreeRoot,
}

/// Root of the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRoot {
    /// Name of the repository directory.
    pub name: String,
    /// Root path as seen from itself, always `"."`.
    pub root_path: String,
    /// Top-level entries.
    pub structure: Vec<Node>,
}

/// A directory or file in the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// A directory and its direct descendants.
    Directory {
        /// Entry name.
        name: String,
        /// Path relative to the repository root, forward slashes.
        path: String,
        /// Direct descendants only.
        children: Vec<Node>,
    },
    /// A file or a symbolic link.
    File {
        /// Entry name.
        name: String,
        /// Path relative to the repository root, forward slashes.
        path: String,
    },
}

impl Node {
    /// Relative path of this node.
    pub fn path(&self) -> &str {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Returns true for directory nodes.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

/// A `(path, kind)` pair from the flat inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatEntry {
    /// Path relative to the repository root, no trailing slash.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

impl FlatEntry {
    fn new(path: &str, is_directory: bool) -> Self {
        Self {
            path: path.to_string(),
            is_directory,
        }
    }

    /// Relative path of the containing directory, `""` for the root.
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }
}

impl ProjectTree {
    /// Flattens the nested structure in traversal order.
    pub fn entries(&self) -> Vec<FlatEntry> {
        fn visit(nodes: &[Node], out: &mut Vec<FlatEntry>) {
            for node in nodes {
                out.push(FlatEntry::new(node.path(), node.is_directory()));
                if let Node::Directory { children, .. } = node {
                    visit(children, out);
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.root.structure, &mut out);
        out
    }
}

/// Result of a traversal.
#[derive(Debug, Clone)]
pub struct WalkOutput {
    /// Nested structure.
    pub tree: ProjectTree,
    /// Every node of `tree`, in traversal order.
    pub entries: Vec<FlatEntry>,
}

/// Builds the project tree while honouring the root ignore rules.
pub struct TreeWalker<'a> {
    matcher: &'a IgnoreMatcher,
    root: PathBuf,
    visited: HashSet<PathBuf>,
    entries: Vec<FlatEntry>,
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker that consults `matcher` for every entry.
    pub fn new(matcher: &'a IgnoreMatcher) -> Self {
        Self {
            matcher,
            root: PathBuf::new(),
            visited: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Walks the tree below `root_path`.
    ///
    /// Symbolic links are never followed and are reported as file leaves,
    /// the same way git stores them. A real directory is always reported as
    /// a directory; one whose real path was already walked (a bind mount
    /// loop) is left empty. Only a failure to list the root itself is an
    /// error; unreadable subdirectories are logged and left empty.
    pub fn build<P: AsRef<Path>>(mut self, root_path: P) -> Result<WalkOutput, SummaryError> {
        let root_path = root_path.as_ref();
        self.root = fs::canonicalize(root_path).map_err(|source| SummaryError::TreeWalk {
            path: root_path.to_path_buf(),
            source,
        })?;
        self.visited.insert(self.root.clone());

        let root = self.root.clone();
        let structure = self
            .walk_dir(&root, "")
            .map_err(|source| SummaryError::TreeWalk {
                path: root.clone(),
                source,
            })?;

        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());

        debug!(entries = self.entries.len(), "Finished tree walk");

        Ok(WalkOutput {
            tree: ProjectTree {
                root: TreeRoot {
                    name,
                    root_path: ".".to_string(),
                    structure,
                },
            },
            entries: self.entries,
        })
    }

    fn walk_dir(&mut self, dir: &Path, relative: &str) -> std::io::Result<Vec<Node>> {
        let mut listing: Vec<(String, PathBuf)> = fs::read_dir(dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some((
                    entry.file_name().to_string_lossy().into_owned(),
                    entry.path(),
                )),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .collect();
        listing.sort_by(|a, b| a.0.cmp(&b.0));

        let mut nodes = Vec::with_capacity(listing.len());
        for (name, full_path) in listing {
            if name == GIT_DIR {
                continue;
            }

            let path = if relative.is_empty() {
                name.clone()
            } else {
                format!("{relative}/{name}")
            };

            let directory = self.resolve_directory(&full_path);
            let ignore_key = if directory.is_some() {
                format!("{path}/")
            } else {
                path.clone()
            };
            if self.matcher.is_ignored(&ignore_key) {
                debug!(path = %ignore_key, "Ignored");
                continue;
            }

            let Some(real) = directory else {
                self.entries.push(FlatEntry::new(&path, false));
                nodes.push(Node::File { name, path });
                continue;
            };

            self.entries.push(FlatEntry::new(&path, true));
            let children = if self.visited.insert(real) {
                match self.walk_dir(&full_path, &path) {
                    Ok(children) => children,
                    Err(e) => {
                        warn!(dir = %full_path.display(), error = %e, "Skipping unreadable directory");
                        Vec::new()
                    }
                }
            } else {
                warn!(dir = %full_path.display(), "Directory already walked, leaving it empty");
                Vec::new()
            };
            nodes.push(Node::Directory {
                name,
                path,
                children,
            });
        }

        Ok(nodes)
    }

    /// Returns the real path if `path` is a directory and not a symlink.
    fn resolve_directory(&self, path: &Path) -> Option<PathBuf> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot stat entry");
                return None;
            }
        };

        if metadata.file_type().is_symlink() {
            debug!(link = %path.display(), "Reporting symlink as a file");
            return None;
        }

        metadata
            .is_dir()
            .then(|| fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
    }
}
