//! Summary document model and assembly.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SummaryError;
use crate::git::history::created_at;
use crate::git::{CommitRecord, HistoryByPath, HistoryOrder};
use crate::tree::{FlatEntry, ProjectTree};

/// `relative_path` of the record describing the repository root.
pub const ROOT_DIRECTORY: &str = "./";

/// The complete JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDocument {
    /// Nested directory structure.
    pub project_tree: ProjectTree,
    /// One record per file in the tree, in traversal order.
    pub files: Vec<FileRecord>,
    /// One record per directory, the root first.
    pub directories: Vec<DirectoryRecord>,
}

/// Discriminator carried by file records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A file.
    File,
}

/// Derived file attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Coarse language label from the file extension.
    pub language: String,
}

/// History and metadata for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Always `"file"`.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Earliest commit date, `null` for files without history.
    pub created_at: Option<DateTime<Utc>>,
    /// Derived attributes.
    pub metadata: FileMetadata,
    /// Commits that touched the file.
    pub git_history: Vec<CommitRecord>,
}

/// Immediate children of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Path relative to the repository root with a trailing slash.
    pub relative_path: String,
    /// Child paths, subdirectories with a trailing slash, sorted.
    pub children: Vec<String>,
}

/// Builds the summary document.
///
/// Every file in `flat_entries` gets a record; files with no entry in
/// `history_by_path` get an empty history and a `null` creation date.
/// History for paths outside the tree (ignored or otherwise absent) is
/// dropped. Fails with [`SummaryError::TreeHistoryMismatch`] when the tree
/// and the flat inventory disagree, which means the walker is broken.
pub fn assemble<F>(
    tree: ProjectTree,
    flat_entries: &[FlatEntry],
    history_by_path: &HistoryByPath,
    order: HistoryOrder,
    classify: F,
) -> Result<SummaryDocument, SummaryError>
where
    F: Fn(&str) -> String,
{
    check_inventory(&tree, flat_entries)?;

    let files: Vec<FileRecord> = flat_entries
        .iter()
        .filter(|entry| !entry.is_directory)
        .map(|entry| {
            let history = history_by_path.get(&entry.path).cloned().unwrap_or_default();
            let file_name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
            FileRecord {
                relative_path: entry.path.clone(),
                entry_type: EntryType::File,
                created_at: created_at(&history),
                metadata: FileMetadata {
                    language: classify(file_name),
                },
                git_history: order.apply(history),
            }
        })
        .collect();

    let dropped = history_by_path.len()
        - files
            .iter()
            .filter(|f| history_by_path.contains_key(&f.relative_path))
            .count();
    if dropped > 0 {
        debug!(paths = dropped, "History for paths outside the tree was dropped");
    }

    let mut children_of: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for entry in flat_entries {
        let child = if entry.is_directory {
            format!("{}/", entry.path)
        } else {
            entry.path.clone()
        };
        children_of.entry(entry.parent()).or_default().push(child);
    }

    let directory_paths =
        std::iter::once("").chain(flat_entries.iter().filter(|e| e.is_directory).map(|e| e.path.as_str()));

    let directories = directory_paths
        .map(|path| {
            let mut children = children_of.remove(path).unwrap_or_default();
            children.sort();
            DirectoryRecord {
                relative_path: if path.is_empty() {
                    ROOT_DIRECTORY.to_string()
                } else {
                    format!("{path}/")
                },
                children,
            }
        })
        .collect();

    Ok(SummaryDocument {
        project_tree: tree,
        files,
        directories,
    })
}

/// Verifies that the tree and the flat inventory describe the same paths.
fn check_inventory(tree: &ProjectTree, flat_entries: &[FlatEntry]) -> Result<(), SummaryError> {
    let mismatch = |path: &str, detail: &'static str| SummaryError::TreeHistoryMismatch {
        path: path.to_string(),
        detail,
    };

    let tree_entries = tree.entries();
    let mut in_tree: HashMap<&str, bool> = HashMap::with_capacity(tree_entries.len());
    for entry in &tree_entries {
        if in_tree.insert(&entry.path, entry.is_directory).is_some() {
            return Err(mismatch(&entry.path, "path appears twice in the project tree"));
        }
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(flat_entries.len());
    for entry in flat_entries {
        if !seen.insert(&entry.path) {
            return Err(mismatch(&entry.path, "path appears twice in the inventory"));
        }
        match in_tree.get(entry.path.as_str()) {
            None => return Err(mismatch(&entry.path, "missing from the project tree")),
            Some(&is_dir) if is_dir != entry.is_directory => {
                return Err(mismatch(&entry.path, "file/directory kind disagrees"));
            }
            Some(_) => {}
        }
    }

    if let Some(extra) = tree_entries.iter().find(|e| !seen.contains(e.path.as_str())) {
        return Err(mismatch(&extra.path, "missing from the inventory"));
    }

    Ok(())
}
