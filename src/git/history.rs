//! Per-file commit history.
//!
//! The branch log is walked once. Each commit is diffed against its first
//! parent and its record is attributed to every path it touched, so the cost
//! grows with commits times files-per-commit rather than files times commits.

use std::collections::BTreeMap;
use std::path::Path;

use clap::ValueEnum;
use git2::Sort;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SummaryError;
use crate::git::{CommitRecord, GitRepository, SHORT_HASH_LEN};

/// Commit lists keyed by repository-relative path.
pub type HistoryByPath = BTreeMap<String, Vec<CommitRecord>>;

/// Order of commits inside each file's `git_history`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryOrder {
    /// Oldest commit first.
    #[default]
    OldestFirst,
    /// Newest commit first.
    NewestFirst,
}

impl HistoryOrder {
    /// Arranges an ascending list in this order.
    pub fn apply(self, mut ascending: Vec<CommitRecord>) -> Vec<CommitRecord> {
        if self == Self::NewestFirst {
            ascending.reverse();
        }
        ascending
    }
}

/// Path to commit-list accumulator.
///
/// Recording and merging are order-independent: `finish` sorts every list
/// by commit date and hash and drops duplicates, so partial accumulators
/// built over disjoint commit ranges can be merged in any order.
#[derive(Debug, Clone, Default)]
pub struct HistoryAccumulator {
    by_path: BTreeMap<String, Vec<CommitRecord>>,
}

impl HistoryAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes `record` to `path`.
    pub fn record(&mut self, path: String, record: CommitRecord) {
        self.by_path.entry(path).or_default().push(record);
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: Self) {
        for (path, mut records) in other.by_path {
            self.by_path.entry(path).or_default().append(&mut records);
        }
    }

    /// Number of distinct paths seen so far.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Produces ascending, de-duplicated commit lists.
    pub fn finish(self) -> HistoryByPath {
        self.by_path
            .into_iter()
            .map(|(path, mut records)| {
                records.sort();
                records.dedup();
                (path, records)
            })
            .collect()
    }
}

/// Collects commit history for every file present at a branch tip.
#[derive(Debug, Clone)]
pub struct HistoryCollector {
    hash_length: usize,
}

impl Default for HistoryCollector {
    fn default() -> Self {
        Self::new(SHORT_HASH_LEN)
    }
}

impl HistoryCollector {
    /// Creates a collector that abbreviates hashes to `hash_length` chars.
    pub fn new(hash_length: usize) -> Self {
        Self { hash_length }
    }

    /// Walks `branch_name` once and returns ascending commit lists per path.
    ///
    /// Only paths that exist in the branch tip tree are reported. Merge
    /// commits are skipped. A commit with unrepresentable dates is logged and
    /// skipped; failing to open the repository or resolve the branch is
    /// fatal.
    pub fn collect_for_branch<P: AsRef<Path>>(
        &self,
        root_path: P,
        branch_name: &str,
    ) -> Result<HistoryByPath, SummaryError> {
        let repo = GitRepository::open_at(root_path)?;

        let Some(tip) = repo.resolve_branch(branch_name)? else {
            info!(branch = branch_name, "No commits on branch");
            return Ok(HistoryByPath::new());
        };

        let tip_tree = tip.tree().map_err(|source| git_error("Failed to read branch tree", source))?;
        let live_paths = repo.tree_paths(&tip_tree)?;

        let git = repo.repository();
        let mut walk = git
            .revwalk()
            .map_err(|source| git_error("Failed to create revwalk", source))?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(|source| git_error("Failed to configure revwalk", source))?;
        walk.push(tip.id())
            .map_err(|source| git_error("Failed to push branch tip", source))?;

        let mut accumulator = HistoryAccumulator::new();
        let mut commits_seen = 0usize;
        let mut commits_skipped = 0usize;

        for oid in walk {
            let oid = oid.map_err(|source| git_error("Failed to read commit from log", source))?;
            let commit = git
                .find_commit(oid)
                .map_err(|source| git_error(format!("Failed to find commit {oid}"), source))?;
            commits_seen += 1;

            if commit.parent_count() > 1 {
                debug!(commit = %oid, "Skipping merge commit");
                continue;
            }

            let record = match CommitRecord::from_git_commit(&commit, self.hash_length) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping commit with malformed metadata");
                    commits_skipped += 1;
                    continue;
                }
            };

            let touched = repo
                .touched_paths(&commit)
                .map_err(|source| git_error(format!("Failed to diff commit {oid}"), source))?;

            for path in touched {
                if live_paths.contains(&path) {
                    accumulator.record(path, record.clone());
                }
            }
        }

        info!(
            branch = branch_name,
            commits = commits_seen,
            skipped = commits_skipped,
            files = accumulator.len(),
            "Collected commit history"
        );

        Ok(accumulator.finish())
    }
}

fn git_error(context: impl Into<String>, source: git2::Error) -> SummaryError {
    SummaryError::Git {
        context: context.into(),
        source,
    }
}

/// Earliest commit date of an ascending list.
pub fn created_at(ascending: &[CommitRecord]) -> Option<chrono::DateTime<chrono::Utc>> {
    ascending.first().map(|record| record.commit_date)
}
