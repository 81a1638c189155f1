//! Throwaway git repositories for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

/// Midnight UTC on 2024-01-01.
pub const JAN_1_2024: i64 = 1_704_067_200;

/// Seconds in a day.
pub const DAY: i64 = 86_400;

/// Test setup that creates a temporary git repository on branch `main`
pub struct TestRepo {
    _temp_dir: TempDir,
    pub repo_path: PathBuf,
    pub repo: Repository,
    pub commits: Vec<Oid>,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().join("project");
        fs::create_dir(&repo_path)?;

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&repo_path, &opts)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
            repo,
            commits: Vec::new(),
        })
    }

    /// Directory next to the repository, for output files.
    pub fn scratch_dir(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let path = self.repo_path.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn remove(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.repo_path.join(rel))?;
        Ok(())
    }

    pub fn write_exclude(&self, rules: &str) -> Result<()> {
        let info = self.repo_path.join(".git").join("info");
        fs::create_dir_all(&info)?;
        fs::write(info.join("exclude"), rules)?;
        Ok(())
    }

    /// Stages `add` and `remove` and commits with a fixed timestamp.
    pub fn commit(
        &mut self,
        message: &str,
        seconds: i64,
        add: &[&str],
        remove: &[&str],
    ) -> Result<Oid> {
        self.commit_with_offset(message, seconds, 0, add, remove)
    }

    pub fn commit_with_offset(
        &mut self,
        message: &str,
        seconds: i64,
        offset_minutes: i32,
        add: &[&str],
        remove: &[&str],
    ) -> Result<Oid> {
        let parents: Vec<Oid> = self.commits.last().copied().into_iter().collect();
        self.write_commit("HEAD", &parents, message, Time::new(seconds, offset_minutes), add, remove)
    }

    /// Commits onto `update_ref` with explicit parents, e.g. for side branches and merges.
    pub fn commit_with_parents(
        &mut self,
        update_ref: &str,
        parents: &[Oid],
        message: &str,
        seconds: i64,
        add: &[&str],
        remove: &[&str],
    ) -> Result<Oid> {
        self.write_commit(update_ref, parents, message, Time::new(seconds, 0), add, remove)
    }

    fn write_commit(
        &mut self,
        update_ref: &str,
        parents: &[Oid],
        message: &str,
        time: Time,
        add: &[&str],
        remove: &[&str],
    ) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for path in add {
            index.add_path(Path::new(path))?;
        }
        for path in remove {
            index.remove_path(Path::new(path))?;
        }
        index.write()?;

        let signature = Signature::new("Test User", "test@example.com", &time)?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let parent_commits = parents
            .iter()
            .map(|id| self.repo.find_commit(*id))
            .collect::<Result<Vec<Commit>, _>>()?;
        let parent_refs: Vec<&Commit> = parent_commits.iter().collect();

        let commit_id = self.repo.commit(
            Some(update_ref),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?;

        self.commits.push(commit_id);
        Ok(commit_id)
    }

    pub fn short_hash(&self, index: usize) -> String {
        self.commits[index].to_string()[..8].to_string()
    }
}
