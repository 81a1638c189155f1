//! Git repository operations

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{
    BranchType, Commit, Delta, DiffFindOptions, DiffOptions, ErrorCode, ObjectType, Repository,
    Tree, TreeWalkMode, TreeWalkResult,
};
use tracing::debug;

use crate::error::SummaryError;

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
    root: PathBuf,
}

impl GitRepository {
    /// Open the repository whose working tree root is `path`
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, SummaryError> {
        let root = path.as_ref().to_path_buf();
        let repo = Repository::open(&root).map_err(|e| SummaryError::InvalidRepository {
            path: root.clone(),
            reason: e.message().to_string(),
        })?;

        if repo.is_bare() {
            return Err(SummaryError::InvalidRepository {
                path: root,
                reason: "bare repository has no working tree".to_string(),
            });
        }

        Ok(Self { repo, root })
    }

    /// Get the path the repository was opened from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get access to the underlying git2::Repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Resolve a branch name to its tip commit.
    ///
    /// Tries a local branch, then a remote-tracking branch, then any revspec.
    /// Returns `Ok(None)` when `branch` is the unborn branch HEAD points at,
    /// i.e. a repository without commits.
    pub fn resolve_branch(&self, branch: &str) -> Result<Option<Commit<'_>>, SummaryError> {
        let reference = self
            .repo
            .find_branch(branch, BranchType::Local)
            .or_else(|_| self.repo.find_branch(branch, BranchType::Remote))
            .map(git2::Branch::into_reference);

        let object = match reference {
            Ok(reference) => reference.peel(ObjectType::Commit),
            Err(_) => self.repo.revparse_single(branch),
        };

        match object.and_then(|obj| obj.peel_to_commit()) {
            Ok(commit) => Ok(Some(commit)),
            Err(_) if self.is_unborn_head(branch) => {
                debug!(branch, "Branch has no commits yet");
                Ok(None)
            }
            Err(_) => Err(SummaryError::BranchNotFound {
                branch: branch.to_string(),
            }),
        }
    }

    /// Check whether HEAD is the unborn `branch`
    fn is_unborn_head(&self, branch: &str) -> bool {
        let unborn = matches!(self.repo.head(), Err(e) if e.code() == ErrorCode::UnbornBranch);
        if !unborn {
            return false;
        }

        let expected = format!("refs/heads/{branch}");
        self.repo
            .find_reference("HEAD")
            .ok()
            .and_then(|head| head.symbolic_target().map(|target| target == expected))
            .unwrap_or(false)
    }

    /// Collect the paths of all blobs in `tree`
    pub fn tree_paths(&self, tree: &Tree) -> Result<HashSet<String>, SummaryError> {
        let mut paths = HashSet::new();

        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                let name = String::from_utf8_lossy(entry.name_bytes());
                paths.insert(format!("{dir}{name}"));
            }
            TreeWalkResult::Ok
        })
        .map_err(|source| SummaryError::Git {
            context: "Failed to walk branch tree".to_string(),
            source,
        })?;

        Ok(paths)
    }

    /// List the paths a commit added, modified, renamed or copied.
    ///
    /// Diffs against the first parent (or the empty tree for a root commit)
    /// with binary detection disabled so no blob content is loaded. Renames
    /// are reported under their new path; deletions are not reported.
    pub fn touched_paths(&self, commit: &Commit) -> Result<Vec<String>, git2::Error> {
        let commit_tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut options = DiffOptions::new();
        options.skip_binary_check(true);

        let mut diff = self.repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut options),
        )?;

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        let paths = diff
            .deltas()
            .filter(|delta| delta.status() != Delta::Deleted)
            .filter_map(|delta| delta.new_file().path().map(|p| p.to_string_lossy().into_owned()))
            .collect();

        Ok(paths)
    }
}
