//! Error kinds that abort a summary run.
//!
//! Recoverable conditions (a malformed ignore line, a commit with an
//! unrepresentable date, an unreadable subdirectory) never reach this type:
//! they are logged where they occur and the run continues.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised by the summary pipeline.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// The path could not be opened as a git repository.
    #[error("Not a git repository: {} ({reason})", path.display())]
    InvalidRepository {
        /// Path that was given as the repository root.
        path: PathBuf,
        /// Underlying reason reported by libgit2.
        reason: String,
    },

    /// The requested branch does not resolve to a commit.
    #[error("Branch not found: {branch}")]
    BranchNotFound {
        /// Branch name as given on the command line.
        branch: String,
    },

    /// Reading the object database failed part way through.
    #[error("{context}")]
    Git {
        /// What was being read.
        context: String,
        /// Underlying libgit2 error.
        #[source]
        source: git2::Error,
    },

    /// The working tree root could not be listed.
    #[error("Failed to read directory: {}", path.display())]
    TreeWalk {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The output document could not be written.
    #[error("Failed to write output file: {}", path.display())]
    OutputWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tree and the flat inventory disagree about a path.
    #[error("Tree/inventory mismatch at '{path}': {detail}")]
    TreeHistoryMismatch {
        /// Offending relative path.
        path: String,
        /// What disagreed.
        detail: &'static str,
    },

    /// A configuration file could not be read or parsed.
    #[error("Invalid configuration file {}: {reason}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parse or read failure.
        reason: String,
    },
}

impl SummaryError {
    /// Returns true for invariant violations that indicate a bug rather
    /// than a problem with the user's input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::TreeHistoryMismatch { .. })
    }
}
