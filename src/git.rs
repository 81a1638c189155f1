//! Git repository access and per-file history collection.

pub mod commit;
pub mod history;
pub mod repository;

pub use commit::{CommitMetadataError, CommitRecord};
pub use history::{HistoryAccumulator, HistoryByPath, HistoryCollector, HistoryOrder};
pub use repository::GitRepository;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Length of a full SHA-1 commit hash in hex characters.
pub const FULL_HASH_LEN: usize = 40;
