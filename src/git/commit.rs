//! Commit metadata records.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, Utc};
use git2::{Commit, Time};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::git::FULL_HASH_LEN;

/// A commit whose metadata cannot be represented.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitMetadataError {
    /// Timestamp or timezone offset out of range.
    #[error("commit {hash} has an invalid {field} date (seconds={seconds}, offset={offset_minutes}m)")]
    InvalidDate {
        /// Full commit hash.
        hash: String,
        /// Which signature carried the bad date.
        field: &'static str,
        /// Raw seconds since the epoch.
        seconds: i64,
        /// Raw timezone offset in minutes.
        offset_minutes: i32,
    },
}

/// Metadata for one commit that touched a file.
///
/// Dates are normalized to UTC and serialize as RFC 3339 with a `Z` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit hash, abbreviated to the configured length.
    pub commit_hash: String,
    /// Commit message exactly as stored.
    pub commit_message: String,
    /// When the change was authored.
    pub author_date: DateTime<Utc>,
    /// When the change was committed.
    pub commit_date: DateTime<Utc>,
}

impl CommitRecord {
    /// Creates a record from a git2 commit.
    ///
    /// `hash_length` is clamped to the full hash length.
    pub fn from_git_commit(
        commit: &Commit,
        hash_length: usize,
    ) -> Result<Self, CommitMetadataError> {
        let full_hash = commit.id().to_string();

        let author_date = signature_date(&full_hash, "author", commit.author().when())?;
        let commit_date = signature_date(&full_hash, "committer", commit.committer().when())?;

        let commit_hash = full_hash
            .get(..hash_length.min(FULL_HASH_LEN))
            .unwrap_or(&full_hash)
            .to_string();

        let commit_message = String::from_utf8_lossy(commit.message_bytes()).into_owned();

        Ok(Self {
            commit_hash,
            commit_message,
            author_date,
            commit_date,
        })
    }
}

/// Chronological by commit date, ties broken by hash.
impl Ord for CommitRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.commit_date
            .cmp(&other.commit_date)
            .then_with(|| self.commit_hash.cmp(&other.commit_hash))
            .then_with(|| self.author_date.cmp(&other.author_date))
            .then_with(|| self.commit_message.cmp(&other.commit_message))
    }
}

impl PartialOrd for CommitRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Converts a git signature time into UTC, rejecting out-of-range values.
fn signature_date(
    hash: &str,
    field: &'static str,
    time: Time,
) -> Result<DateTime<Utc>, CommitMetadataError> {
    let invalid = || CommitMetadataError::InvalidDate {
        hash: hash.to_string(),
        field,
        seconds: time.seconds(),
        offset_minutes: time.offset_minutes(),
    };

    time.offset_minutes()
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(invalid)?;

    DateTime::from_timestamp(time.seconds(), 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(hash: &str, day: u32) -> CommitRecord {
        let date = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        CommitRecord {
            commit_hash: hash.to_string(),
            commit_message: format!("change {hash}"),
            author_date: date,
            commit_date: date,
        }
    }

    #[test]
    fn orders_by_commit_date_then_hash() {
        let mut records = vec![record("bbbb", 5), record("cccc", 1), record("aaaa", 5)];
        records.sort();
        let hashes: Vec<&str> = records.iter().map(|r| r.commit_hash.as_str()).collect();
        assert_eq!(hashes, vec!["cccc", "aaaa", "bbbb"]);
    }

    #[test]
    fn serializes_dates_as_utc_rfc3339() {
        let value = serde_json::to_value(record("1234abcd", 2)).unwrap();
        assert_eq!(value["commit_date"], "2024-01-02T00:00:00Z");
        assert_eq!(value["author_date"], "2024-01-02T00:00:00Z");
        assert_eq!(value["commit_hash"], "1234abcd");
    }

    #[test]
    fn signature_date_converts_offset_to_utc() {
        // 2024-01-01T09:00:00+09:00 is midnight UTC.
        let time = Time::new(1_704_067_200, 540);
        let date = signature_date("h", "author", time).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn signature_date_rejects_out_of_range() {
        let err = signature_date("h", "committer", Time::new(i64::MAX, 0)).unwrap_err();
        assert!(matches!(
            err,
            CommitMetadataError::InvalidDate {
                field: "committer",
                ..
            }
        ));

        let bad_offset = Time::new(0, 48 * 60);
        assert!(signature_date("h", "author", bad_offset).is_err());
    }
}
