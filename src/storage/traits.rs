//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::posting::JobPosting;
use crate::storage::{CountResult, RunRecord, RunStatus, TrendField};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Posting not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The dedup policy itself lives in [`crate::storage::upsert_posting`]; a
/// backend only provides the primitive reads and writes it is built from.
pub trait Storage {
    // ===== Postings =====

    /// Looks up a posting by identity hash
    fn find_posting(&self, hash: &str) -> StorageResult<Option<JobPosting>>;

    /// Inserts a new posting with its skills
    ///
    /// The posting must carry `hash`, `description_hash` and all three
    /// timestamps.
    fn insert_posting(&mut self, posting: &JobPosting) -> StorageResult<()>;

    /// Overwrites every stored field of the posting with the same hash
    fn replace_posting(&mut self, posting: &JobPosting) -> StorageResult<()>;

    /// Sets `last_updated` and leaves every other field untouched
    fn touch_posting(&mut self, hash: &str, at: DateTime<Utc>) -> StorageResult<()>;

    /// Deletes postings whose `expire_at` is at or before `now`
    ///
    /// # Returns
    ///
    /// The number of postings removed
    fn purge_expired(&mut self, now: DateTime<Utc>) -> StorageResult<usize>;

    fn count_postings(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Records the start of a crawl run and returns its ID
    fn create_run(&mut self, roles: &[String], config_hash: &str) -> StorageResult<i64>;

    /// Records how a crawl run ended
    fn complete_run(&mut self, run_id: i64, stored: usize, status: RunStatus)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Reporting =====

    /// Most frequent non-empty values of `field`, most common first
    ///
    /// `title_filter` restricts the count to postings whose title contains
    /// it, ignoring case.
    fn top_values(
        &self,
        field: TrendField,
        title_filter: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<CountResult>>;
}
