//! Content-hash based upsert
//!
//! A posting's identity hash decides whether it is new. For known postings
//! the description hash decides between a full replace and a touch of
//! `last_updated`, so repeating identical input never rewrites a record.

use crate::posting::JobPosting;
use crate::storage::traits::{Storage, StorageResult};
use chrono::{DateTime, Utc};

/// What an upsert did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No posting with this hash existed
    Inserted,
    /// The description changed; every field was rewritten except `created_at`
    Replaced,
    /// Nothing changed but `last_updated`
    Touched,
}

/// Persists `posting`, deduplicating on its content hashes
///
/// Hashes are computed here, so callers do not need to fill them in. `now`
/// becomes `last_updated`, and `created_at` for new postings.
pub fn upsert_posting<S: Storage + ?Sized>(
    storage: &mut S,
    mut posting: JobPosting,
    now: DateTime<Utc>,
) -> StorageResult<UpsertOutcome> {
    posting.compute_hashes();

    let Some(existing) = storage.find_posting(&posting.hash)? else {
        posting.created_at = Some(now);
        posting.last_updated = Some(now);
        posting.expire_at = Some(posting.retention_deadline());
        storage.insert_posting(&posting)?;
        return Ok(UpsertOutcome::Inserted);
    };

    if existing.description_hash != posting.description_hash {
        posting.created_at = existing.created_at.or(Some(now));
        posting.last_updated = Some(now);
        posting.expire_at = Some(posting.retention_deadline());
        storage.replace_posting(&posting)?;
        return Ok(UpsertOutcome::Replaced);
    }

    storage.touch_posting(&posting.hash, now)?;
    Ok(UpsertOutcome::Touched)
}
