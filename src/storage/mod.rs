//! Storage module for persisting job postings
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Content-hash based upsert of postings
//! - Crawl run tracking
//! - Grouped counts for trend reports

mod schema;
mod sqlite;
mod traits;
mod upsert;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use upsert::{upsert_posting, UpsertOutcome};

use std::sync::{Arc, Mutex};

/// Storage handle shared between a dispatcher and the rest of the process
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Wraps a backend for sharing
pub fn shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub roles: Vec<String>,
    pub config_hash: String,
    pub stored_count: i64,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Posting attribute a trend report groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendField {
    Skills,
    Location,
    Company,
    Experience,
}

/// One grouped count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResult {
    pub value: String,
    pub count: u64,
}
