//! Job-Crawler: crawl job boards into a deduplicated posting store
//!
//! This crate drains a URL frontier of listing and job-detail pages, routes
//! each page to a pluggable site parser, and upserts the extracted postings
//! into SQLite keyed by a content hash.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod posting;
pub mod report;
pub mod sites;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Job-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Role not allowed: {0}")]
    RoleNotAllowed(String),

    #[error("No valid roles provided")]
    NoValidRoles,

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] sites::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Crawl task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Job-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, CrawlSummary, CrawlTrigger, Dispatcher};
pub use frontier::{CrawlTask, Frontier, TaskKind};
pub use posting::JobPosting;
pub use sites::{ParserRegistry, SiteParser};
pub use storage::{upsert_posting, SqliteStorage, Storage, UpsertOutcome};
