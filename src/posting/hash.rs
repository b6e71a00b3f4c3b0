//! Stable content digests for postings
//!
//! Each part is fed to SHA-256 behind its byte length, so no choice of part
//! contents can make two different part lists collide. Digests are hex encoded.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hashes an ordered list of string parts
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Identity of a logical posting: title, company, location and posting day
pub fn identity_hash(
    title: &str,
    company: &str,
    location: &str,
    posted_on: &DateTime<Utc>,
) -> String {
    let day = posted_on.format("%Y-%m-%d").to_string();
    content_hash(&[title, company, location, &day])
}

/// Freshness of a posting's body text
pub fn description_hash(description: &str) -> String {
    content_hash(&[description])
}
