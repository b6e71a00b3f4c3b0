//! Job posting model
//!
//! A posting is built by a site parser, then completed by storage: the
//! hashes and the created / updated / expiry timestamps are only filled in
//! on upsert.

mod hash;

pub use hash::{content_hash, description_hash, identity_hash};

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Postings expire this many days after their posting date
pub const RETENTION_DAYS: i64 = 30;

/// Returns the retention deadline for a posting date
pub fn expire_at(posted_on: DateTime<Utc>) -> DateTime<Utc> {
    posted_on + Duration::days(RETENTION_DAYS)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub posted_on: DateTime<Utc>,
    pub description: String,
    /// Page the posting was parsed from
    pub url: String,
    /// Site the posting came from, e.g. "weworkremotely.com"
    pub source: String,
    pub apply_url: String,
    pub skills: BTreeSet<String>,
    pub experience: String,

    pub hash: String,
    pub description_hash: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Fills in `hash` and `description_hash` from the current field values
    pub fn compute_hashes(&mut self) {
        self.hash = identity_hash(&self.title, &self.company, &self.location, &self.posted_on);
        self.description_hash = description_hash(&self.description);
    }

    /// Retention deadline derived from `posted_on`
    pub fn retention_deadline(&self) -> DateTime<Utc> {
        expire_at(self.posted_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expire_at_is_thirty_days_after_posting() {
        let posted = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap();
        assert_eq!(expire_at(posted), expected);
    }

    #[test]
    fn test_compute_hashes() {
        let mut posting = JobPosting {
            title: "platform engineer".to_string(),
            company: "acme".to_string(),
            location: "Anywhere".to_string(),
            posted_on: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
            description: "Run the fleet".to_string(),
            ..Default::default()
        };
        posting.compute_hashes();

        assert_eq!(
            posting.hash,
            identity_hash("platform engineer", "acme", "Anywhere", &posting.posted_on)
        );
        assert_eq!(posting.description_hash, description_hash("Run the fleet"));
    }
}
