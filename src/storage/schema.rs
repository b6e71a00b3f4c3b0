//! Database schema definitions
//!
//! Timestamps are stored as RFC 3339 text in UTC with a fixed number of
//! fractional digits, so string comparison orders them chronologically.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per logical posting, keyed by its identity hash
CREATE TABLE IF NOT EXISTS postings (
    hash TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    title_folded TEXT NOT NULL,
    company TEXT NOT NULL,
    location TEXT NOT NULL DEFAULT '',
    salary TEXT NOT NULL DEFAULT '',
    posted_on TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    description_hash TEXT NOT NULL,
    url TEXT NOT NULL,
    source TEXT NOT NULL,
    apply_url TEXT NOT NULL DEFAULT '',
    experience TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    expire_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_postings_expire_at ON postings(expire_at);
CREATE INDEX IF NOT EXISTS idx_postings_title ON postings(title_folded);

-- Skill set of each posting
CREATE TABLE IF NOT EXISTS posting_skills (
    posting_hash TEXT NOT NULL REFERENCES postings(hash) ON DELETE CASCADE,
    skill TEXT NOT NULL,
    PRIMARY KEY (posting_hash, skill)
);

CREATE INDEX IF NOT EXISTS idx_posting_skills_skill ON posting_skills(skill);

-- One row per dispatcher invocation
CREATE TABLE IF NOT EXISTS crawl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    roles TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    stored_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
