//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::posting::JobPosting;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CountResult, RunRecord, RunStatus, TrendField};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

const POSTING_COLUMNS: &str = "hash, title, company, location, salary, posted_on, description,
     description_hash, url, source, apply_url, experience, created_at, last_updated, expire_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_skills(&self, hash: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT skill FROM posting_skills WHERE posting_hash = ?1 ORDER BY skill")?;
        let skills = stmt
            .query_map(params![hash], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(skills)
    }
}

/// Formats a timestamp for storage
fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn from_db_time(text: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp(format!("{}: {}", text, e)))
}

fn required_time(value: Option<DateTime<Utc>>, field: &str) -> StorageResult<String> {
    value
        .as_ref()
        .map(to_db_time)
        .ok_or_else(|| StorageError::InvalidTimestamp(format!("posting has no {}", field)))
}

/// Column values of a `postings` row before timestamp conversion
struct PostingRow {
    hash: String,
    title: String,
    company: String,
    location: String,
    salary: String,
    posted_on: String,
    description: String,
    description_hash: String,
    url: String,
    source: String,
    apply_url: String,
    experience: String,
    created_at: String,
    last_updated: String,
    expire_at: String,
}

impl PostingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            title: row.get(1)?,
            company: row.get(2)?,
            location: row.get(3)?,
            salary: row.get(4)?,
            posted_on: row.get(5)?,
            description: row.get(6)?,
            description_hash: row.get(7)?,
            url: row.get(8)?,
            source: row.get(9)?,
            apply_url: row.get(10)?,
            experience: row.get(11)?,
            created_at: row.get(12)?,
            last_updated: row.get(13)?,
            expire_at: row.get(14)?,
        })
    }

    fn into_posting(self, skills: Vec<String>) -> StorageResult<JobPosting> {
        Ok(JobPosting {
            posted_on: from_db_time(&self.posted_on)?,
            created_at: Some(from_db_time(&self.created_at)?),
            last_updated: Some(from_db_time(&self.last_updated)?),
            expire_at: Some(from_db_time(&self.expire_at)?),
            hash: self.hash,
            title: self.title,
            company: self.company,
            location: self.location,
            salary: self.salary,
            description: self.description,
            description_hash: self.description_hash,
            url: self.url,
            source: self.source,
            apply_url: self.apply_url,
            experience: self.experience,
            skills: skills.into_iter().collect(),
        })
    }
}

fn write_skills(tx: &Transaction<'_>, posting: &JobPosting) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM posting_skills WHERE posting_hash = ?1",
        params![posting.hash],
    )?;

    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO posting_skills (posting_hash, skill) VALUES (?1, ?2)")?;
    for skill in &posting.skills {
        stmt.execute(params![posting.hash, skill])?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Postings =====

    fn find_posting(&self, hash: &str) -> StorageResult<Option<JobPosting>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM postings WHERE hash = ?1", POSTING_COLUMNS),
                params![hash],
                PostingRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let skills = self.load_skills(hash)?;
                Ok(Some(row.into_posting(skills)?))
            }
            None => Ok(None),
        }
    }

    fn insert_posting(&mut self, posting: &JobPosting) -> StorageResult<()> {
        let created_at = required_time(posting.created_at, "created_at")?;
        let last_updated = required_time(posting.last_updated, "last_updated")?;
        let expire_at = required_time(posting.expire_at, "expire_at")?;

        let tx = self.conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO postings ({}, title_folded)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                POSTING_COLUMNS
            ),
            params![
                posting.hash,
                posting.title,
                posting.company,
                posting.location,
                posting.salary,
                to_db_time(&posting.posted_on),
                posting.description,
                posting.description_hash,
                posting.url,
                posting.source,
                posting.apply_url,
                posting.experience,
                created_at,
                last_updated,
                expire_at,
                posting.title.to_lowercase(),
            ],
        )?;
        write_skills(&tx, posting)?;
        tx.commit()?;

        Ok(())
    }

    fn replace_posting(&mut self, posting: &JobPosting) -> StorageResult<()> {
        let created_at = required_time(posting.created_at, "created_at")?;
        let last_updated = required_time(posting.last_updated, "last_updated")?;
        let expire_at = required_time(posting.expire_at, "expire_at")?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE postings SET
                title = ?2, company = ?3, location = ?4, salary = ?5, posted_on = ?6,
                description = ?7, description_hash = ?8, url = ?9, source = ?10,
                apply_url = ?11, experience = ?12, created_at = ?13, last_updated = ?14,
                expire_at = ?15, title_folded = ?16
             WHERE hash = ?1",
            params![
                posting.hash,
                posting.title,
                posting.company,
                posting.location,
                posting.salary,
                to_db_time(&posting.posted_on),
                posting.description,
                posting.description_hash,
                posting.url,
                posting.source,
                posting.apply_url,
                posting.experience,
                created_at,
                last_updated,
                expire_at,
                posting.title.to_lowercase(),
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(posting.hash.clone()));
        }

        write_skills(&tx, posting)?;
        tx.commit()?;

        Ok(())
    }

    fn touch_posting(&mut self, hash: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE postings SET last_updated = ?1 WHERE hash = ?2",
            params![to_db_time(&at), hash],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(hash.to_string()));
        }
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> StorageResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM postings WHERE expire_at <= ?1",
            params![to_db_time(&now)],
        )?;
        Ok(removed)
    }

    fn count_postings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, roles: &[String], config_hash: &str) -> StorageResult<i64> {
        let now = to_db_time(&Utc::now());
        self.conn.execute(
            "INSERT INTO crawl_runs (started_at, roles, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                roles.join(","),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        stored: usize,
        status: RunStatus,
    ) -> StorageResult<()> {
        let now = to_db_time(&Utc::now());
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, stored_count = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, stored as i64, run_id],
        )?;
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, roles, config_hash, stored_count, status
                 FROM crawl_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    let roles: String = row.get(3)?;
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        roles: roles
                            .split(',')
                            .filter(|r| !r.is_empty())
                            .map(str::to_string)
                            .collect(),
                        config_hash: row.get(4)?,
                        stored_count: row.get(5)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
                            .unwrap_or(RunStatus::Running),
                    })
                },
            )
            .optional()?;

        Ok(run)
    }

    // ===== Reporting =====

    fn top_values(
        &self,
        field: TrendField,
        title_filter: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<CountResult>> {
        let (value_expr, from) = match field {
            TrendField::Skills => (
                "s.skill",
                "posting_skills s JOIN postings p ON p.hash = s.posting_hash",
            ),
            TrendField::Location => ("p.location", "postings p"),
            TrendField::Company => ("p.company", "postings p"),
            TrendField::Experience => ("p.experience", "postings p"),
        };

        let sql = format!(
            "SELECT {value} AS value, COUNT(*) AS n FROM {from}
             WHERE {value} <> ''
               AND (?1 IS NULL OR p.title_folded LIKE ?1 ESCAPE '\\')
             GROUP BY {value}
             ORDER BY n DESC, value ASC
             LIMIT ?2",
            value = value_expr,
            from = from,
        );

        let pattern = title_filter
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| like_pattern(&t.to_lowercase()));

        let mut stmt = self.conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(CountResult {
                    value: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }
}

/// Builds a `LIKE` pattern matching `needle` anywhere, with wildcards escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
