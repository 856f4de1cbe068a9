//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::PageResult;
use crate::state::CrawlStatistics;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, seed_url, started_at, finished_at, config_hash, status, \
     pages_crawled, urls_discovered, duplicates_skipped, errors, robots_blocked, total_time_ms";

const PAGE_COLUMNS: &str = "id, run_id, url, depth, status_code, title, description, keywords, \
     content_hash, word_count, load_time_ms, crawled_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
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

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ToSql for RunStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.to_db_string().into())
    }
}

impl FromSql for RunStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        RunStatus::from_db_string(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown run status: {}", s).into()))
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: row.get(5)?,
        pages_crawled: row.get::<_, i64>(6)? as u64,
        urls_discovered: row.get::<_, i64>(7)? as u64,
        duplicates_skipped: row.get::<_, i64>(8)? as u64,
        errors: row.get::<_, i64>(9)? as u64,
        robots_blocked: row.get::<_, i64>(10)? as u64,
        total_time_ms: row.get::<_, i64>(11)? as u64,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let keywords: Option<String> = row.get(7)?;
    Ok(PageRecord {
        id: row.get(0)?,
        run_id: row.get(1)?,
        url: row.get(2)?,
        depth: row.get(3)?,
        status_code: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        keywords: keywords
            .map(|k| {
                k.split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        content_hash: row.get(8)?,
        word_count: row.get::<_, i64>(9)? as u64,
        load_time_ms: row.get::<_, i64>(10)? as u64,
        crawled_at: row.get(11)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed_url, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![seed_url, now, config_hash, RunStatus::Running],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &CrawlStatistics,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_crawled = ?3,
                 urls_discovered = ?4, duplicates_skipped = ?5, errors = ?6,
                 robots_blocked = ?7, total_time_ms = ?8
             WHERE id = ?9",
            params![
                status,
                now,
                stats.pages_crawled as i64,
                stats.urls_discovered as i64,
                stats.duplicates_skipped as i64,
                stats.errors as i64,
                stats.robots_blocked as i64,
                stats.total_time.as_millis() as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn record_page(&mut self, run_id: i64, page: &PageResult) -> StorageResult<i64> {
        let keywords = page.keywords.join(",");
        let images = page
            .images
            .iter()
            .map(|u| u.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO pages (run_id, url, depth, status_code, title, description, keywords,
                 content_hash, word_count, load_time_ms, crawled_at, text, images)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                run_id,
                page.url.as_str(),
                page.depth,
                page.status_code,
                page.title,
                page.description,
                keywords,
                page.content_hash,
                page.word_count as i64,
                page.load_time.as_millis() as i64,
                page.crawled_at.to_rfc3339(),
                page.text,
                images
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO links (run_id, from_page_id, to_url) VALUES (?1, ?2, ?3)",
            )?;
            for link in &page.links {
                stmt.execute(params![run_id, page_id, link.as_str()])?;
            }
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn list_pages(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT {} FROM pages WHERE run_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![run_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    // ===== Statistics =====

    fn count_pages(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_links(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_depth_breakdown(&self, run_id: i64) -> StorageResult<BTreeMap<u32, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT depth, COUNT(*) FROM pages WHERE run_id = ?1 GROUP BY depth")?;

        let mut breakdown = BTreeMap::new();
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (depth, count) = row?;
            breakdown.insert(depth, count as u64);
        }
        Ok(breakdown)
    }
}
