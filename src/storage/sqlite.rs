//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::enrich::SentimentScore;
use crate::state::{CrawlType, LinkState, SourceConfig, SourceHealth};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    from_db_time, to_db_time, ArticleRecord, LinkStatusRecord, NewSource, SourceRecord,
    SourceUpdate, UpsertOutcome,
};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const SOURCE_COLUMNS: &str = "id, name, base_url, crawl_type, config, active, auto_detect, \
     consecutive_failures, last_successful_crawl, last_crawl_article_count, failure_reason, \
     inactivity_detected_at, created_at, updated_at, deleted_at";

const ARTICLE_COLUMNS: &str = "url, title, source, content, keywords, sentiment, confidence, \
     prob_negative, prob_neutral, prob_positive, crawled_date";

const LINK_COLUMNS: &str = "url, status, failure_count, last_checked, failure_reason, source";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and ensures the schema exists
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }

    fn query_sources(&self, filter: &str) -> StorageResult<Vec<SourceRecord>> {
        let sql = format!("SELECT {} FROM sources {} ORDER BY id", SOURCE_COLUMNS, filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], raw_source_row)?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row?.into_record()?);
        }
        Ok(sources)
    }

    fn query_source(&self, filter: &str, param: &dyn rusqlite::ToSql) -> StorageResult<Option<SourceRecord>> {
        let sql = format!("SELECT {} FROM sources {} ORDER BY id LIMIT 1", SOURCE_COLUMNS, filter);
        let raw = self
            .conn
            .query_row(&sql, [param], raw_source_row)
            .optional()?;

        raw.map(RawSource::into_record).transpose()
    }
}

/// Source row before JSON and enum decoding
struct RawSource {
    id: i64,
    name: String,
    base_url: String,
    crawl_type: String,
    config: String,
    active: bool,
    auto_detect: bool,
    consecutive_failures: u32,
    last_successful_crawl: Option<String>,
    last_crawl_article_count: u32,
    failure_reason: Option<String>,
    inactivity_detected_at: Option<String>,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

fn raw_source_row(row: &Row<'_>) -> rusqlite::Result<RawSource> {
    Ok(RawSource {
        id: row.get(0)?,
        name: row.get(1)?,
        base_url: row.get(2)?,
        crawl_type: row.get(3)?,
        config: row.get(4)?,
        active: row.get(5)?,
        auto_detect: row.get(6)?,
        consecutive_failures: row.get(7)?,
        last_successful_crawl: row.get(8)?,
        last_crawl_article_count: row.get(9)?,
        failure_reason: row.get(10)?,
        inactivity_detected_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        deleted_at: row.get(14)?,
    })
}

impl RawSource {
    fn into_record(self) -> StorageResult<SourceRecord> {
        let config: SourceConfig = serde_json::from_str(&self.config)?;
        let crawl_type = CrawlType::from_db_string(&self.crawl_type).ok_or_else(|| {
            StorageError::Database(format!("Unknown crawl type '{}'", self.crawl_type))
        })?;
        let created_at = parse_time(&self.created_at)?;
        let updated_at = parse_time(&self.updated_at)?;

        Ok(SourceRecord {
            id: self.id,
            name: self.name,
            base_url: self.base_url,
            crawl_type,
            config,
            auto_detect: self.auto_detect,
            health: SourceHealth {
                active: self.active,
                consecutive_failures: self.consecutive_failures,
                last_successful_crawl: self.last_successful_crawl.as_deref().and_then(from_db_time),
                last_crawl_article_count: self.last_crawl_article_count,
                failure_reason: self.failure_reason,
                inactivity_detected_at: self.inactivity_detected_at.as_deref().and_then(from_db_time),
            },
            created_at,
            updated_at,
            deleted_at: self.deleted_at.as_deref().and_then(from_db_time),
        })
    }
}

fn parse_time(s: &str) -> StorageResult<DateTime<Utc>> {
    from_db_time(s).ok_or_else(|| StorageError::Database(format!("Invalid timestamp '{}'", s)))
}

fn article_row(row: &Row<'_>) -> rusqlite::Result<(ArticleRecord, String)> {
    let crawled_date: String = row.get(10)?;
    Ok((
        ArticleRecord {
            url: row.get(0)?,
            title: row.get(1)?,
            source: row.get(2)?,
            content: row.get(3)?,
            keywords: row.get(4)?,
            sentiment: SentimentScore {
                label: row.get(5)?,
                confidence: row.get(6)?,
                prob_negative: row.get(7)?,
                prob_neutral: row.get(8)?,
                prob_positive: row.get(9)?,
            },
            crawled_date: Utc::now(),
        },
        crawled_date,
    ))
}

fn link_row(row: &Row<'_>) -> rusqlite::Result<(LinkStatusRecord, String, String)> {
    let status: String = row.get(1)?;
    let last_checked: String = row.get(3)?;
    Ok((
        LinkStatusRecord {
            url: row.get(0)?,
            state: LinkState::Inactive,
            failure_count: row.get(2)?,
            last_checked: Utc::now(),
            failure_reason: row.get(4)?,
            source: row.get(5)?,
        },
        status,
        last_checked,
    ))
}

fn finish_link(raw: (LinkStatusRecord, String, String)) -> StorageResult<LinkStatusRecord> {
    let (mut record, status, last_checked) = raw;
    record.state = LinkState::from_db_string(&status)
        .ok_or_else(|| StorageError::Database(format!("Unknown link status '{}'", status)))?;
    record.last_checked = parse_time(&last_checked)?;
    Ok(record)
}

impl Storage for SqliteStorage {
    // ===== Sources =====

    fn insert_source(&mut self, source: &NewSource) -> StorageResult<i64> {
        let now = to_db_time(Utc::now());
        let config = serde_json::to_string(&source.config)?;
        self.conn.execute(
            "INSERT INTO sources (name, base_url, crawl_type, config, active, auto_detect, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                source.name,
                source.base_url,
                source.crawl_type.to_db_string(),
                config,
                source.active,
                source.auto_detect,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_source(&self, id: i64) -> StorageResult<Option<SourceRecord>> {
        self.query_source("WHERE id = ?1", &id)
    }

    fn get_source_by_name(&self, name: &str) -> StorageResult<Option<SourceRecord>> {
        self.query_source("WHERE name = ?1", &name)
    }

    fn list_sources(&self) -> StorageResult<Vec<SourceRecord>> {
        self.query_sources("WHERE deleted_at IS NULL")
    }

    fn list_active_sources(&self) -> StorageResult<Vec<SourceRecord>> {
        self.query_sources("WHERE deleted_at IS NULL AND active = 1")
    }

    fn list_inactive_sources(&self) -> StorageResult<Vec<SourceRecord>> {
        self.query_sources("WHERE deleted_at IS NULL AND active = 0")
    }

    fn update_source(&mut self, id: i64, update: &SourceUpdate) -> StorageResult<bool> {
        let Some(mut current) = self.get_source(id)? else {
            return Ok(false);
        };

        if let Some(name) = &update.name {
            current.name = name.clone();
        }
        if let Some(base_url) = &update.base_url {
            current.base_url = base_url.clone();
        }
        if let Some(crawl_type) = update.crawl_type {
            current.crawl_type = crawl_type;
        }
        if let Some(config) = &update.config {
            current.config = config.clone();
        }
        if let Some(active) = update.active {
            current.health.active = active;
        }
        if let Some(auto_detect) = update.auto_detect {
            current.auto_detect = auto_detect;
        }

        let config = serde_json::to_string(&current.config)?;
        self.conn.execute(
            "UPDATE sources SET name = ?1, base_url = ?2, crawl_type = ?3, config = ?4,
                    active = ?5, auto_detect = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                current.name,
                current.base_url,
                current.crawl_type.to_db_string(),
                config,
                current.health.active,
                current.auto_detect,
                to_db_time(Utc::now()),
                id
            ],
        )?;
        Ok(true)
    }

    fn save_source_health(&mut self, id: i64, health: &SourceHealth) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE sources SET active = ?1, consecutive_failures = ?2, last_successful_crawl = ?3,
                    last_crawl_article_count = ?4, failure_reason = ?5, inactivity_detected_at = ?6,
                    updated_at = ?7
             WHERE id = ?8",
            params![
                health.active,
                health.consecutive_failures,
                health.last_successful_crawl.map(to_db_time),
                health.last_crawl_article_count,
                health.failure_reason,
                health.inactivity_detected_at.map(to_db_time),
                to_db_time(Utc::now()),
                id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::SourceNotFound(id));
        }
        Ok(())
    }

    fn soft_delete_source(&mut self, id: i64) -> StorageResult<bool> {
        let now = to_db_time(Utc::now());
        let changed = self.conn.execute(
            "UPDATE sources SET deleted_at = ?1, active = 0, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(changed > 0)
    }

    // ===== Articles =====

    fn upsert_article(&mut self, article: &ArticleRecord) -> StorageResult<UpsertOutcome> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?1)",
            params![article.url],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT INTO articles (url, title, source, content, keywords, sentiment, confidence,
                                   prob_negative, prob_neutral, prob_positive, crawled_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                source = excluded.source,
                content = excluded.content,
                keywords = excluded.keywords,
                sentiment = excluded.sentiment,
                confidence = excluded.confidence,
                prob_negative = excluded.prob_negative,
                prob_neutral = excluded.prob_neutral,
                prob_positive = excluded.prob_positive,
                crawled_date = excluded.crawled_date",
            params![
                article.url,
                article.title,
                article.source,
                article.content,
                article.keywords,
                article.sentiment.label,
                article.sentiment.confidence,
                article.sentiment.prob_negative,
                article.sentiment.prob_neutral,
                article.sentiment.prob_positive,
                to_db_time(article.crawled_date)
            ],
        )?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_article(&self, url: &str) -> StorageResult<Option<ArticleRecord>> {
        let sql = format!("SELECT {} FROM articles WHERE url = ?1", ARTICLE_COLUMNS);
        let raw = self.conn.query_row(&sql, params![url], article_row).optional()?;

        match raw {
            Some((mut article, crawled_date)) => {
                article.crawled_date = parse_time(&crawled_date)?;
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn delete_articles_before(&mut self, cutoff: DateTime<Utc>) -> StorageResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM articles WHERE crawled_date < ?1",
            params![to_db_time(cutoff)],
        )?;
        Ok(deleted)
    }

    fn latest_crawled_date(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(crawled_date) FROM articles", [], |row| row.get(0))?;
        latest.as_deref().map(parse_time).transpose()
    }

    fn count_articles_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE crawled_date >= ?1 AND crawled_date <= ?2",
            params![to_db_time(from), to_db_time(to)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Link status =====

    fn get_link_status(&self, url: &str) -> StorageResult<Option<LinkStatusRecord>> {
        let sql = format!("SELECT {} FROM link_status WHERE url = ?1", LINK_COLUMNS);
        let raw = self.conn.query_row(&sql, params![url], link_row).optional()?;
        raw.map(finish_link).transpose()
    }

    fn record_link_failure(
        &mut self,
        url: &str,
        state: LinkState,
        reason: &str,
        source: Option<&str>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO link_status (url, status, failure_count, last_checked, failure_reason, source)
             VALUES (?1, ?2, 1, ?3, ?4, ?5)
             ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                failure_count = link_status.failure_count + 1,
                last_checked = excluded.last_checked,
                failure_reason = excluded.failure_reason,
                source = COALESCE(excluded.source, link_status.source)",
            params![url, state.to_db_string(), to_db_time(Utc::now()), reason, source],
        )?;
        Ok(())
    }

    fn record_link_success(&mut self, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE link_status SET status = ?1, failure_count = 0, failure_reason = NULL, last_checked = ?2
             WHERE url = ?3",
            params![LinkState::Active.to_db_string(), to_db_time(Utc::now()), url],
        )?;
        Ok(())
    }

    fn delete_link_status(&mut self, url: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM link_status WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }

    fn clear_link_statuses(&mut self) -> StorageResult<usize> {
        Ok(self.conn.execute("DELETE FROM link_status", [])?)
    }

    fn count_links_by_state(&self) -> StorageResult<HashMap<LinkState, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM link_status GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = HashMap::new();
        for row in rows {
            let (status, count) = row?;
            if let Some(state) = LinkState::from_db_string(&status) {
                counts.insert(state, count as u64);
            }
        }
        Ok(counts)
    }

    fn list_failed_links(&self, source: Option<&str>) -> StorageResult<Vec<LinkStatusRecord>> {
        let sql = format!(
            "SELECT {} FROM link_status WHERE status != 'active' AND (?1 IS NULL OR source = ?1)
             ORDER BY last_checked DESC",
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![source], link_row)?;

        let mut links = Vec::new();
        for row in rows {
            links.push(finish_link(row?)?);
        }
        Ok(links)
    }
}
