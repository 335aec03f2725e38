//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the News-Harvester database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Configured news sources with their health fields
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    base_url TEXT NOT NULL,
    crawl_type TEXT NOT NULL,
    config TEXT NOT NULL DEFAULT '{}',
    active INTEGER NOT NULL DEFAULT 1,
    auto_detect INTEGER NOT NULL DEFAULT 1,
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    last_successful_crawl TEXT,
    last_crawl_article_count INTEGER NOT NULL DEFAULT 0,
    failure_reason TEXT,
    inactivity_detected_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sources_name ON sources(name);
CREATE INDEX IF NOT EXISTS idx_sources_active ON sources(active, deleted_at);

-- Harvested articles, one row per URL
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    source TEXT NOT NULL,
    content TEXT NOT NULL,
    keywords TEXT NOT NULL DEFAULT '',
    sentiment TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0,
    prob_negative REAL NOT NULL DEFAULT 0,
    prob_neutral REAL NOT NULL DEFAULT 0,
    prob_positive REAL NOT NULL DEFAULT 0,
    crawled_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_crawled_date ON articles(crawled_date);
CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);

-- Reachability of individual article URLs
CREATE TABLE IF NOT EXISTS link_status (
    url TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    failure_count INTEGER NOT NULL DEFAULT 0,
    last_checked TEXT NOT NULL,
    failure_reason TEXT,
    source TEXT
);

CREATE INDEX IF NOT EXISTS idx_link_status_status ON link_status(status);
CREATE INDEX IF NOT EXISTS idx_link_status_source ON link_status(source);
"#;

/// Initializes the database schema
///
/// Every statement uses `IF NOT EXISTS`, so this is safe to run on each startup.
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
