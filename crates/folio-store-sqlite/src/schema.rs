//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS media_assets (
    media_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    kind             TEXT NOT NULL,    -- 'IMAGE' | 'VIDEO' | 'FILE'
    storage_provider TEXT NOT NULL,    -- 'DB' | 'GDRIVE' | 'EXTERNAL' | 'LOCAL'
    storage_path     TEXT NOT NULL,
    mime_type        TEXT,
    bytes            INTEGER,
    checksum         TEXT,             -- SHA-256 hex
    width            INTEGER,
    height           INTEGER,
    duration_seconds INTEGER,
    uploader         TEXT,             -- admin subject
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id              INTEGER PRIMARY KEY AUTOINCREMENT,
    slug                 TEXT NOT NULL UNIQUE,
    title                TEXT NOT NULL,
    summary              TEXT,
    status               TEXT NOT NULL DEFAULT 'DRAFT',
    is_featured          INTEGER NOT NULL DEFAULT 0,
    scheduled_for        TEXT,
    published_at         TEXT,
    hero_media_id        INTEGER REFERENCES media_assets(media_id) ON DELETE SET NULL,
    meta_title           TEXT,
    meta_description     TEXT,
    reading_time_minutes INTEGER,
    lang                 TEXT,
    author               TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    CHECK (status IN ('DRAFT', 'SCHEDULED', 'PUBLISHED', 'HIDDEN', 'ARCHIVED')),
    CHECK (status <> 'SCHEDULED' OR scheduled_for IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS chapters (
    chapter_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id            INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    position           INTEGER NOT NULL,
    chapter_type       TEXT NOT NULL,
    title              TEXT,
    text_content       TEXT,
    media_id           INTEGER REFERENCES media_assets(media_id) ON DELETE SET NULL,
    external_video_url TEXT,
    caption            TEXT,
    alt_text           TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    CHECK (chapter_type IN ('TEXT', 'IMAGE', 'VIDEO')),
    CHECK (chapter_type <> 'TEXT' OR text_content IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS categories (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT,
    parent_id   INTEGER REFERENCES categories(category_id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS post_categories (
    post_id     INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES categories(category_id) ON DELETE CASCADE,
    assigned_at TEXT NOT NULL,
    PRIMARY KEY (post_id, category_id)
);

-- Visits are strictly append-only.
CREATE TABLE IF NOT EXISTS visits (
    visit_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id     INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    visited_at  TEXT NOT NULL,   -- RFC 3339 UTC
    visit_date  TEXT NOT NULL,   -- UTC calendar day of visited_at, YYYY-MM-DD
    session_id  TEXT,
    origin_hash TEXT,
    user_agent  TEXT,
    referrer    TEXT
);

-- One row per post per UTC day; counters only ever grow.
CREATE TABLE IF NOT EXISTS post_metrics_daily (
    post_id         INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    date            TEXT NOT NULL,
    views           INTEGER NOT NULL DEFAULT 0,
    unique_sessions INTEGER NOT NULL DEFAULT 0,
    likes           INTEGER NOT NULL DEFAULT 0,
    shares          INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (post_id, date)
);

CREATE INDEX IF NOT EXISTS posts_status_idx          ON posts(status);
CREATE INDEX IF NOT EXISTS posts_published_idx       ON posts(published_at);
CREATE INDEX IF NOT EXISTS chapters_post_pos_idx     ON chapters(post_id, position);
CREATE INDEX IF NOT EXISTS post_categories_cat_idx   ON post_categories(category_id);
CREATE INDEX IF NOT EXISTS visits_post_time_idx      ON visits(post_id, visited_at);
CREATE INDEX IF NOT EXISTS visits_session_day_idx    ON visits(post_id, session_id, visit_date);

PRAGMA user_version = 1;
";
