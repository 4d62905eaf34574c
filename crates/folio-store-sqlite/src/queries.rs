//! Connection-level statements shared by the [`crate::SqliteStore`] methods.
//!
//! Everything here runs on the database thread, usually against an open
//! [`rusqlite::Transaction`] (which derefs to [`Connection`]).

use chrono::{DateTime, NaiveDate, Utc};
use folio_core::{
  category::Category,
  chapter::ChapterDraft,
  post::{Post, PostFields},
  visit::PostMetricsDaily,
};
use rusqlite::{Connection, OptionalExtension as _, Params, params};

use crate::encode::{
  CATEGORY_COLUMNS, CHAPTER_COLUMNS, METRICS_COLUMNS, POST_COLUMNS, category_row,
  chapter_row, encode_date, encode_dt, metrics_row, post_row,
};

// ─── Posts ───────────────────────────────────────────────────────────────────

/// Select posts with `tail` appended after `FROM posts p`, then attach each
/// post's chapters and categories.
pub fn select_posts<P: Params>(
  conn: &Connection,
  tail: &str,
  params: P,
) -> rusqlite::Result<Vec<Post>> {
  let sql = format!("SELECT {POST_COLUMNS} FROM posts p {tail}");
  let mut stmt = conn.prepare(&sql)?;
  let mut posts = stmt
    .query_map(params, post_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for post in &mut posts {
    post.chapters = select_chapters(conn, post.id)?;
    post.categories = select_post_categories(conn, post.id)?;
  }
  Ok(posts)
}

pub fn select_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Option<Post>> {
  Ok(select_posts(conn, "WHERE p.post_id = ?1", params![post_id])?.pop())
}

pub fn insert_post(
  conn: &Connection,
  fields: &PostFields,
  now: DateTime<Utc>,
) -> rusqlite::Result<i64> {
  let now = encode_dt(now);
  conn.execute(
    "INSERT INTO posts (
       slug, title, summary, status, is_featured, scheduled_for, published_at,
       hero_media_id, meta_title, meta_description, reading_time_minutes, lang,
       author, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
    params![
      fields.slug,
      fields.title,
      fields.summary,
      fields.status.as_str(),
      fields.is_featured,
      fields.scheduled_for.map(encode_dt),
      fields.published_at.map(encode_dt),
      fields.hero_media_id,
      fields.meta_title,
      fields.meta_description,
      fields.reading_time_minutes,
      fields.lang,
      fields.author,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn update_post(
  conn: &Connection,
  post_id: i64,
  fields: &PostFields,
  now: DateTime<Utc>,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE posts SET
       slug = ?2, title = ?3, summary = ?4, status = ?5, is_featured = ?6,
       scheduled_for = ?7, published_at = ?8, hero_media_id = ?9,
       meta_title = ?10, meta_description = ?11, reading_time_minutes = ?12,
       lang = ?13, updated_at = ?14
     WHERE post_id = ?1",
    params![
      post_id,
      fields.slug,
      fields.title,
      fields.summary,
      fields.status.as_str(),
      fields.is_featured,
      fields.scheduled_for.map(encode_dt),
      fields.published_at.map(encode_dt),
      fields.hero_media_id,
      fields.meta_title,
      fields.meta_description,
      fields.reading_time_minutes,
      fields.lang,
      encode_dt(now),
    ],
  )?;
  Ok(())
}

// ─── Chapters ────────────────────────────────────────────────────────────────

pub fn select_chapters(
  conn: &Connection,
  post_id: i64,
) -> rusqlite::Result<Vec<folio_core::chapter::Chapter>> {
  let sql = format!(
    "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE post_id = ?1
     ORDER BY position, chapter_id"
  );
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params![post_id], chapter_row)?
    .collect()
}

/// Drop every chapter of `post_id` and insert `drafts` in order.
pub fn replace_chapters(
  conn: &Connection,
  post_id: i64,
  drafts: &[ChapterDraft],
  now: DateTime<Utc>,
) -> rusqlite::Result<()> {
  let now = encode_dt(now);
  conn.execute("DELETE FROM chapters WHERE post_id = ?1", params![post_id])?;

  let mut stmt = conn.prepare(
    "INSERT INTO chapters (
       post_id, position, chapter_type, title, text_content, media_id,
       external_video_url, caption, alt_text, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
  )?;
  for draft in drafts {
    stmt.execute(params![
      post_id,
      draft.position,
      draft.chapter_type.as_str(),
      draft.title,
      draft.text_content,
      draft.media_id,
      draft.external_video_url,
      draft.caption,
      draft.alt_text,
      now,
    ])?;
  }
  Ok(())
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub fn select_categories<P: Params>(
  conn: &Connection,
  tail: &str,
  params: P,
) -> rusqlite::Result<Vec<Category>> {
  let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c {tail}");
  let mut stmt = conn.prepare(&sql)?;
  stmt.query_map(params, category_row)?.collect()
}

pub fn select_category(
  conn: &Connection,
  category_id: i64,
) -> rusqlite::Result<Option<Category>> {
  Ok(
    select_categories(conn, "WHERE c.category_id = ?1", params![category_id])?
      .pop(),
  )
}

fn select_post_categories(
  conn: &Connection,
  post_id: i64,
) -> rusqlite::Result<Vec<Category>> {
  select_categories(
    conn,
    "JOIN post_categories pc ON pc.category_id = c.category_id
     WHERE pc.post_id = ?1
     ORDER BY c.name, c.category_id",
    params![post_id],
  )
}

/// Replace the category set of `post_id` with the ids in `category_ids` that
/// resolve to an existing category. Unknown and repeated ids are skipped.
pub fn replace_categories(
  conn: &Connection,
  post_id: i64,
  category_ids: &[i64],
  now: DateTime<Utc>,
) -> rusqlite::Result<()> {
  let now = encode_dt(now);
  conn.execute(
    "DELETE FROM post_categories WHERE post_id = ?1",
    params![post_id],
  )?;

  let mut stmt = conn.prepare(
    "INSERT OR IGNORE INTO post_categories (post_id, category_id, assigned_at)
     SELECT ?1, category_id, ?3 FROM categories WHERE category_id = ?2",
  )?;
  for category_id in category_ids {
    stmt.execute(params![post_id, category_id, now])?;
  }
  Ok(())
}

// ─── Visits ──────────────────────────────────────────────────────────────────

pub fn post_exists(conn: &Connection, post_id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM posts WHERE post_id = ?1",
        params![post_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Whether `session_id` already has a visit on `post_id` during `date`.
pub fn session_seen_on(
  conn: &Connection,
  post_id: i64,
  session_id: &str,
  date: NaiveDate,
) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (
       SELECT 1 FROM visits
       WHERE post_id = ?1 AND session_id = ?2 AND visit_date = ?3
     )",
    params![post_id, session_id, encode_date(date)],
    |row| row.get(0),
  )
}

/// Create the metrics row for `(post_id, date)` if needed and add one view
/// plus `unique` unique sessions, as a single statement.
pub fn bump_metrics(
  conn: &Connection,
  post_id: i64,
  date: NaiveDate,
  unique: i64,
) -> rusqlite::Result<PostMetricsDaily> {
  let date = encode_date(date);
  conn.execute(
    "INSERT INTO post_metrics_daily (post_id, date, views, unique_sessions)
     VALUES (?1, ?2, 1, ?3)
     ON CONFLICT (post_id, date) DO UPDATE SET
       views           = views + 1,
       unique_sessions = unique_sessions + excluded.unique_sessions",
    params![post_id, date, unique],
  )?;
  conn.query_row(
    &format!(
      "SELECT {METRICS_COLUMNS} FROM post_metrics_daily
       WHERE post_id = ?1 AND date = ?2"
    ),
    params![post_id, date],
    metrics_row,
  )
}
