//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexicographic order matches chronological order. Dates are
//! `YYYY-MM-DD`. Enums use their SCREAMING_CASE wire names.
//!
//! Decoding happens while rows are read, so a malformed column surfaces as a
//! [`rusqlite::Error::FromSqlConversionFailure`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use folio_core::{
  category::Category,
  chapter::Chapter,
  media::MediaAsset,
  post::{Post, PostFields},
  visit::{PostMetricsDaily, Visit},
};
use rusqlite::{Row, types::Type};

// ─── Conversion failures ─────────────────────────────────────────────────────

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

fn get_dt(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  let raw: String = row.get(idx)?;
  decode_dt(&raw).map_err(|e| conversion_failure(idx, e))
}

fn get_opt_dt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
  let raw: Option<String> = row.get(idx)?;
  raw
    .as_deref()
    .map(decode_dt)
    .transpose()
    .map_err(|e| conversion_failure(idx, e))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
  let raw: String = row.get(idx)?;
  NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_failure(idx, e))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  let raw: String = row.get(idx)?;
  raw.parse().map_err(|e| conversion_failure(idx, e))
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Name of the Unicode-aware lowercase function registered on every
/// connection. SQLite's built-in `lower()` only folds ASCII.
pub const LOWER_FN: &str = "folio_lower";

/// Lowercased `LIKE` pattern matching `term` anywhere, with `%`, `_` and the
/// escape character itself taken literally. Use with `ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.to_lowercase().chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Row readers ─────────────────────────────────────────────────────────────
//
// Each reader matches the column list constant declared next to it.

pub const POST_COLUMNS: &str = "p.post_id, p.slug, p.title, p.summary, p.status,
  p.is_featured, p.scheduled_for, p.published_at, p.hero_media_id, p.meta_title,
  p.meta_description, p.reading_time_minutes, p.lang, p.author, p.created_at,
  p.updated_at";

/// Read a post row; chapters and categories are attached by the caller.
pub fn post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
  Ok(Post {
    id:         row.get(0)?,
    fields:     PostFields {
      slug:                 row.get(1)?,
      title:                row.get(2)?,
      summary:              row.get(3)?,
      status:               get_enum(row, 4)?,
      is_featured:          row.get(5)?,
      scheduled_for:        get_opt_dt(row, 6)?,
      published_at:         get_opt_dt(row, 7)?,
      hero_media_id:        row.get(8)?,
      meta_title:           row.get(9)?,
      meta_description:     row.get(10)?,
      reading_time_minutes: row.get(11)?,
      lang:                 row.get(12)?,
      author:               row.get(13)?,
    },
    created_at: get_dt(row, 14)?,
    updated_at: get_dt(row, 15)?,
    chapters:   Vec::new(),
    categories: Vec::new(),
  })
}

pub const CHAPTER_COLUMNS: &str = "chapter_id, post_id, position, chapter_type,
  title, text_content, media_id, external_video_url, caption, alt_text,
  created_at, updated_at";

pub fn chapter_row(row: &Row<'_>) -> rusqlite::Result<Chapter> {
  Ok(Chapter {
    id:                 row.get(0)?,
    post_id:            row.get(1)?,
    position:           row.get(2)?,
    chapter_type:       get_enum(row, 3)?,
    title:              row.get(4)?,
    text_content:       row.get(5)?,
    media_id:           row.get(6)?,
    external_video_url: row.get(7)?,
    caption:            row.get(8)?,
    alt_text:           row.get(9)?,
    created_at:         get_dt(row, 10)?,
    updated_at:         get_dt(row, 11)?,
  })
}

pub const CATEGORY_COLUMNS: &str =
  "c.category_id, c.name, c.slug, c.description, c.parent_id, c.created_at, c.updated_at";

pub fn category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
  Ok(Category {
    id:          row.get(0)?,
    name:        row.get(1)?,
    slug:        row.get(2)?,
    description: row.get(3)?,
    parent_id:   row.get(4)?,
    created_at:  get_dt(row, 5)?,
    updated_at:  get_dt(row, 6)?,
  })
}

pub const MEDIA_COLUMNS: &str = "media_id, kind, storage_provider, storage_path,
  mime_type, bytes, checksum, width, height, duration_seconds, uploader,
  created_at";

pub fn media_row(row: &Row<'_>) -> rusqlite::Result<MediaAsset> {
  Ok(MediaAsset {
    id:               row.get(0)?,
    kind:             get_enum(row, 1)?,
    storage_provider: get_enum(row, 2)?,
    storage_path:     row.get(3)?,
    mime_type:        row.get(4)?,
    bytes:            row.get(5)?,
    checksum:         row.get(6)?,
    width:            row.get(7)?,
    height:           row.get(8)?,
    duration_seconds: row.get(9)?,
    uploader:         row.get(10)?,
    created_at:       get_dt(row, 11)?,
  })
}

pub const VISIT_COLUMNS: &str =
  "visit_id, post_id, visited_at, session_id, origin_hash, user_agent, referrer";

pub fn visit_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
  Ok(Visit {
    id:          row.get(0)?,
    post_id:     row.get(1)?,
    visited_at:  get_dt(row, 2)?,
    session_id:  row.get(3)?,
    origin_hash: row.get(4)?,
    user_agent:  row.get(5)?,
    referrer:    row.get(6)?,
  })
}

pub const METRICS_COLUMNS: &str =
  "post_id, date, views, unique_sessions, likes, shares";

pub fn metrics_row(row: &Row<'_>) -> rusqlite::Result<PostMetricsDaily> {
  Ok(PostMetricsDaily {
    post_id:         row.get(0)?,
    date:            get_date(row, 1)?,
    views:           row.get(2)?,
    unique_sessions: row.get(3)?,
    likes:           row.get(4)?,
    shares:          row.get(5)?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexicographically() {
    let early = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let later = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    assert!(encode_dt(early) < encode_dt(later));
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }

  #[test]
  fn contains_pattern_escapes_wildcards() {
    assert_eq!(contains_pattern("Čevapi"), "%čevapi%");
    assert_eq!(contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
  }

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(encode_date(d), "2024-03-07");
  }
}
