//! Visits and the per-day metrics they feed.
//!
//! Every successful read of a published post appends one [`Visit`]. The same
//! operation bumps the post's [`PostMetricsDaily`] row for the UTC day:
//! `views` always, `unique_sessions` only for a session not yet seen on that
//! post that day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Request-derived attributes of a page view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitContext {
  pub session_id:  Option<String>,
  /// Hex digest of the client address; never the raw address.
  pub origin_hash: Option<String>,
  pub user_agent:  Option<String>,
  pub referrer:    Option<String>,
}

impl VisitContext {
  pub fn with_session(session_id: impl Into<String>) -> Self {
    Self { session_id: Some(session_id.into()), ..Self::default() }
  }

  /// The session id, treating an empty header value as absent.
  pub fn session(&self) -> Option<&str> {
    self.session_id.as_deref().filter(|s| !s.is_empty())
  }
}

/// An append-only page-view record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
  pub id:          i64,
  pub post_id:     i64,
  pub visited_at:  DateTime<Utc>,
  pub session_id:  Option<String>,
  pub origin_hash: Option<String>,
  pub user_agent:  Option<String>,
  pub referrer:    Option<String>,
}

/// Aggregate counters for one post on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetricsDaily {
  pub post_id:         i64,
  pub date:            NaiveDate,
  pub views:           i64,
  pub unique_sessions: i64,
  /// Maintained elsewhere; never touched by visit recording.
  pub likes:           i64,
  pub shares:          i64,
}

/// How much a visit adds to `unique_sessions`.
///
/// `already_counted` must come from the same transaction that applies the
/// increment.
pub fn unique_increment(session: Option<&str>, already_counted: bool) -> i64 {
  match session {
    Some(_) if !already_counted => 1,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_new_sessions_count() {
    assert_eq!(unique_increment(Some("s1"), false), 1);
    assert_eq!(unique_increment(Some("s1"), true), 0);
    assert_eq!(unique_increment(None, false), 0);
  }

  #[test]
  fn empty_session_header_is_no_session() {
    let ctx = VisitContext::with_session("");
    assert_eq!(ctx.session(), None);
    assert_eq!(VisitContext::with_session("abc").session(), Some("abc"));
  }
}
