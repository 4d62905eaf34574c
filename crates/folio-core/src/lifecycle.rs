//! The post status guard.
//!
//! The guard does not restrict which transitions are allowed. It enforces two
//! invariants on the state being written:
//!
//! - a published post carries a `published_at` timestamp, stamped on the
//!   first publish and never moved afterwards;
//! - a scheduled post carries a `scheduled_for` timestamp.
//!
//! Stores run the guard inside the write transaction so a rejection aborts
//! the whole write.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  post::{PostFields, PostStatus},
};

pub const SCHEDULED_WITHOUT_TIMESTAMP: &str =
  "scheduled posts must include a scheduled_for timestamp";

/// Normalise `fields` for its status using the current time.
pub fn apply_status(fields: &mut PostFields) -> Result<()> {
  apply_status_at(fields, Utc::now())
}

/// [`apply_status`] with an explicit clock.
pub fn apply_status_at(fields: &mut PostFields, now: DateTime<Utc>) -> Result<()> {
  match fields.status {
    PostStatus::Published => {
      if fields.published_at.is_none() {
        fields.published_at = Some(now);
      }
    }
    PostStatus::Scheduled if fields.scheduled_for.is_none() => {
      return Err(Error::Validation(SCHEDULED_WITHOUT_TIMESTAMP.to_owned()));
    }
    PostStatus::Draft
    | PostStatus::Scheduled
    | PostStatus::Hidden
    | PostStatus::Archived => {}
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::post::NewPost;

  fn fields(status: PostStatus) -> PostFields {
    NewPost::new("p", "P").with_status(status).into_parts().0
  }

  fn t(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn first_publish_stamps_published_at() {
    let mut f = fields(PostStatus::Published);
    apply_status_at(&mut f, t(1_000)).unwrap();
    assert_eq!(f.published_at, Some(t(1_000)));
  }

  #[test]
  fn republish_keeps_original_timestamp() {
    let mut f = fields(PostStatus::Published);
    apply_status_at(&mut f, t(1_000)).unwrap();
    apply_status_at(&mut f, t(2_000)).unwrap();
    assert_eq!(f.published_at, Some(t(1_000)));
  }

  #[test]
  fn unpublish_and_republish_keeps_original_timestamp() {
    let mut f = fields(PostStatus::Published);
    apply_status_at(&mut f, t(1_000)).unwrap();

    f.status = PostStatus::Draft;
    apply_status_at(&mut f, t(2_000)).unwrap();
    f.status = PostStatus::Published;
    apply_status_at(&mut f, t(3_000)).unwrap();

    assert_eq!(f.published_at, Some(t(1_000)));
  }

  #[test]
  fn scheduled_without_timestamp_is_rejected() {
    let mut f = fields(PostStatus::Scheduled);
    let err = apply_status_at(&mut f, t(0)).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == SCHEDULED_WITHOUT_TIMESTAMP));
  }

  #[test]
  fn scheduled_with_timestamp_is_accepted() {
    let mut f = fields(PostStatus::Scheduled);
    f.scheduled_for = Some(Utc::now() + Duration::days(1));
    apply_status_at(&mut f, t(0)).unwrap();
    assert_eq!(f.published_at, None);
  }

  #[test]
  fn other_statuses_have_no_side_effects() {
    for status in [PostStatus::Draft, PostStatus::Hidden, PostStatus::Archived] {
      let mut f = fields(status);
      let before = f.clone();
      apply_status(&mut f).unwrap();
      assert_eq!(f, before, "{status:?}");
    }
  }
}
