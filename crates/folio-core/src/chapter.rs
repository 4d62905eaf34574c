//! Chapters: ordered content blocks inside a post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{Error, Result};

/// What a chapter renders as.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChapterType {
  Text,
  Image,
  Video,
}

impl ChapterType {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A persisted chapter. Owned by exactly one post and deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
  pub id:                 i64,
  pub post_id:            i64,
  pub position:           i64,
  #[serde(rename = "type")]
  pub chapter_type:       ChapterType,
  pub title:              Option<String>,
  pub text_content:       Option<String>,
  pub media_id:           Option<i64>,
  pub external_video_url: Option<String>,
  pub caption:            Option<String>,
  pub alt_text:           Option<String>,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// A chapter payload as supplied by a write request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChapter {
  /// Explicit position; falls back to the payload's index in its list.
  pub position:           Option<i64>,
  #[serde(rename = "type")]
  pub chapter_type:       ChapterType,
  pub title:              Option<String>,
  pub text_content:       Option<String>,
  pub media_id:           Option<i64>,
  pub external_video_url: Option<String>,
  pub caption:            Option<String>,
  pub alt_text:           Option<String>,
}

impl NewChapter {
  pub fn new(chapter_type: ChapterType) -> Self {
    Self {
      position: None,
      chapter_type,
      title: None,
      text_content: None,
      media_id: None,
      external_video_url: None,
      caption: None,
      alt_text: None,
    }
  }

  pub fn text(content: impl Into<String>) -> Self {
    Self {
      text_content: Some(content.into()),
      ..Self::new(ChapterType::Text)
    }
  }

  pub fn at(mut self, position: i64) -> Self {
    self.position = Some(position);
    self
  }

  fn into_draft(self, fallback_position: i64) -> Result<ChapterDraft> {
    if self.chapter_type == ChapterType::Text && self.text_content.is_none() {
      return Err(Error::Validation(
        "text chapters must include text_content".to_owned(),
      ));
    }
    Ok(ChapterDraft {
      position:           self.position.unwrap_or(fallback_position),
      chapter_type:       self.chapter_type,
      title:              self.title,
      text_content:       self.text_content,
      media_id:           self.media_id,
      external_video_url: self.external_video_url,
      caption:            self.caption,
      alt_text:           self.alt_text,
    })
  }
}

/// A validated chapter with its final position, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
  pub position:           i64,
  pub chapter_type:       ChapterType,
  pub title:              Option<String>,
  pub text_content:       Option<String>,
  pub media_id:           Option<i64>,
  pub external_video_url: Option<String>,
  pub caption:            Option<String>,
  pub alt_text:           Option<String>,
}

/// Validate chapter payloads and assign positions.
///
/// Explicit positions are kept as given; duplicates and gaps are not
/// rejected. The whole list fails if any payload is invalid.
pub fn build_chapters(payloads: Vec<NewChapter>) -> Result<Vec<ChapterDraft>> {
  payloads
    .into_iter()
    .enumerate()
    .map(|(idx, payload)| payload.into_draft(idx as i64))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn positions_follow_input_order() {
    let drafts = build_chapters(vec![
      NewChapter::new(ChapterType::Image),
      NewChapter::text("x"),
    ])
    .unwrap();

    let positions: Vec<i64> = drafts.iter().map(|d| d.position).collect();
    assert_eq!(positions, [0, 1]);
    assert_eq!(drafts[0].chapter_type, ChapterType::Image);
    assert_eq!(drafts[1].text_content.as_deref(), Some("x"));
  }

  #[test]
  fn explicit_positions_are_kept_even_when_they_collide() {
    let drafts = build_chapters(vec![
      NewChapter::text("a").at(5),
      NewChapter::text("b"),
      NewChapter::text("c").at(5),
    ])
    .unwrap();

    let positions: Vec<i64> = drafts.iter().map(|d| d.position).collect();
    assert_eq!(positions, [5, 1, 5]);
  }

  #[test]
  fn text_chapter_without_content_is_rejected() {
    let err = build_chapters(vec![
      NewChapter::new(ChapterType::Image),
      NewChapter::new(ChapterType::Text),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn payload_type_field_is_named_type() {
    let c: NewChapter =
      serde_json::from_str(r#"{"type":"VIDEO","external_video_url":"https://v"}"#)
        .unwrap();
    assert_eq!(c.chapter_type, ChapterType::Video);
    assert_eq!(c.position, None);
  }
}
