//! Posts: the publishable unit of the blog.
//!
//! A post's scalar columns live in [`PostFields`]; the persisted [`Post`]
//! wraps them with identity, timestamps, chapters and categories. Write
//! requests arrive as [`NewPost`] (create) or [`PostPatch`] (partial update)
//! and are folded into a `PostFields` before the status guard runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{
  category::Category,
  chapter::{Chapter, NewChapter},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Publication state of a post. Any transition is allowed; see
/// [`crate::lifecycle::apply_status`] for the invariants that are enforced.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
  #[default]
  Draft,
  Scheduled,
  Published,
  Hidden,
  Archived,
}

impl PostStatus {
  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The mutable scalar columns of a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFields {
  pub slug:                 String,
  pub title:                String,
  pub summary:              Option<String>,
  pub status:               PostStatus,
  pub is_featured:          bool,
  /// Required iff `status` is [`PostStatus::Scheduled`].
  pub scheduled_for:        Option<DateTime<Utc>>,
  /// Set once, on the first write that leaves the post published.
  pub published_at:         Option<DateTime<Utc>>,
  pub hero_media_id:        Option<i64>,
  pub meta_title:           Option<String>,
  pub meta_description:     Option<String>,
  pub reading_time_minutes: Option<i32>,
  pub lang:                 Option<String>,
  /// Subject of the admin who created the post.
  pub author:               Option<String>,
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A persisted post with its chapters (ordered by position) and categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub id:         i64,
  #[serde(flatten)]
  pub fields:     PostFields,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub chapters:   Vec<Chapter>,
  pub categories: Vec<Category>,
}

impl Post {
  pub fn slug(&self) -> &str { &self.fields.slug }

  pub fn status(&self) -> PostStatus { self.fields.status }

  pub fn category_ids(&self) -> Vec<i64> {
    self.categories.iter().map(|c| c.id).collect()
  }
}

// ─── NewPost ─────────────────────────────────────────────────────────────────

fn default_lang() -> Option<String> { Some("hr".to_owned()) }

/// Body of a create request. Chapters without an explicit `position` are
/// placed by their index in `chapters`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
  pub slug:                 String,
  pub title:                String,
  pub summary:              Option<String>,
  #[serde(default)]
  pub status:               PostStatus,
  #[serde(default)]
  pub is_featured:          bool,
  pub scheduled_for:        Option<DateTime<Utc>>,
  pub published_at:         Option<DateTime<Utc>>,
  pub hero_media_id:        Option<i64>,
  pub meta_title:           Option<String>,
  pub meta_description:     Option<String>,
  pub reading_time_minutes: Option<i32>,
  #[serde(default = "default_lang")]
  pub lang:                 Option<String>,
  /// Defaults to the subject of the token that created the post.
  pub author:               Option<String>,
  #[serde(default)]
  pub chapters:             Vec<NewChapter>,
  #[serde(default)]
  pub category_ids:         Vec<i64>,
}

impl NewPost {
  /// A draft with no chapters and no categories.
  pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      slug:                 slug.into(),
      title:                title.into(),
      summary:              None,
      status:               PostStatus::default(),
      is_featured:          false,
      scheduled_for:        None,
      published_at:         None,
      hero_media_id:        None,
      meta_title:           None,
      meta_description:     None,
      reading_time_minutes: None,
      lang:                 default_lang(),
      author:               None,
      chapters:             Vec::new(),
      category_ids:         Vec::new(),
    }
  }

  pub fn with_status(mut self, status: PostStatus) -> Self {
    self.status = status;
    self
  }

  /// Credit `author` unless the payload already named someone.
  pub fn or_author(mut self, author: &str) -> Self {
    self.author.get_or_insert_with(|| author.to_owned());
    self
  }

  /// Split into the scalar columns, the chapter payloads and the category
  /// ids.
  pub fn into_parts(self) -> (PostFields, Vec<NewChapter>, Vec<i64>) {
    let fields = PostFields {
      slug:                 self.slug,
      title:                self.title,
      summary:              self.summary,
      status:               self.status,
      is_featured:          self.is_featured,
      scheduled_for:        self.scheduled_for,
      published_at:         self.published_at,
      hero_media_id:        self.hero_media_id,
      meta_title:           self.meta_title,
      meta_description:     self.meta_description,
      reading_time_minutes: self.reading_time_minutes,
      lang:                 self.lang,
      author:               self.author,
    };
    (fields, self.chapters, self.category_ids)
  }
}

// ─── PostPatch ───────────────────────────────────────────────────────────────

/// Deserialise a present field (including an explicit `null`) as `Some`, so
/// that an absent field stays `None`.
pub(crate) fn nullable<'de, D, T>(
  deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of a partial update. Absent fields are left unchanged; for nullable
/// columns an explicit `null` clears the value.
///
/// `published_at` is not patchable: it is owned by the status guard once set.
/// Neither is `author`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
  pub slug:                 Option<String>,
  pub title:                Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub summary:              Option<Option<String>>,
  pub status:               Option<PostStatus>,
  pub is_featured:          Option<bool>,
  #[serde(default, deserialize_with = "nullable")]
  pub scheduled_for:        Option<Option<DateTime<Utc>>>,
  #[serde(default, deserialize_with = "nullable")]
  pub hero_media_id:        Option<Option<i64>>,
  #[serde(default, deserialize_with = "nullable")]
  pub meta_title:           Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub meta_description:     Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub reading_time_minutes: Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub lang:                 Option<Option<String>>,
  /// Replaces the whole chapter list when present.
  pub chapters:             Option<Vec<NewChapter>>,
  /// Replaces the whole category set when present.
  pub category_ids:         Option<Vec<i64>>,
}

impl PostPatch {
  /// Apply the scalar part of the patch to `fields` and hand back the
  /// collection replacements for the caller to persist.
  pub fn apply(
    self,
    fields: &mut PostFields,
  ) -> (Option<Vec<NewChapter>>, Option<Vec<i64>>) {
    if let Some(v) = self.slug {
      fields.slug = v;
    }
    if let Some(v) = self.title {
      fields.title = v;
    }
    if let Some(v) = self.summary {
      fields.summary = v;
    }
    if let Some(v) = self.status {
      fields.status = v;
    }
    if let Some(v) = self.is_featured {
      fields.is_featured = v;
    }
    if let Some(v) = self.scheduled_for {
      fields.scheduled_for = v;
    }
    if let Some(v) = self.hero_media_id {
      fields.hero_media_id = v;
    }
    if let Some(v) = self.meta_title {
      fields.meta_title = v;
    }
    if let Some(v) = self.meta_description {
      fields.meta_description = v;
    }
    if let Some(v) = self.reading_time_minutes {
      fields.reading_time_minutes = v;
    }
    if let Some(v) = self.lang {
      fields.lang = v;
    }
    (self.chapters, self.category_ids)
  }
}
