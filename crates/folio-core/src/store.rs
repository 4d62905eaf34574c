//! The `BlogStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//! Each method is one unit of work: it either commits as a whole or leaves
//! the store unchanged.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  category::{Category, CategoryPatch, NewCategory},
  error::Classify,
  media::{MediaAsset, NewMediaAsset},
  post::{NewPost, Post, PostPatch},
  visit::{PostMetricsDaily, Visit, VisitContext},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filters for [`BlogStore::list_published`]. All filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
  /// Restrict to posts in the category with this slug.
  pub category:         Option<String>,
  /// Case-insensitive substring match over title or summary.
  pub search:           Option<String>,
  pub published_before: Option<DateTime<Utc>>,
  pub published_after:  Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Folio storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BlogStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Posts: writes ────────────────────────────────────────────────────

  /// Persist a new post with its chapters and categories.
  ///
  /// Runs the status guard; a validation failure writes nothing.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Apply a partial update. Chapters and categories are replaced wholesale
  /// when the patch carries them. Fails if the post does not exist.
  fn update_post(
    &self,
    id: i64,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Delete a post together with its chapters, visits and metrics.
  fn delete_post(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Posts: reads ─────────────────────────────────────────────────────

  /// Any post by id, whatever its status.
  fn get_post(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// A published post by slug. Unpublished posts are reported as absent.
  fn get_published_post<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + 'a;

  /// Every post, newest `created_at` first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Published posts matching `query`, newest `published_at` first.
  fn list_published<'a>(
    &'a self,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  /// Published, featured posts, newest first.
  fn featured_posts(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Published posts, newest first.
  fn recent_posts(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Published posts with recorded views, most viewed (all days summed)
  /// first.
  fn popular_posts(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn update_category(
    &self,
    id: i64,
    patch: CategoryPatch,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Delete a category; posts lose the association, child categories lose
  /// their parent.
  fn delete_category(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// All categories ordered by name.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  // ── Media ─────────────────────────────────────────────────────────────

  fn add_media(
    &self,
    input: NewMediaAsset,
  ) -> impl Future<Output = Result<MediaAsset, Self::Error>> + Send + '_;

  fn get_media(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<MediaAsset>, Self::Error>> + Send + '_;

  // ── Visits ────────────────────────────────────────────────────────────

  /// Append a visit at `at` and update the metrics row for `at`'s UTC date.
  /// Returns the metrics row after the update.
  fn record_visit(
    &self,
    post_id: i64,
    visit: VisitContext,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<PostMetricsDaily, Self::Error>> + Send + '_;

  /// Daily metrics for a post, oldest day first.
  fn post_metrics(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Vec<PostMetricsDaily>, Self::Error>> + Send + '_;

  /// Raw visit log for a post, in insertion order.
  fn post_visits(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + '_;
}
