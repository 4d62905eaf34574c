//! [`SqliteStore`]: the SQLite implementation of [`BlogStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{
  OptionalExtension as _, TransactionBehavior, functions::FunctionFlags, params,
  params_from_iter, types::Value,
};

use folio_core::{
  category::{Category, CategoryPatch, NewCategory},
  chapter::build_chapters,
  lifecycle::apply_status,
  media::{MediaAsset, NewMediaAsset},
  post::{NewPost, Post, PostPatch, PostStatus},
  store::{BlogStore, PostQuery},
  visit::{PostMetricsDaily, Visit, VisitContext, unique_increment},
};

use crate::{
  Result,
  encode::{
    LOWER_FN, MEDIA_COLUMNS, METRICS_COLUMNS, VISIT_COLUMNS, contains_pattern,
    encode_date, encode_dt, media_row, metrics_row, visit_row,
  },
  queries,
  schema::SCHEMA,
};

/// Outcome of a write closure: the outer result carries database failures,
/// the inner one carries domain rejections that roll the transaction back.
type Outcome<T> = std::result::Result<T, folio_core::Error>;

/// How many times a visit is attempted before the failure is reported.
const VISIT_ATTEMPTS: usize = 3;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio blog store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          LOWER_FN,
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
          },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_posts(&self, tail: String, args: Vec<Value>) -> Result<Vec<Post>> {
    let posts = self
      .conn
      .call(move |conn| {
        Ok(queries::select_posts(conn, &tail, params_from_iter(args))?)
      })
      .await?;
    Ok(posts)
  }

  /// One attempt at recording a visit, under a write lock taken up front so
  /// the session check and the counter update see the same state.
  async fn try_record_visit(
    &self,
    post_id: i64,
    visit:   VisitContext,
    at:      DateTime<Utc>,
  ) -> Result<PostMetricsDaily> {
    let outcome: Outcome<PostMetricsDaily> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !queries::post_exists(&tx, post_id)? {
          return Ok(Err(folio_core::Error::PostNotFound(post_id)));
        }

        let today   = at.date_naive();
        let session = visit.session();
        let already_counted = match session {
          Some(s) => queries::session_seen_on(&tx, post_id, s, today)?,
          None    => false,
        };

        tx.execute(
          "INSERT INTO visits (
             post_id, visited_at, visit_date, session_id, origin_hash,
             user_agent, referrer
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            post_id,
            encode_dt(at),
            encode_date(today),
            session,
            visit.origin_hash,
            visit.user_agent,
            visit.referrer,
          ],
        )?;

        let unique  = unique_increment(session, already_counted);
        let metrics = queries::bump_metrics(&tx, post_id, today, unique)?;
        tx.commit()?;
        Ok(Ok(metrics))
      })
      .await?;
    Ok(outcome?)
  }
}

// ─── BlogStore impl ──────────────────────────────────────────────────────────

impl BlogStore for SqliteStore {
  type Error = crate::Error;

  // ── Posts: writes ────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let (mut fields, chapters, category_ids) = input.into_parts();

    let outcome: Outcome<Post> = self
      .conn
      .call(move |conn| {
        let drafts = match build_chapters(chapters) {
          Ok(d)  => d,
          Err(e) => return Ok(Err(e)),
        };
        if let Err(e) = apply_status(&mut fields) {
          return Ok(Err(e));
        }

        let now = Utc::now();
        let tx  = conn.transaction()?;
        let id  = queries::insert_post(&tx, &fields, now)?;
        queries::replace_chapters(&tx, id, &drafts, now)?;
        queries::replace_categories(&tx, id, &category_ids, now)?;
        let post = queries::select_post(&tx, id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(post))
      })
      .await?;

    let post = outcome?;
    tracing::info!(post_id = post.id, slug = post.slug(), "created post");
    Ok(post)
  }

  async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Post> {
    let outcome: Outcome<Post> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(current) = queries::select_post(&tx, id)? else {
          return Ok(Err(folio_core::Error::PostNotFound(id)));
        };

        let mut fields = current.fields;
        let (chapters, category_ids) = patch.apply(&mut fields);
        let drafts = match chapters.map(build_chapters).transpose() {
          Ok(d)  => d,
          Err(e) => return Ok(Err(e)),
        };
        // Dropping `tx` on the early return rolls back.
        if let Err(e) = apply_status(&mut fields) {
          return Ok(Err(e));
        }

        let now = Utc::now();
        queries::update_post(&tx, id, &fields, now)?;
        if let Some(drafts) = drafts {
          queries::replace_chapters(&tx, id, &drafts, now)?;
        }
        if let Some(ids) = category_ids {
          queries::replace_categories(&tx, id, &ids, now)?;
        }
        let post = queries::select_post(&tx, id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(post))
      })
      .await?;

    let post = outcome?;
    tracing::info!(post_id = id, status = post.status().as_str(), "updated post");
    Ok(post)
  }

  async fn delete_post(&self, id: i64) -> Result<()> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM posts WHERE post_id = ?1", params![id])?)
      })
      .await?;

    if deleted == 0 {
      return Err(folio_core::Error::PostNotFound(id).into());
    }
    tracing::info!(post_id = id, "deleted post");
    Ok(())
  }

  // ── Posts: reads ─────────────────────────────────────────────────────────

  async fn get_post(&self, id: i64) -> Result<Option<Post>> {
    let post = self
      .conn
      .call(move |conn| Ok(queries::select_post(conn, id)?))
      .await?;
    Ok(post)
  }

  async fn get_published_post(&self, slug: &str) -> Result<Option<Post>> {
    let posts = self
      .select_posts(
        "WHERE p.slug = ?1 AND p.status = ?2".to_owned(),
        vec![
          Value::Text(slug.to_owned()),
          Value::Text(PostStatus::Published.as_str().to_owned()),
        ],
      )
      .await?;
    Ok(posts.into_iter().next())
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    self
      .select_posts("ORDER BY p.created_at DESC, p.post_id DESC".to_owned(), vec![])
      .await
  }

  async fn list_published(&self, query: &PostQuery) -> Result<Vec<Post>> {
    // Build WHERE clause dynamically; placeholders are numbered by position
    // in `args`.
    let mut args: Vec<Value> =
      vec![Value::Text(PostStatus::Published.as_str().to_owned())];
    let mut conds: Vec<String> = vec!["p.status = ?1".to_owned()];

    if let Some(slug) = &query.category {
      args.push(Value::Text(slug.clone()));
      conds.push(format!(
        "EXISTS (
           SELECT 1 FROM post_categories pc
           JOIN categories c ON c.category_id = pc.category_id
           WHERE pc.post_id = p.post_id AND c.slug = ?{}
         )",
        args.len()
      ));
    }
    if let Some(search) = &query.search {
      args.push(Value::Text(contains_pattern(search)));
      let n = args.len();
      conds.push(format!(
        "({LOWER_FN}(p.title) LIKE ?{n} ESCAPE '\\'
          OR {LOWER_FN}(coalesce(p.summary, '')) LIKE ?{n} ESCAPE '\\')"
      ));
    }
    if let Some(before) = query.published_before {
      args.push(Value::Text(encode_dt(before)));
      conds.push(format!("p.published_at <= ?{}", args.len()));
    }
    if let Some(after) = query.published_after {
      args.push(Value::Text(encode_dt(after)));
      conds.push(format!("p.published_at >= ?{}", args.len()));
    }

    let tail = format!(
      "WHERE {} ORDER BY p.published_at DESC NULLS LAST, p.post_id DESC",
      conds.join(" AND ")
    );
    self.select_posts(tail, args).await
  }

  async fn featured_posts(&self, limit: usize) -> Result<Vec<Post>> {
    self
      .select_posts(
        "WHERE p.status = ?1 AND p.is_featured = 1
         ORDER BY p.published_at DESC NULLS LAST, p.post_id DESC
         LIMIT ?2"
          .to_owned(),
        vec![
          Value::Text(PostStatus::Published.as_str().to_owned()),
          Value::Integer(limit as i64),
        ],
      )
      .await
  }

  async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>> {
    self
      .select_posts(
        "WHERE p.status = ?1
         ORDER BY p.published_at DESC NULLS LAST, p.post_id DESC
         LIMIT ?2"
          .to_owned(),
        vec![
          Value::Text(PostStatus::Published.as_str().to_owned()),
          Value::Integer(limit as i64),
        ],
      )
      .await
  }

  async fn popular_posts(&self, limit: usize) -> Result<Vec<Post>> {
    self
      .select_posts(
        "JOIN (
           SELECT post_id, SUM(views) AS total_views
           FROM post_metrics_daily GROUP BY post_id
         ) m ON m.post_id = p.post_id
         WHERE p.status = ?1
         ORDER BY m.total_views DESC, p.post_id
         LIMIT ?2"
          .to_owned(),
        vec![
          Value::Text(PostStatus::Published.as_str().to_owned()),
          Value::Integer(limit as i64),
        ],
      )
      .await
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<Category> {
    let category = self
      .conn
      .call(move |conn| {
        let now = encode_dt(Utc::now());
        conn.execute(
          "INSERT INTO categories (name, slug, description, parent_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![input.name, input.slug, input.description, input.parent_id, now],
        )?;
        let id = conn.last_insert_rowid();
        Ok(
          queries::select_category(conn, id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?,
        )
      })
      .await?;

    tracing::info!(category_id = category.id, slug = %category.slug, "created category");
    Ok(category)
  }

  async fn update_category(&self, id: i64, patch: CategoryPatch) -> Result<Category> {
    let outcome: Outcome<Category> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(mut category) = queries::select_category(&tx, id)? else {
          return Ok(Err(folio_core::Error::CategoryNotFound(id)));
        };
        patch.apply(&mut category);

        tx.execute(
          "UPDATE categories SET
             name = ?2, slug = ?3, description = ?4, parent_id = ?5, updated_at = ?6
           WHERE category_id = ?1",
          params![
            id,
            category.name,
            category.slug,
            category.description,
            category.parent_id,
            encode_dt(Utc::now()),
          ],
        )?;
        let category = queries::select_category(&tx, id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(category))
      })
      .await?;
    Ok(outcome?)
  }

  async fn delete_category(&self, id: i64) -> Result<()> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM categories WHERE category_id = ?1", params![id])?)
      })
      .await?;

    if deleted == 0 {
      return Err(folio_core::Error::CategoryNotFound(id).into());
    }
    tracing::info!(category_id = id, "deleted category");
    Ok(())
  }

  async fn get_category(&self, id: i64) -> Result<Option<Category>> {
    let category = self
      .conn
      .call(move |conn| Ok(queries::select_category(conn, id)?))
      .await?;
    Ok(category)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let categories = self
      .conn
      .call(|conn| {
        Ok(queries::select_categories(conn, "ORDER BY c.name, c.category_id", [])?)
      })
      .await?;
    Ok(categories)
  }

  // ── Media ─────────────────────────────────────────────────────────────────

  async fn add_media(&self, input: NewMediaAsset) -> Result<MediaAsset> {
    let media = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO media_assets (
             kind, storage_provider, storage_path, mime_type, bytes, checksum,
             width, height, duration_seconds, uploader, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          params![
            input.kind.as_str(),
            input.storage_provider.as_str(),
            input.storage_path,
            input.mime_type,
            input.bytes,
            input.checksum,
            input.width,
            input.height,
            input.duration_seconds,
            input.uploader,
            encode_dt(Utc::now()),
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
          &format!("SELECT {MEDIA_COLUMNS} FROM media_assets WHERE media_id = ?1"),
          params![id],
          media_row,
        )?)
      })
      .await?;
    Ok(media)
  }

  async fn get_media(&self, id: i64) -> Result<Option<MediaAsset>> {
    let media = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MEDIA_COLUMNS} FROM media_assets WHERE media_id = ?1"),
              params![id],
              media_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(media)
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn record_visit(
    &self,
    post_id: i64,
    visit:   VisitContext,
    at:      DateTime<Utc>,
  ) -> Result<PostMetricsDaily> {
    let mut attempt = 1;
    loop {
      match self.try_record_visit(post_id, visit.clone(), at).await {
        Err(e) if e.is_retryable() && attempt < VISIT_ATTEMPTS => {
          tracing::debug!(post_id, attempt, error = %e, "retrying visit");
          attempt += 1;
        }
        other => return other,
      }
    }
  }

  async fn post_metrics(&self, post_id: i64) -> Result<Vec<PostMetricsDaily>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {METRICS_COLUMNS} FROM post_metrics_daily
           WHERE post_id = ?1 ORDER BY date"
        ))?;
        let rows = stmt
          .query_map(params![post_id], metrics_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn post_visits(&self, post_id: i64) -> Result<Vec<Visit>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VISIT_COLUMNS} FROM visits WHERE post_id = ?1 ORDER BY visit_id"
        ))?;
        let rows = stmt
          .query_map(params![post_id], visit_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
