//! Categories: a shared, optionally nested taxonomy for posts.
//!
//! Parent links are not checked for cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id:          i64,
  pub name:        String,
  pub slug:        String,
  pub description: Option<String>,
  pub parent_id:   Option<i64>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name:        String,
  pub slug:        String,
  pub description: Option<String>,
  pub parent_id:   Option<i64>,
}

impl NewCategory {
  pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      slug:        slug.into(),
      description: None,
      parent_id:   None,
    }
  }
}

/// Partial update; an explicit `null` clears a nullable column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
  pub name:        Option<String>,
  pub slug:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub parent_id:   Option<Option<i64>>,
}

impl CategoryPatch {
  pub fn apply(self, category: &mut Category) {
    if let Some(v) = self.name {
      category.name = v;
    }
    if let Some(v) = self.slug {
      category.slug = v;
    }
    if let Some(v) = self.description {
      category.description = v;
    }
    if let Some(v) = self.parent_id {
      category.parent_id = v;
    }
  }
}
