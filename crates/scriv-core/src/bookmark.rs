//! Bookmarks. A user holds at most one per resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::ParentRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
  pub id:         Uuid,
  #[serde(flatten)]
  pub resource:   ParentRef,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkState {
  pub bookmarked: bool,
}

/// Offset pagination for bookmark listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit:  usize,
  pub offset: usize,
}

impl Page {
  pub const DEFAULT_LIMIT: usize = 20;
  pub const MAX_LIMIT: usize = 100;

  /// Clamp caller-supplied values into the accepted range.
  pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
    Self {
      limit:  limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
      offset: offset.unwrap_or(0),
    }
  }
}

impl Default for Page {
  fn default() -> Self { Self::new(None, None) }
}
