//! Polymorphic resource references.
//!
//! Comments, reactions and bookmarks all point at "a resource", which is
//! either an article or another comment. The pair of `(resource_id,
//! resource_type)` columns in storage is lifted into [`ParentRef`] as soon as
//! it leaves the database so that every consumer handles both kinds
//! explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of resource a [`ParentRef`] points at.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
  Article,
  Comment,
}

impl ResourceType {
  /// The string stored in `resource_type` columns.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Article => "ARTICLE",
      Self::Comment => "COMMENT",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "ARTICLE" => Some(Self::Article),
      "COMMENT" => Some(Self::Comment),
      _ => None,
    }
  }
}

impl fmt::Display for ResourceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A reference to the resource a comment, reaction or bookmark belongs to.
///
/// Serialises as `{"resource_type": "ARTICLE", "resource_id": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
  tag = "resource_type",
  content = "resource_id",
  rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ParentRef {
  Article(Uuid),
  Comment(Uuid),
}

impl ParentRef {
  pub fn new(kind: ResourceType, id: Uuid) -> Self {
    match kind {
      ResourceType::Article => Self::Article(id),
      ResourceType::Comment => Self::Comment(id),
    }
  }

  pub fn kind(&self) -> ResourceType {
    match self {
      Self::Article(_) => ResourceType::Article,
      Self::Comment(_) => ResourceType::Comment,
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      Self::Article(id) | Self::Comment(id) => *id,
    }
  }
}

impl fmt::Display for ParentRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.kind(), self.id())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serialises_as_resource_pair() {
    let id = Uuid::nil();
    let json = serde_json::to_value(ParentRef::Comment(id)).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "resource_type": "COMMENT", "resource_id": id })
    );
  }

  #[test]
  fn kind_and_id_round_trip_through_new() {
    let id = Uuid::new_v4();
    let r = ParentRef::new(ResourceType::Article, id);
    assert_eq!(r, ParentRef::Article(id));
    assert_eq!(r.kind(), ResourceType::Article);
    assert_eq!(r.id(), id);
  }

  #[test]
  fn parse_rejects_lowercase() {
    assert_eq!(ResourceType::parse("COMMENT"), Some(ResourceType::Comment));
    assert_eq!(ResourceType::parse("comment"), None);
  }
}
