//! Comment types: stored rows, write inputs and the materialised tree.
//!
//! A comment row only knows its direct parent. The tree is rebuilt on read by
//! [`crate::thread::materialize`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, resource::ParentRef};

/// Upper bound on the trimmed body length, in characters.
pub const MAX_BODY_CHARS: usize = 500;

// ─── Stored row ──────────────────────────────────────────────────────────────

/// A comment exactly as stored. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         Uuid,
  /// The article (root comment) or comment (reply) this belongs to.
  /// Serialised as the `resource_id`/`resource_type` pair.
  #[serde(flatten)]
  pub resource:   ParentRef,
  pub body:       String,
  pub user_id:    Uuid,
  /// Client-generated idempotency key, echoed back for reconciliation.
  pub client_key: Option<Uuid>,
  /// Server-assigned.
  pub created_at: DateTime<Utc>,
}

/// Public projection of the commenting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub id:       Uuid,
  pub name:     String,
  pub username: String,
  pub email:    String,
}

/// A stored comment joined with its author; what the store hands the
/// materialiser.
#[derive(Debug, Clone)]
pub struct CommentRecord {
  pub comment: Comment,
  pub author:  Author,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// What a caller submits to create a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
  pub target:     ParentRef,
  pub body:       String,
  #[serde(default)]
  pub client_key: Option<Uuid>,
}

impl CommentDraft {
  pub fn new(target: ParentRef, body: impl Into<String>) -> Self {
    Self { target, body: body.into(), client_key: None }
  }

  /// Trim the body and check its length.
  pub fn validate(&mut self) -> Result<()> {
    let body = self.body.trim();
    if body.is_empty() {
      return Err(Error::Validation("Comment body is required".into()));
    }
    if body.chars().count() > MAX_BODY_CHARS {
      return Err(Error::Validation(format!(
        "Comment body too long (max {MAX_BODY_CHARS} characters)"
      )));
    }
    self.body = body.to_owned();
    Ok(())
  }
}

/// Input to [`crate::store::CommentStore::insert_comment`]. The store assigns
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub resource:   ParentRef,
  pub body:       String,
  pub user_id:    Uuid,
  pub client_key: Option<Uuid>,
}

// ─── Materialised tree ───────────────────────────────────────────────────────

/// One node of a materialised comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
  pub id:         Uuid,
  pub body:       String,
  /// 0 for comments directly on the requested resource.
  pub level:      u32,
  pub created_at: DateTime<Utc>,
  pub author:     Author,
  pub replies:    Vec<CommentNode>,
}

impl CommentNode {
  /// Depth-first search for the node with `id`.
  pub fn find_mut(&mut self, id: Uuid) -> Option<&mut CommentNode> {
    if self.id == id {
      return Some(self);
    }
    self.replies.iter_mut().find_map(|r| r.find_mut(id))
  }

  /// Total number of nodes in this subtree, including `self`.
  pub fn len(&self) -> usize {
    1 + self.replies.iter().map(CommentNode::len).sum::<usize>()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(body: &str) -> CommentDraft {
    CommentDraft::new(ParentRef::Article(Uuid::nil()), body)
  }

  #[test]
  fn comment_row_is_flat() {
    let id = Uuid::new_v4();
    let parent = Uuid::new_v4();
    let comment = Comment {
      id,
      resource: ParentRef::Comment(parent),
      body: "hi".into(),
      user_id: Uuid::nil(),
      client_key: None,
      created_at: DateTime::<Utc>::UNIX_EPOCH,
    };
    let v = serde_json::to_value(&comment).unwrap();
    assert_eq!(v["resource_type"], "COMMENT");
    assert_eq!(v["resource_id"], parent.to_string());
    assert!(v.get("resource").is_none());

    let back: Comment = serde_json::from_value(v).unwrap();
    assert_eq!(back, comment);
  }

  #[test]
  fn validate_trims_body() {
    let mut d = draft("  hello  ");
    d.validate().unwrap();
    assert_eq!(d.body, "hello");
  }

  #[test]
  fn validate_rejects_blank_body() {
    assert!(matches!(draft("   ").validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn validate_counts_characters_not_bytes() {
    let mut ok = draft(&"é".repeat(MAX_BODY_CHARS));
    assert!(ok.validate().is_ok());

    let mut too_long = draft(&"a".repeat(MAX_BODY_CHARS + 1));
    assert!(matches!(too_long.validate(), Err(Error::Validation(_))));
  }
}
