//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width so
//! that text ordering in SQL matches chronological ordering. UUIDs are stored
//! as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use scriv_core::{
  account::{Article, User},
  bookmark::Bookmark,
  comment::{Author, Comment, CommentRecord},
  reaction::ReactionKind,
  resource::{ParentRef, ResourceType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_resource(kind: &str, id: &str) -> Result<ParentRef> {
  let kind = ResourceType::parse(kind).ok_or_else(|| Error::UnknownVariant {
    column: "resource_type",
    value:  kind.to_owned(),
  })?;
  Ok(ParentRef::new(kind, decode_uuid(id)?))
}

pub fn decode_reaction_kind(s: &str) -> Result<ReactionKind> {
  ReactionKind::parse(s).ok_or_else(|| Error::UnknownVariant {
    column: "reaction_type",
    value:  s.to_owned(),
  })
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, name, username, email, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub username:   String,
  pub email:      String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      name:       row.get(1)?,
      username:   row.get(2)?,
      email:      row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      username:   self.username,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Articles ────────────────────────────────────────────────────────────────

pub const ARTICLE_COLUMNS: &str =
  "article_id, author_id, title, handle, delete_scheduled_at, created_at";

pub struct RawArticle {
  pub article_id:          String,
  pub author_id:           String,
  pub title:               String,
  pub handle:              String,
  pub delete_scheduled_at: Option<String>,
  pub created_at:          String,
}

impl RawArticle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      article_id:          row.get(0)?,
      author_id:           row.get(1)?,
      title:               row.get(2)?,
      handle:              row.get(3)?,
      delete_scheduled_at: row.get(4)?,
      created_at:          row.get(5)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    Ok(Article {
      id:                  decode_uuid(&self.article_id)?,
      author_id:           decode_uuid(&self.author_id)?,
      title:               self.title,
      handle:              self.handle,
      delete_scheduled_at: self
        .delete_scheduled_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub const COMMENT_COLUMNS: &str = "c.rowid, c.comment_id, c.resource_type, \
                                   c.resource_id, c.body, c.user_id, \
                                   c.client_key, c.created_at";

/// Raw strings read from a `comments` row. `rowid` records insertion order.
pub struct RawComment {
  pub rowid:         i64,
  pub comment_id:    String,
  pub resource_type: String,
  pub resource_id:   String,
  pub body:          String,
  pub user_id:       String,
  pub client_key:    Option<String>,
  pub created_at:    String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rowid:         row.get(0)?,
      comment_id:    row.get(1)?,
      resource_type: row.get(2)?,
      resource_id:   row.get(3)?,
      body:          row.get(4)?,
      user_id:       row.get(5)?,
      client_key:    row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         decode_uuid(&self.comment_id)?,
      resource:   decode_resource(&self.resource_type, &self.resource_id)?,
      body:       self.body,
      user_id:    decode_uuid(&self.user_id)?,
      client_key: self.client_key.as_deref().map(decode_uuid).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A comment row joined with its author's public columns.
pub struct RawCommentRecord {
  pub comment:  RawComment,
  pub name:     String,
  pub username: String,
  pub email:    String,
}

impl RawCommentRecord {
  /// Expects [`COMMENT_COLUMNS`] followed by `u.name, u.username, u.email`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment:  RawComment::from_row(row)?,
      name:     row.get(8)?,
      username: row.get(9)?,
      email:    row.get(10)?,
    })
  }

  pub fn into_record(self) -> Result<CommentRecord> {
    let comment = self.comment.into_comment()?;
    let author = Author {
      id:       comment.user_id,
      name:     self.name,
      username: self.username,
      email:    self.email,
    };
    Ok(CommentRecord { comment, author })
  }
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

pub struct RawBookmark {
  pub bookmark_id:   String,
  pub resource_type: String,
  pub resource_id:   String,
  pub user_id:       String,
  pub created_at:    String,
}

impl RawBookmark {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bookmark_id:   row.get(0)?,
      resource_type: row.get(1)?,
      resource_id:   row.get(2)?,
      user_id:       row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_bookmark(self) -> Result<Bookmark> {
    Ok(Bookmark {
      id:         decode_uuid(&self.bookmark_id)?,
      resource:   decode_resource(&self.resource_type, &self.resource_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let frac = whole + chrono::Duration::microseconds(5);
    assert_eq!(encode_dt(whole).len(), encode_dt(frac).len());
    assert!(encode_dt(whole) < encode_dt(frac));
    assert_eq!(decode_dt(&encode_dt(frac)).unwrap(), frac);
  }

  #[test]
  fn unknown_resource_type_is_rejected() {
    let err = decode_resource("POST", &Uuid::nil().to_string()).unwrap_err();
    assert!(matches!(err, Error::UnknownVariant { column: "resource_type", .. }));
  }
}
