//! Users, sessions and the minimal article record comments hang off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comment::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub username:   String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn author(&self) -> Author {
    Author {
      id:       self.id,
      name:     self.name.clone(),
      username: self.username.clone(),
      email:    self.email.clone(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:     String,
  pub username: String,
  pub email:    String,
}

/// A login session. Only the SHA-256 digest of the cookie token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  pub id:                  Uuid,
  pub author_id:           Uuid,
  pub title:               String,
  pub handle:              String,
  /// Once in the past, the article is removed by the cleanup job.
  pub delete_scheduled_at: Option<DateTime<Utc>>,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
  pub author_id: Uuid,
  pub title:     String,
  pub handle:    String,
}
