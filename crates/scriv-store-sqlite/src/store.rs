//! [`SqliteStore`], the SQLite implementation of [`CommentStore`].

use std::{collections::BTreeMap, path::Path, sync::Arc};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use scriv_core::{
  account::{Article, NewArticle, NewUser, Session, User},
  bookmark::{Bookmark, Page},
  comment::{Comment, CommentRecord, NewComment},
  reaction::{ReactionKind, ReactionTally},
  resource::{ParentRef, ResourceType},
  store::CommentStore,
};

use crate::{
  encode::{
    ARTICLE_COLUMNS, COMMENT_COLUMNS, RawArticle, RawBookmark, RawComment,
    RawCommentRecord, RawUser, USER_COLUMNS, decode_reaction_kind, decode_uuid,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

/// Upper bound on bound parameters per `IN (...)` list.
const IN_CHUNK: usize = 500;

/// Source of server-assigned timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Scriv store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Clock,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Replace the wall clock used for `created_at` columns.
  pub fn with_clock(mut self, clock: Clock) -> Self {
    self.clock = clock;
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, clock: Arc::new(Utc::now) })
  }

  /// Current time at the precision the schema stores.
  fn now(&self) -> DateTime<Utc> { (self.clock)().trunc_subsecs(6) }
}

// ─── CommentStore impl ───────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  type Error = crate::Error;

  // ── Users and sessions ────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      username:   input.username,
      email:      input.email,
      created_at: self.now(),
    };

    let id_str = encode_uuid(user.id);
    let at_str = encode_dt(user.created_at);
    let (name, username, email) =
      (user.name.clone(), user.username.clone(), user.email.clone());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, username, email, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, username, email, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_for_session(
    &self,
    token_hash: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<User>> {
    let token_hash = token_hash.to_owned();
    let now_str = encode_dt(now);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.user_id, u.name, u.username, u.email, u.created_at
               FROM sessions s JOIN users u ON u.user_id = s.user_id
               WHERE s.token_hash = ?1 AND s.expires_at > ?2",
              rusqlite::params![token_hash, now_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn revoke_session(&self, token_hash: &str) -> Result<bool> {
    let token_hash = token_hash.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  async fn add_article(&self, input: NewArticle) -> Result<Article> {
    let article = Article {
      id:                  Uuid::new_v4(),
      author_id:           input.author_id,
      title:               input.title,
      handle:              input.handle,
      delete_scheduled_at: None,
      created_at:          self.now(),
    };

    let id_str     = encode_uuid(article.id);
    let author_str = encode_uuid(article.author_id);
    let at_str     = encode_dt(article.created_at);
    let (title, handle) = (article.title.clone(), article.handle.clone());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO articles (article_id, author_id, title, handle, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, author_str, title, handle, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(article)
  }

  async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawArticle> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_id = ?1"),
              rusqlite::params![id_str],
              RawArticle::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArticle::into_article).transpose()
  }

  async fn schedule_article_deletion(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = at.map(encode_dt);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE articles SET delete_scheduled_at = ?2 WHERE article_id = ?1",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;
    Ok(updated > 0)
  }

  async fn scheduled_articles(&self, author_id: Uuid) -> Result<Vec<Article>> {
    let author_str = encode_uuid(author_id);

    let raws: Vec<RawArticle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ARTICLE_COLUMNS} FROM articles
           WHERE author_id = ?1 AND delete_scheduled_at IS NOT NULL
           ORDER BY delete_scheduled_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![author_str], RawArticle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  async fn purge_expired_articles(&self, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let now_str = encode_dt(now);

    let raws: Vec<RawArticle> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raws = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE delete_scheduled_at IS NOT NULL AND delete_scheduled_at < ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![now_str], RawArticle::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for raw in &raws {
          let id = &raw.article_id;
          tx.execute(
            "DELETE FROM reactions WHERE resource_type = 'ARTICLE' AND resource_id = ?1",
            rusqlite::params![id],
          )?;
          tx.execute(
            "DELETE FROM bookmarks WHERE resource_type = 'ARTICLE' AND resource_id = ?1",
            rusqlite::params![id],
          )?;
          tx.execute(
            "DELETE FROM articles WHERE article_id = ?1",
            rusqlite::params![id],
          )?;
        }
        tx.commit()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.comment_id = ?1"),
              rusqlite::params![id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn find_comment_by_client_key(
    &self,
    user_id: Uuid,
    client_key: Uuid,
  ) -> Result<Option<Comment>> {
    let user_str = encode_uuid(user_id);
    let key_str  = encode_uuid(client_key);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {COMMENT_COLUMNS} FROM comments c
                 WHERE c.user_id = ?1 AND c.client_key = ?2"
              ),
              rusqlite::params![user_str, key_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      id:         Uuid::new_v4(),
      resource:   input.resource,
      body:       input.body,
      user_id:    input.user_id,
      client_key: input.client_key,
      created_at: self.now(),
    };

    let id_str        = encode_uuid(comment.id);
    let resource_type = comment.resource.kind().as_str();
    let resource_id   = encode_uuid(comment.resource.id());
    let body          = comment.body.clone();
    let user_str      = encode_uuid(comment.user_id);
    let key_str       = comment.client_key.map(encode_uuid);
    let at_str        = encode_dt(comment.created_at);

    let existing: Option<RawComment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(key) = &key_str {
          let existing = tx
            .query_row(
              &format!(
                "SELECT {COMMENT_COLUMNS} FROM comments c
                 WHERE c.user_id = ?1 AND c.client_key = ?2"
              ),
              rusqlite::params![user_str, key],
              RawComment::from_row,
            )
            .optional()?;
          if existing.is_some() {
            return Ok(existing);
          }
        }
        tx.execute(
          "INSERT INTO comments (
             comment_id, resource_id, resource_type, body, user_id,
             client_key, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            resource_id,
            resource_type,
            body,
            user_str,
            key_str,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match existing {
      Some(raw) => raw.into_comment(),
      None => Ok(comment),
    }
  }

  async fn children_of(&self, parents: &[ParentRef]) -> Result<Vec<CommentRecord>> {
    if parents.is_empty() {
      return Ok(Vec::new());
    }

    let mut by_kind: BTreeMap<ResourceType, Vec<String>> = BTreeMap::new();
    for parent in parents {
      by_kind
        .entry(parent.kind())
        .or_default()
        .push(encode_uuid(parent.id()));
    }
    let parent_count = parents.len();

    let mut raws: Vec<RawCommentRecord> = self
      .conn
      .call(move |conn| {
        let mut out = Vec::new();
        for (kind, ids) in by_kind {
          for chunk in ids.chunks(IN_CHUNK) {
            let placeholders = (0..chunk.len())
              .map(|i| format!("?{}", i + 2))
              .collect::<Vec<_>>()
              .join(", ");
            let sql = format!(
              "SELECT {COMMENT_COLUMNS}, u.name, u.username, u.email
               FROM comments c JOIN users u ON u.user_id = c.user_id
               WHERE c.resource_type = ?1 AND c.resource_id IN ({placeholders})"
            );
            let params = std::iter::once(kind.as_str().to_owned())
              .chain(chunk.iter().cloned());
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
              .query_map(rusqlite::params_from_iter(params), RawCommentRecord::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            out.extend(rows);
          }
        }
        Ok(out)
      })
      .await?;

    // Timestamps are fixed-width, so text order is chronological.
    raws.sort_by(|a, b| {
      (&a.comment.created_at, a.comment.rowid)
        .cmp(&(&b.comment.created_at, b.comment.rowid))
    });
    debug!(parents = parent_count, children = raws.len(), "fetched comment level");

    raws.into_iter().map(RawCommentRecord::into_record).collect()
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  async fn toggle_reaction(
    &self,
    target: ParentRef,
    user_id: Uuid,
    kind: ReactionKind,
  ) -> Result<bool> {
    let resource_type = target.kind().as_str();
    let resource_id   = encode_uuid(target.id());
    let user_str      = encode_uuid(user_id);
    let kind_str      = kind.as_str();
    let at_str        = encode_dt(self.now());

    let reacted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM reactions
           WHERE resource_id = ?1 AND resource_type = ?2
             AND user_id = ?3 AND reaction_type = ?4",
          rusqlite::params![resource_id, resource_type, user_str, kind_str],
        )?;
        if removed == 0 {
          tx.execute(
            "INSERT INTO reactions (
               resource_id, resource_type, user_id, reaction_type, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![resource_id, resource_type, user_str, kind_str, at_str],
          )?;
        }
        tx.commit()?;
        Ok(removed == 0)
      })
      .await?;
    Ok(reacted)
  }

  async fn reaction_tallies(&self, target: ParentRef) -> Result<Vec<ReactionTally>> {
    let resource_type = target.kind().as_str();
    let resource_id   = encode_uuid(target.id());

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT reaction_type, user_id FROM reactions
           WHERE resource_type = ?1 AND resource_id = ?2
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![resource_type, resource_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut tallies: BTreeMap<ReactionKind, Vec<Uuid>> = BTreeMap::new();
    for (kind, user) in rows {
      tallies
        .entry(decode_reaction_kind(&kind)?)
        .or_default()
        .push(decode_uuid(&user)?);
    }
    Ok(
      tallies
        .into_iter()
        .map(|(kind, reactors)| ReactionTally { kind, reactors })
        .collect(),
    )
  }

  // ── Bookmarks ─────────────────────────────────────────────────────────────

  async fn toggle_bookmark(&self, target: ParentRef, user_id: Uuid) -> Result<bool> {
    let id_str        = encode_uuid(Uuid::new_v4());
    let resource_type = target.kind().as_str();
    let resource_id   = encode_uuid(target.id());
    let user_str      = encode_uuid(user_id);
    let at_str        = encode_dt(self.now());

    let bookmarked = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM bookmarks
           WHERE resource_id = ?1 AND resource_type = ?2 AND user_id = ?3",
          rusqlite::params![resource_id, resource_type, user_str],
        )?;
        if removed == 0 {
          tx.execute(
            "INSERT INTO bookmarks (
               bookmark_id, resource_id, resource_type, user_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id_str, resource_id, resource_type, user_str, at_str],
          )?;
        }
        tx.commit()?;
        Ok(removed == 0)
      })
      .await?;
    Ok(bookmarked)
  }

  async fn bookmark_exists(&self, target: ParentRef, user_id: Uuid) -> Result<bool> {
    let resource_type = target.kind().as_str();
    let resource_id   = encode_uuid(target.id());
    let user_str      = encode_uuid(user_id);

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM bookmarks
               WHERE resource_id = ?1 AND resource_type = ?2 AND user_id = ?3",
              rusqlite::params![resource_id, resource_type, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn list_bookmarks(&self, user_id: Uuid, page: Page) -> Result<Vec<Bookmark>> {
    let user_str   = encode_uuid(user_id);
    let limit_val  = page.limit as i64;
    let offset_val = page.offset as i64;

    let raws: Vec<RawBookmark> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bookmark_id, resource_type, resource_id, user_id, created_at
           FROM bookmarks WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, limit_val, offset_val],
            RawBookmark::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBookmark::into_bookmark).collect()
  }
}
