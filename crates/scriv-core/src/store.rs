//! The `CommentStore` trait.
//!
//! Implemented by storage backends (e.g. `scriv-store-sqlite`). The thread
//! materialiser, the write path and the HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{Article, NewArticle, NewUser, Session, User},
  bookmark::{Bookmark, Page},
  comment::{Comment, CommentRecord, NewComment},
  reaction::{ReactionKind, ReactionTally},
  resource::ParentRef,
};

/// Abstraction over a Scriv store backend.
///
/// Comments are append-only. Reactions and bookmarks are toggled, never
/// edited.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CommentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users and sessions ────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its user, ignoring sessions that expired
  /// before `now`.
  fn user_for_session<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Returns `true` if a session was removed.
  fn revoke_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Articles ──────────────────────────────────────────────────────────

  fn add_article(
    &self,
    input: NewArticle,
  ) -> impl Future<Output = Result<Article, Self::Error>> + Send + '_;

  fn get_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + '_;

  /// Set or clear `delete_scheduled_at`. Returns `false` if the article does
  /// not exist.
  fn schedule_article_deletion(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Articles by `author_id` with a deletion scheduled, soonest first.
  fn scheduled_articles(
    &self,
    author_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + '_;

  /// Delete every article whose `delete_scheduled_at` is before `now`,
  /// together with the reactions and bookmarks that target it. Comments are
  /// left in place. Returns the deleted articles.
  fn purge_expired_articles(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn find_comment_by_client_key(
    &self,
    user_id: Uuid,
    client_key: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Persist a comment. The store assigns `id` and `created_at`.
  ///
  /// If the user already has a comment with the same `client_key`, that
  /// comment is returned and nothing is inserted.
  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// All direct children of any of `parents`, joined with their authors.
  ///
  /// Results are ordered by `created_at` ascending, then by insertion order.
  fn children_of<'a>(
    &'a self,
    parents: &'a [ParentRef],
  ) -> impl Future<Output = Result<Vec<CommentRecord>, Self::Error>> + Send + 'a;

  // ── Reactions ─────────────────────────────────────────────────────────

  /// Add the reaction if absent, remove it if present. Returns `true` if the
  /// reaction exists afterwards.
  fn toggle_reaction(
    &self,
    target: ParentRef,
    user_id: Uuid,
    kind: ReactionKind,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// One tally per reaction kind present on `target`.
  fn reaction_tallies(
    &self,
    target: ParentRef,
  ) -> impl Future<Output = Result<Vec<ReactionTally>, Self::Error>> + Send + '_;

  // ── Bookmarks ─────────────────────────────────────────────────────────

  /// Returns `true` if the bookmark exists afterwards.
  fn toggle_bookmark(
    &self,
    target: ParentRef,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn bookmark_exists(
    &self,
    target: ParentRef,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The user's bookmarks, newest first.
  fn list_bookmarks(
    &self,
    user_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Bookmark>, Self::Error>> + Send + '_;

  // ── Provided ──────────────────────────────────────────────────────────

  /// Whether the resource `target` points at exists.
  fn resource_exists(
    &self,
    target: ParentRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    async move {
      Ok(match target {
        ParentRef::Article(id) => self.get_article(id).await?.is_some(),
        ParentRef::Comment(id) => self.get_comment(id).await?.is_some(),
      })
    }
  }
}
