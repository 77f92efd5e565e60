//! Comment threads: the depth-bounded read path and the validated write path.
//!
//! Storage is a flat table where each comment points at its direct parent.
//! [`materialize`] rebuilds the forest below a resource one level at a time,
//! issuing a single batched [`CommentStore::children_of`] call per level, and
//! stops after [`DepthPolicy::max_depth`] levels.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, CommentDraft, CommentNode, CommentRecord, NewComment},
  resource::ParentRef,
  store::CommentStore,
};

/// How deep comment threads go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthPolicy {
  /// Number of visible levels. With the default of 3, levels 0, 1 and 2 are
  /// materialised and anything deeper is omitted from reads.
  pub max_depth:        u32,
  /// Reject replies that would land at or beyond `max_depth` instead of
  /// storing them invisibly.
  pub enforce_on_write: bool,
}

impl DepthPolicy {
  pub const DEFAULT_MAX_DEPTH: u32 = 3;
}

impl Default for DepthPolicy {
  fn default() -> Self {
    Self { max_depth: Self::DEFAULT_MAX_DEPTH, enforce_on_write: false }
  }
}

// ─── Read path ───────────────────────────────────────────────────────────────

/// Materialise the forest of comments below `root`.
///
/// An unknown `root` yields an empty forest. Store errors are returned as-is;
/// there is no partial result.
pub async fn materialize<S: CommentStore>(
  store: &S,
  root: ParentRef,
  policy: &DepthPolicy,
) -> Result<Vec<CommentNode>, S::Error> {
  let mut levels: Vec<Vec<CommentRecord>> = Vec::new();
  let mut frontier = vec![root];

  for _ in 0..policy.max_depth {
    if frontier.is_empty() {
      break;
    }
    let level = store.children_of(&frontier).await?;
    frontier = level
      .iter()
      .map(|r| ParentRef::Comment(r.comment.id))
      .collect();
    levels.push(level);
  }

  debug!(
    %root,
    levels = levels.len(),
    comments = levels.iter().map(Vec::len).sum::<usize>(),
    "materialised comment thread"
  );
  Ok(assemble(levels))
}

/// Build the forest from per-level fetches, `levels[0]` being the direct
/// children of the root.
///
/// Every record in `levels[n + 1]` is expected to point at a record in
/// `levels[n]`; records that don't are dropped. Siblings are ordered by
/// `created_at`, keeping the incoming order for equal timestamps.
pub fn assemble(levels: Vec<Vec<CommentRecord>>) -> Vec<CommentNode> {
  let mut below: HashMap<Uuid, Vec<CommentNode>> = HashMap::new();

  for (level, records) in levels.into_iter().enumerate().rev() {
    let mut current: HashMap<Uuid, Vec<CommentNode>> = HashMap::new();
    for CommentRecord { comment, author } in records {
      let replies = below.remove(&comment.id).unwrap_or_default();
      current
        .entry(comment.resource.id())
        .or_default()
        .push(CommentNode {
          id: comment.id,
          body: comment.body,
          level: level as u32,
          created_at: comment.created_at,
          author,
          replies,
        });
    }
    for siblings in current.values_mut() {
      siblings.sort_by_key(|n| n.created_at);
    }
    below = current;
  }

  let mut roots: Vec<CommentNode> = below.into_values().flatten().collect();
  roots.sort_by_key(|n| n.created_at);
  roots
}

// ─── Write path ──────────────────────────────────────────────────────────────

/// Validate and persist a new comment on behalf of `author`.
///
/// `author` is the session user, `None` for anonymous callers. Nothing is
/// inserted unless every check passes.
pub async fn create_comment<S: CommentStore>(
  store: &S,
  author: Option<Uuid>,
  mut draft: CommentDraft,
  policy: &DepthPolicy,
) -> Result<Comment> {
  let Some(user_id) = author else {
    return Err(Error::Unauthorized);
  };

  draft.validate()?;

  if store.get_user(user_id).await.map_err(Error::store)?.is_none() {
    return Err(Error::Unauthorized);
  }

  let level = match draft.target {
    ParentRef::Article(id) => {
      if store.get_article(id).await.map_err(Error::store)?.is_none() {
        return Err(Error::ResourceNotFound(draft.target));
      }
      0
    }
    ParentRef::Comment(id) => {
      let parent = store
        .get_comment(id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::ParentCommentNotFound(id))?;
      level_of(store, &parent).await? + 1
    }
  };

  if level >= policy.max_depth {
    if policy.enforce_on_write {
      return Err(Error::DepthExceeded { level, max_depth: policy.max_depth });
    }
    warn!(
      target_ref = %draft.target,
      level,
      max_depth = policy.max_depth,
      "storing reply below the visible depth; reads will not return it"
    );
  }

  if let Some(key) = draft.client_key {
    let existing = store
      .find_comment_by_client_key(user_id, key)
      .await
      .map_err(Error::store)?;
    if let Some(existing) = existing {
      debug!(comment_id = %existing.id, client_key = %key, "duplicate submit");
      return Ok(existing);
    }
  }

  let comment = store
    .insert_comment(NewComment {
      resource: draft.target,
      body: draft.body,
      user_id,
      client_key: draft.client_key,
    })
    .await
    .map_err(Error::store)?;

  debug!(comment_id = %comment.id, level, "created comment");
  Ok(comment)
}

/// Level of an existing comment, found by walking up to its article.
async fn level_of<S: CommentStore>(store: &S, comment: &Comment) -> Result<u32> {
  let mut level = 0;
  let mut parent = comment.resource;

  while let ParentRef::Comment(id) = parent {
    level += 1;
    match store.get_comment(id).await.map_err(Error::store)? {
      Some(c) => parent = c.resource,
      None => break,
    }
  }
  Ok(level)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::{DateTime, Duration, TimeZone, Utc};

  use super::*;
  use crate::{
    account::{Article, NewArticle, NewUser, Session, User},
    bookmark::{Bookmark, Page},
    comment::Author,
    reaction::{ReactionKind, ReactionTally},
  };

  // ── In-memory store ─────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("mem store error")]
  struct MemError;

  #[derive(Default)]
  struct Mem {
    users:    Vec<User>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    tick:     i64,
    frozen:   bool,
  }

  #[derive(Default)]
  struct MemStore {
    inner:        Mutex<Mem>,
    children_ops: Mutex<usize>,
  }

  fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
  }

  impl MemStore {
    fn freeze_clock(&self) { self.inner.lock().unwrap().frozen = true; }

    fn comment_count(&self) -> usize { self.inner.lock().unwrap().comments.len() }
  }

  impl CommentStore for MemStore {
    type Error = MemError;

    async fn add_user(&self, input: NewUser) -> Result<User, MemError> {
      let user = User {
        id:         Uuid::new_v4(),
        name:       input.name,
        username:   input.username,
        email:      input.email,
        created_at: epoch(),
      };
      self.inner.lock().unwrap().users.push(user.clone());
      Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, MemError> {
      Ok(self.inner.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(
      &self,
      _username: &str,
    ) -> Result<Option<User>, MemError> {
      unimplemented!()
    }

    async fn create_session(&self, _session: Session) -> Result<(), MemError> {
      unimplemented!()
    }

    async fn user_for_session(
      &self,
      _token_hash: &str,
      _now: DateTime<Utc>,
    ) -> Result<Option<User>, MemError> {
      unimplemented!()
    }

    async fn revoke_session(&self, _token_hash: &str) -> Result<bool, MemError> {
      unimplemented!()
    }

    async fn add_article(&self, input: NewArticle) -> Result<Article, MemError> {
      let article = Article {
        id:                  Uuid::new_v4(),
        author_id:           input.author_id,
        title:               input.title,
        handle:              input.handle,
        delete_scheduled_at: None,
        created_at:          epoch(),
      };
      self.inner.lock().unwrap().articles.push(article.clone());
      Ok(article)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, MemError> {
      Ok(
        self
          .inner
          .lock()
          .unwrap()
          .articles
          .iter()
          .find(|a| a.id == id)
          .cloned(),
      )
    }

    async fn schedule_article_deletion(
      &self,
      _id: Uuid,
      _at: Option<DateTime<Utc>>,
    ) -> Result<bool, MemError> {
      unimplemented!()
    }

    async fn scheduled_articles(
      &self,
      _author_id: Uuid,
    ) -> Result<Vec<Article>, MemError> {
      unimplemented!()
    }

    async fn purge_expired_articles(
      &self,
      _now: DateTime<Utc>,
    ) -> Result<Vec<Article>, MemError> {
      unimplemented!()
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>, MemError> {
      Ok(
        self
          .inner
          .lock()
          .unwrap()
          .comments
          .iter()
          .find(|c| c.id == id)
          .cloned(),
      )
    }

    async fn find_comment_by_client_key(
      &self,
      user_id: Uuid,
      client_key: Uuid,
    ) -> Result<Option<Comment>, MemError> {
      Ok(
        self
          .inner
          .lock()
          .unwrap()
          .comments
          .iter()
          .find(|c| c.user_id == user_id && c.client_key == Some(client_key))
          .cloned(),
      )
    }

    async fn insert_comment(&self, input: NewComment) -> Result<Comment, MemError> {
      let mut mem = self.inner.lock().unwrap();
      if !mem.frozen {
        mem.tick += 1;
      }
      let comment = Comment {
        id:         Uuid::new_v4(),
        resource:   input.resource,
        body:       input.body,
        user_id:    input.user_id,
        client_key: input.client_key,
        created_at: epoch() + Duration::seconds(mem.tick),
      };
      mem.comments.push(comment.clone());
      Ok(comment)
    }

    async fn children_of(
      &self,
      parents: &[ParentRef],
    ) -> Result<Vec<CommentRecord>, MemError> {
      *self.children_ops.lock().unwrap() += 1;
      let mem = self.inner.lock().unwrap();
      let mut out: Vec<CommentRecord> = mem
        .comments
        .iter()
        .filter(|c| parents.contains(&c.resource))
        .map(|c| {
          let user = mem.users.iter().find(|u| u.id == c.user_id).unwrap();
          CommentRecord { comment: c.clone(), author: user.author() }
        })
        .collect();
      out.sort_by_key(|r| r.comment.created_at);
      Ok(out)
    }

    async fn toggle_reaction(
      &self,
      _target: ParentRef,
      _user_id: Uuid,
      _kind: ReactionKind,
    ) -> Result<bool, MemError> {
      unimplemented!()
    }

    async fn reaction_tallies(
      &self,
      _target: ParentRef,
    ) -> Result<Vec<ReactionTally>, MemError> {
      unimplemented!()
    }

    async fn toggle_bookmark(
      &self,
      _target: ParentRef,
      _user_id: Uuid,
    ) -> Result<bool, MemError> {
      unimplemented!()
    }

    async fn bookmark_exists(
      &self,
      _target: ParentRef,
      _user_id: Uuid,
    ) -> Result<bool, MemError> {
      unimplemented!()
    }

    async fn list_bookmarks(
      &self,
      _user_id: Uuid,
      _page: Page,
    ) -> Result<Vec<Bookmark>, MemError> {
      unimplemented!()
    }
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  async fn fixture() -> (MemStore, User, Article) {
    let store = MemStore::default();
    let user = store
      .add_user(NewUser {
        name:     "Ada".into(),
        username: "ada".into(),
        email:    "ada@example.com".into(),
      })
      .await
      .unwrap();
    let article = store
      .add_article(NewArticle {
        author_id: user.id,
        title:     "Hello".into(),
        handle:    "hello".into(),
      })
      .await
      .unwrap();
    (store, user, article)
  }

  async fn post(
    store: &MemStore,
    user: &User,
    target: ParentRef,
    body: &str,
  ) -> Comment {
    create_comment(
      store,
      Some(user.id),
      CommentDraft::new(target, body),
      &DepthPolicy::default(),
    )
    .await
    .unwrap()
  }

  /// Pre-order `(id, level, reply count)` triples; pins down the whole shape.
  fn outline(nodes: &[CommentNode]) -> Vec<(Uuid, u32, usize)> {
    let mut out = Vec::new();
    for n in nodes {
      out.push((n.id, n.level, n.replies.len()));
      out.extend(outline(&n.replies));
    }
    out
  }

  // ── Read path ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_resource_has_empty_forest() {
    let (store, _, article) = fixture().await;
    let forest =
      materialize(&store, ParentRef::Article(article.id), &DepthPolicy::default())
        .await
        .unwrap();
    assert!(forest.is_empty());
    // Nothing below level 0, so no further fetches.
    assert_eq!(*store.children_ops.lock().unwrap(), 1);
  }

  #[tokio::test]
  async fn top_level_comments_in_creation_order() {
    let (store, user, article) = fixture().await;
    let root = ParentRef::Article(article.id);
    for body in ["one", "two", "three"] {
      post(&store, &user, root, body).await;
    }

    let forest = materialize(&store, root, &DepthPolicy::default()).await.unwrap();
    let bodies: Vec<_> = forest.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(bodies, ["one", "two", "three"]);
    assert!(forest.iter().all(|n| n.level == 0 && n.replies.is_empty()));
  }

  #[tokio::test]
  async fn reply_under_second_root_builds_expected_forest() {
    let (store, user, article) = fixture().await;
    let a1 = ParentRef::Article(article.id);

    let c1 = post(&store, &user, a1, "C1").await;
    let c2 = post(&store, &user, a1, "C2").await;
    let c3 = post(&store, &user, ParentRef::Comment(c2.id), "C3").await;

    let forest = materialize(&store, a1, &DepthPolicy::default()).await.unwrap();
    assert_eq!(outline(&forest), [(c1.id, 0, 0), (c2.id, 0, 1), (c3.id, 1, 0)]);

    // Level 2 is the deepest visible level; level 3 is stored but not read.
    let c4 = post(&store, &user, ParentRef::Comment(c3.id), "C4").await;
    let c5 = post(&store, &user, ParentRef::Comment(c4.id), "C5").await;
    assert!(store.get_comment(c5.id).await.unwrap().is_some());

    let forest = materialize(&store, a1, &DepthPolicy::default()).await.unwrap();
    assert_eq!(
      outline(&forest),
      [(c1.id, 0, 0), (c2.id, 0, 1), (c3.id, 1, 1), (c4.id, 2, 0)]
    );
  }

  #[tokio::test]
  async fn linear_chain_reaches_deepest_visible_level() {
    let (store, user, article) = fixture().await;
    let a1 = ParentRef::Article(article.id);

    let c1 = post(&store, &user, a1, "C1").await;
    let c2 = post(&store, &user, ParentRef::Comment(c1.id), "C2").await;
    let c3 = post(&store, &user, ParentRef::Comment(c2.id), "C3").await;

    let forest = materialize(&store, a1, &DepthPolicy::default()).await.unwrap();
    assert_eq!(forest.len(), 1);
    let n1 = &forest[0];
    assert_eq!((n1.id, n1.level), (c1.id, 0));
    assert_eq!(n1.author.username, "ada");
    let n2 = &n1.replies[0];
    assert_eq!((n2.id, n2.level), (c2.id, 1));
    let n3 = &n2.replies[0];
    assert_eq!((n3.id, n3.level), (c3.id, 2));
    assert!(n3.replies.is_empty());
  }

  #[tokio::test]
  async fn replies_past_max_depth_are_stored_but_not_read() {
    let (store, user, article) = fixture().await;
    let a1 = ParentRef::Article(article.id);

    let c1 = post(&store, &user, a1, "C1").await;
    let c2 = post(&store, &user, ParentRef::Comment(c1.id), "C2").await;
    let c3 = post(&store, &user, ParentRef::Comment(c2.id), "C3").await;
    let c4 = post(&store, &user, ParentRef::Comment(c3.id), "C4").await;
    post(&store, &user, ParentRef::Comment(c4.id), "C5").await;
    assert_eq!(store.comment_count(), 5);

    let forest = materialize(&store, a1, &DepthPolicy::default()).await.unwrap();
    assert_eq!(forest[0].len(), 3);
    assert!(forest[0].replies[0].replies[0].replies.is_empty());
    assert_eq!(*store.children_ops.lock().unwrap(), 3);
  }

  #[tokio::test]
  async fn colliding_timestamps_each_appear_once() {
    let (store, user, article) = fixture().await;
    let root = ParentRef::Article(article.id);
    store.freeze_clock();

    let a = post(&store, &user, root, "a").await;
    let b = post(&store, &user, root, "b").await;
    post(&store, &user, ParentRef::Comment(a.id), "a.1").await;
    post(&store, &user, ParentRef::Comment(a.id), "a.2").await;

    let forest = materialize(&store, root, &DepthPolicy::default()).await.unwrap();
    let ids: Vec<_> = forest.iter().map(|n| n.id).collect();
    assert_eq!(ids, [a.id, b.id]);
    let replies: Vec<_> =
      forest[0].replies.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(replies, ["a.1", "a.2"]);
  }

  #[test]
  fn assemble_drops_orphaned_records() {
    let author = Author {
      id:       Uuid::nil(),
      name:     "x".into(),
      username: "x".into(),
      email:    "x@example.com".into(),
    };
    let record = |parent: ParentRef| CommentRecord {
      comment: Comment {
        id:         Uuid::new_v4(),
        resource:   parent,
        body:       String::new(),
        user_id:    Uuid::nil(),
        client_key: None,
        created_at: epoch(),
      },
      author:  author.clone(),
    };
    let root = record(ParentRef::Article(Uuid::nil()));
    let child = record(ParentRef::Comment(root.comment.id));
    let stray = record(ParentRef::Comment(Uuid::new_v4()));

    let forest = assemble(vec![vec![root], vec![child, stray]]);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].replies.len(), 1);
  }

  // ── Write path ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_create_is_unauthorized() {
    let (store, _, article) = fixture().await;
    let err = create_comment(
      &store,
      None,
      CommentDraft::new(ParentRef::Article(article.id), "hi"),
      &DepthPolicy::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(store.comment_count(), 0);
  }

  #[tokio::test]
  async fn unknown_author_is_unauthorized() {
    let (store, _, article) = fixture().await;
    let err = create_comment(
      &store,
      Some(Uuid::new_v4()),
      CommentDraft::new(ParentRef::Article(article.id), "hi"),
      &DepthPolicy::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
  }

  #[tokio::test]
  async fn missing_targets_are_not_found() {
    let (store, user, _) = fixture().await;
    let policy = DepthPolicy::default();

    let missing = ParentRef::Article(Uuid::new_v4());
    let err = create_comment(
      &store,
      Some(user.id),
      CommentDraft::new(missing, "hi"),
      &policy,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound(r) if r == missing));
    assert_eq!(err.to_string(), "Resource not found");

    let err = create_comment(
      &store,
      Some(user.id),
      CommentDraft::new(ParentRef::Comment(Uuid::new_v4()), "hi"),
      &policy,
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Parent comment not found");
    assert_eq!(store.comment_count(), 0);
  }

  #[tokio::test]
  async fn enforced_depth_rejects_deep_reply() {
    let (store, user, article) = fixture().await;
    let c1 = post(&store, &user, ParentRef::Article(article.id), "C1").await;
    let c2 = post(&store, &user, ParentRef::Comment(c1.id), "C2").await;
    let c3 = post(&store, &user, ParentRef::Comment(c2.id), "C3").await;

    let policy = DepthPolicy { enforce_on_write: true, ..Default::default() };
    let err = create_comment(
      &store,
      Some(user.id),
      CommentDraft::new(ParentRef::Comment(c3.id), "too deep"),
      &policy,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { level: 3, max_depth: 3 }));
    assert_eq!(store.comment_count(), 3);
  }

  #[tokio::test]
  async fn depth_error_reports_the_true_level() {
    let (store, user, article) = fixture().await;
    let mut parent = ParentRef::Article(article.id);
    for body in ["C1", "C2", "C3", "C4", "C5", "C6"] {
      parent = ParentRef::Comment(post(&store, &user, parent, body).await.id);
    }

    let policy = DepthPolicy { enforce_on_write: true, ..Default::default() };
    let err = create_comment(
      &store,
      Some(user.id),
      CommentDraft::new(parent, "deeper still"),
      &policy,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { level: 6, max_depth: 3 }));
  }

  #[tokio::test]
  async fn same_client_key_returns_existing_comment() {
    let (store, user, article) = fixture().await;
    let key = Uuid::new_v4();
    let draft = CommentDraft {
      target:     ParentRef::Article(article.id),
      body:       "once".into(),
      client_key: Some(key),
    };
    let policy = DepthPolicy::default();

    let first =
      create_comment(&store, Some(user.id), draft.clone(), &policy).await.unwrap();
    let second =
      create_comment(&store, Some(user.id), draft, &policy).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.client_key, Some(key));
    assert_eq!(store.comment_count(), 1);
  }
}
