//! Thread session: the cache plus the server round-trips that keep it honest.

use anyhow::{Result, bail};
use chrono::Utc;
use scriv_core::{
  comment::{Author, Comment, CommentNode},
  resource::ParentRef,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  cache::{Optimistic, TreeCache},
  client::ApiClient,
};

pub struct App {
  pub client: ApiClient,
  pub cache:  TreeCache,
  me:         Option<Author>,
}

impl App {
  pub fn new(client: ApiClient, max_depth: u32) -> Self {
    Self { client, cache: TreeCache::new(max_depth), me: None }
  }

  /// The session user, fetched once.
  pub async fn me(&mut self) -> Result<Author> {
    if let Some(me) = &self.me {
      return Ok(me.clone());
    }
    let Some(me) = self.client.whoami().await? else {
      bail!("not signed in: pass --session or set SCRIV_SESSION");
    };
    self.me = Some(me.clone());
    Ok(me)
  }

  /// The forest below `root`, from cache when present.
  pub async fn thread(&mut self, root: ParentRef) -> Result<&[CommentNode]> {
    if self.cache.get(&root).is_none() {
      let forest = self.client.comments(root).await?;
      self.cache.put(root, forest);
    }
    Ok(self.cache.get(&root).unwrap_or_default())
  }

  /// Submit a comment on `target` within the thread rooted at `root`.
  ///
  /// The comment is shown immediately as a pending node, then reconciled with
  /// the server's copy or discarded if the server refuses it.
  pub async fn submit(
    &mut self,
    root: ParentRef,
    target: ParentRef,
    body: &str,
  ) -> Result<Comment> {
    let me = self.me().await?;
    self.thread(root).await?;

    let client_key = Uuid::new_v4();
    let shown = self.cache.insert_optimistic(root, Optimistic {
      client_key,
      target,
      body: body.trim().to_owned(),
      author: me.clone(),
      created_at: Utc::now(),
    });
    debug!(%client_key, shown, "optimistic comment");

    match self.client.create_comment(target, body, client_key).await {
      Ok(comment) => {
        if shown {
          self.cache.reconcile(client_key, &comment, me);
        }
        Ok(comment)
      }
      Err(e) => {
        if shown {
          self.cache.discard(client_key);
        }
        warn!(%client_key, error = %e, "comment rejected");
        Err(e)
      }
    }
  }
}
