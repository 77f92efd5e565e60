//! Client-side cache of materialised comment threads.
//!
//! Forests are cached per root resource. A submitted comment is shown at once
//! as a synthetic node whose id is the client key, then replaced in place once
//! the server confirms it ([`TreeCache::reconcile`]) or removed if the call
//! failed ([`TreeCache::discard`]).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use scriv_core::{
  comment::{Author, Comment, CommentNode},
  resource::ParentRef,
};
use uuid::Uuid;

pub struct TreeCache {
  max_depth: u32,
  forests:   HashMap<ParentRef, Vec<CommentNode>>,
  /// Client keys of synthetic nodes awaiting confirmation.
  pending:   HashSet<Uuid>,
}

/// A comment the user has submitted but the server has not yet confirmed.
pub struct Optimistic {
  pub client_key: Uuid,
  pub target:     ParentRef,
  pub body:       String,
  pub author:     Author,
  pub created_at: DateTime<Utc>,
}

impl TreeCache {
  /// `max_depth` mirrors the server's visible depth so that optimistic nodes
  /// never appear where a refetch would not show them.
  pub fn new(max_depth: u32) -> Self {
    Self { max_depth, forests: HashMap::new(), pending: HashSet::new() }
  }

  pub fn get(&self, root: &ParentRef) -> Option<&[CommentNode]> {
    self.forests.get(root).map(Vec::as_slice)
  }

  pub fn put(&mut self, root: ParentRef, forest: Vec<CommentNode>) {
    self.forests.insert(root, forest);
  }

  pub fn is_pending(&self, id: Uuid) -> bool { self.pending.contains(&id) }

  /// Drop the cached forest for `root` so the next read refetches it.
  pub fn invalidate(&mut self, root: &ParentRef) {
    if let Some(forest) = self.forests.remove(root) {
      let mut ids = Vec::new();
      collect_ids(&forest, &mut ids);
      for id in ids {
        self.pending.remove(&id);
      }
    }
  }

  /// Prepend a synthetic node for `draft` into the cached forest of `root`.
  ///
  /// A draft targeting `root` itself becomes a top-level node; otherwise it
  /// is placed at the head of its parent's replies. Returns `false` (and
  /// changes nothing) if the forest is not cached, the parent is not in it,
  /// or the reply would sit below the visible depth.
  pub fn insert_optimistic(&mut self, root: ParentRef, draft: Optimistic) -> bool {
    let Some(forest) = self.forests.get_mut(&root) else {
      return false;
    };

    let (siblings, level) = if draft.target == root {
      (forest, 0)
    } else {
      let ParentRef::Comment(parent_id) = draft.target else {
        return false;
      };
      let Some(parent) = forest.iter_mut().find_map(|n| n.find_mut(parent_id)) else {
        return false;
      };
      let level = parent.level + 1;
      (&mut parent.replies, level)
    };
    if level >= self.max_depth {
      return false;
    }

    siblings.insert(0, CommentNode {
      id: draft.client_key,
      body: draft.body,
      level,
      created_at: draft.created_at,
      author: draft.author,
      replies: Vec::new(),
    });
    self.pending.insert(draft.client_key);
    true
  }

  /// Replace the synthetic node keyed by `client_key` with the confirmed
  /// server comment. Replies already attached under it are kept.
  pub fn reconcile(&mut self, client_key: Uuid, comment: &Comment, author: Author) -> bool {
    if !self.pending.remove(&client_key) {
      return false;
    }
    let node = self
      .forests
      .values_mut()
      .find_map(|f| f.iter_mut().find_map(|n| n.find_mut(client_key)));
    match node {
      Some(node) => {
        node.id = comment.id;
        node.body = comment.body.clone();
        node.created_at = comment.created_at;
        node.author = author;
        true
      }
      None => false,
    }
  }

  /// Remove the synthetic node keyed by `client_key`.
  pub fn discard(&mut self, client_key: Uuid) -> bool {
    if !self.pending.remove(&client_key) {
      return false;
    }
    self
      .forests
      .values_mut()
      .any(|forest| remove_node(forest, client_key).is_some())
  }
}

fn collect_ids(nodes: &[CommentNode], out: &mut Vec<Uuid>) {
  for n in nodes {
    out.push(n.id);
    collect_ids(&n.replies, out);
  }
}

fn remove_node(nodes: &mut Vec<CommentNode>, id: Uuid) -> Option<CommentNode> {
  if let Some(pos) = nodes.iter().position(|n| n.id == id) {
    return Some(nodes.remove(pos));
  }
  nodes.iter_mut().find_map(|n| remove_node(&mut n.replies, id))
}
