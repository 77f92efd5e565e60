//! Plain-text rendering of comment forests.

use std::fmt::Write as _;

use scriv_core::comment::CommentNode;

use crate::cache::TreeCache;

/// Render `forest` as an indented outline, two spaces per level. Nodes still
/// awaiting confirmation are marked `(pending)`.
pub fn forest(forest: &[CommentNode], cache: &TreeCache) -> String {
  let mut out = String::new();
  for node in forest {
    write_node(&mut out, node, cache);
  }
  out
}

fn write_node(out: &mut String, node: &CommentNode, cache: &TreeCache) {
  let indent = "  ".repeat(node.level as usize);
  let pending = if cache.is_pending(node.id) { " (pending)" } else { "" };
  let _ = writeln!(
    out,
    "{indent}- @{} {}{pending}: {}",
    node.author.username,
    node.created_at.format("%Y-%m-%d %H:%M"),
    node.body
  );
  for reply in &node.replies {
    write_node(out, reply, cache);
  }
}
