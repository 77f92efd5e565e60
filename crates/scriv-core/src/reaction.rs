//! Reactions and their per-resource aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::ParentRef;

/// The fixed palette of reactions.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
  Love,
  Unicorn,
  Wow,
  Fire,
  Cry,
  Haha,
}

impl ReactionKind {
  pub const ALL: [ReactionKind; 6] = [
    Self::Love,
    Self::Unicorn,
    Self::Wow,
    Self::Fire,
    Self::Cry,
    Self::Haha,
  ];

  /// The string stored in the `reaction_type` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Love => "LOVE",
      Self::Unicorn => "UNICORN",
      Self::Wow => "WOW",
      Self::Fire => "FIRE",
      Self::Cry => "CRY",
      Self::Haha => "HAHA",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.as_str() == s)
  }
}

/// Outcome of toggling a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionToggle {
  pub reaction_type: ReactionKind,
  pub resource:      ParentRef,
  /// `true` if the reaction now exists, `false` if it was removed.
  pub reacted:       bool,
}

/// Raw aggregate for one reaction kind on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTally {
  pub kind:     ReactionKind,
  pub reactors: Vec<Uuid>,
}

/// What a viewer sees for one reaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionStatus {
  pub reaction_type: ReactionKind,
  pub count:         usize,
  pub is_reacted:    bool,
}

impl ReactionTally {
  /// Project the tally for `viewer`; anonymous viewers never count as having
  /// reacted.
  pub fn status_for(&self, viewer: Option<Uuid>) -> ReactionStatus {
    ReactionStatus {
      reaction_type: self.kind,
      count:         self.reactors.len(),
      is_reacted:    viewer.is_some_and(|v| self.reactors.contains(&v)),
    }
  }
}
