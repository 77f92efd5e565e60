//! Handlers for `/reactions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reactions/toggle` | Body: `{"resource_id", "resource_type", "reaction_type"}` |
//! | `GET`  | `/reactions?resource_id=..&resource_type=..` | One entry per reaction kind |

use axum::extract::State;
use scriv_core::{
  Error,
  reaction::{ReactionKind, ReactionStatus, ReactionToggle},
  store::CommentStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::{ApiError, ApiResult, Success},
  extract::{Json, Query, ResourceParams},
  session::{AuthUser, MaybeUser},
};

#[derive(Debug, Deserialize)]
pub struct ToggleBody {
  #[serde(flatten)]
  pub resource:      ResourceParams,
  pub reaction_type: ReactionKind,
}

/// `POST /reactions/toggle`
pub async fn toggle<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
  Json(body): Json<ToggleBody>,
) -> ApiResult<ReactionToggle> {
  let target = body.resource.target();
  if !state.store.resource_exists(target).await.map_err(ApiError::store)? {
    return Err(Error::ResourceNotFound(target).into());
  }

  let reacted = state
    .store
    .toggle_reaction(target, user.id, body.reaction_type)
    .await
    .map_err(ApiError::store)?;
  Ok(Success(ReactionToggle {
    reaction_type: body.reaction_type,
    resource: target,
    reacted,
  }))
}

/// `GET /reactions?resource_id=<uuid>&resource_type=ARTICLE|COMMENT`
///
/// Kinds nobody has used are reported with a zero count.
pub async fn summary<S: CommentStore>(
  State(state): State<ApiState<S>>,
  viewer: MaybeUser,
  Query(params): Query<ResourceParams>,
) -> ApiResult<Vec<ReactionStatus>> {
  let tallies = state
    .store
    .reaction_tallies(params.target())
    .await
    .map_err(ApiError::store)?;

  let statuses = ReactionKind::ALL
    .into_iter()
    .map(|kind| match tallies.iter().find(|t| t.kind == kind) {
      Some(tally) => tally.status_for(viewer.id()),
      None => ReactionStatus { reaction_type: kind, count: 0, is_reacted: false },
    })
    .collect();
  Ok(Success(statuses))
}
