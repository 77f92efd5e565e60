//! Handlers for `/comments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/comments?resource_id=..&resource_type=..` | Materialised forest |
//! | `POST` | `/comments` | Body: `{"resource_id", "resource_type", "body", "client_key"?}` |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use scriv_core::{
  comment::{CommentDraft, CommentNode},
  store::CommentStore,
  thread::{create_comment, materialize},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::{ApiError, ApiResult, Success},
  extract::{Json, Query, ResourceParams},
  session::MaybeUser,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /comments?resource_id=<uuid>&resource_type=ARTICLE|COMMENT`
pub async fn list<S: CommentStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ResourceParams>,
) -> ApiResult<Vec<CommentNode>> {
  let forest = materialize(&*state.store, params.target(), &state.settings.depth)
    .await
    .map_err(ApiError::store)?;
  Ok(Success(forest))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub resource:   ResourceParams,
  pub body:       String,
  #[serde(default)]
  pub client_key: Option<Uuid>,
}

/// `POST /comments`
///
/// The session is checked before the body so that anonymous callers always
/// see `UNAUTHORIZED`.
pub async fn create<S: CommentStore>(
  State(state): State<ApiState<S>>,
  user: MaybeUser,
  body: Result<Json<CreateBody>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
  if user.0.is_none() {
    return Err(ApiError::unauthorized());
  }
  let Json(body) = body?;

  let draft = CommentDraft {
    target:     body.resource.target(),
    body:       body.body,
    client_key: body.client_key,
  };
  let comment =
    create_comment(&*state.store, user.id(), draft, &state.settings.depth).await?;
  Ok((StatusCode::CREATED, Success(comment)))
}
