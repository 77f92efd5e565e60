//! Handlers for `/bookmarks` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/bookmarks/toggle` | Body: `{"resource_id", "resource_type"}` |
//! | `GET`  | `/bookmarks/status?resource_id=..&resource_type=..` | |
//! | `GET`  | `/bookmarks?limit=..&offset=..` | Newest first, limit 1..=100 |

use axum::extract::State;
use scriv_core::{
  Error,
  bookmark::{Bookmark, BookmarkState, Page},
  store::CommentStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::{ApiError, ApiResult, Success},
  extract::{Json, Query, ResourceParams},
  session::AuthUser,
};

/// `POST /bookmarks/toggle`
pub async fn toggle<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
  Json(body): Json<ResourceParams>,
) -> ApiResult<BookmarkState> {
  let target = body.target();
  if !state.store.resource_exists(target).await.map_err(ApiError::store)? {
    return Err(Error::ResourceNotFound(target).into());
  }

  let bookmarked = state
    .store
    .toggle_bookmark(target, user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Success(BookmarkState { bookmarked }))
}

/// `GET /bookmarks/status`
pub async fn status<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
  Query(params): Query<ResourceParams>,
) -> ApiResult<BookmarkState> {
  let bookmarked = state
    .store
    .bookmark_exists(params.target(), user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Success(BookmarkState { bookmarked }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /bookmarks[?limit=<n>&offset=<n>]`
pub async fn list<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
  Query(params): Query<PageParams>,
) -> ApiResult<Vec<Bookmark>> {
  let bookmarks = state
    .store
    .list_bookmarks(user.id, Page::new(params.limit, params.offset))
    .await
    .map_err(ApiError::store)?;
  Ok(Success(bookmarks))
}
