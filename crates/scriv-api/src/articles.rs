//! Article lifecycle endpoints: deletion scheduling and the cleanup job.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/articles/scheduled` | Caller's articles awaiting deletion, soonest first |
//! | `POST` | `/articles/{id}/deletion` | Body: `{"delete_at": <rfc3339>\|null}`; author only |
//! | `GET`/`POST` | `/cron/cleanup-articles` | `x-cron-secret` header when configured |

use axum::{
  extract::{Path, State},
  http::HeaderMap,
};
use chrono::{DateTime, Utc};
use scriv_core::{Error, account::Article, resource::ParentRef, store::CommentStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  ApiState,
  error::{ApiError, ApiResult, Success},
  extract::Json,
  session::AuthUser,
};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

// ─── Scheduling ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
  /// `null` cancels a pending deletion.
  pub delete_at: Option<DateTime<Utc>>,
}

/// `POST /articles/{id}/deletion`
pub async fn schedule_deletion<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleBody>,
) -> ApiResult<Article> {
  let mut article = state
    .store
    .get_article(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(Error::ResourceNotFound(ParentRef::Article(id)))?;
  if article.author_id != user.id {
    return Err(Error::Forbidden.into());
  }

  state
    .store
    .schedule_article_deletion(id, body.delete_at)
    .await
    .map_err(ApiError::store)?;
  match body.delete_at {
    Some(at) => info!(article_id = %id, %at, "article scheduled for deletion"),
    None => info!(article_id = %id, "article deletion cancelled"),
  }

  article.delete_scheduled_at = body.delete_at;
  Ok(Success(article))
}

/// `GET /articles/scheduled`
pub async fn scheduled<S: CommentStore>(
  State(state): State<ApiState<S>>,
  AuthUser(user): AuthUser,
) -> ApiResult<Vec<Article>> {
  let articles = state
    .store
    .scheduled_articles(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Success(articles))
}

// ─── Cleanup job ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CleanupReport {
  pub deleted_count:    usize,
  pub deleted_articles: Vec<Article>,
}

/// `GET|POST /cron/cleanup-articles`
pub async fn cleanup<S: CommentStore>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
) -> ApiResult<CleanupReport> {
  if let Some(secret) = &state.settings.cron_secret {
    let presented = headers
      .get(CRON_SECRET_HEADER)
      .and_then(|v| v.to_str().ok());
    if !presented.is_some_and(|p| secret_matches(p, secret)) {
      warn!("cleanup request rejected: bad or missing cron secret");
      return Err(ApiError::unauthorized());
    }
  }

  let deleted = state
    .store
    .purge_expired_articles(Utc::now())
    .await
    .map_err(ApiError::store)?;
  info!(deleted = deleted.len(), "expired articles deleted");

  Ok(Success(CleanupReport {
    deleted_count:    deleted.len(),
    deleted_articles: deleted,
  }))
}

/// Compares SHA-256 digests, so timing does not track how many leading bytes
/// of `presented` match.
fn secret_matches(presented: &str, expected: &str) -> bool {
  Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
