//! Cookie sessions: token minting, the user extractors and the session
//! endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/session` | `{"user": null}` when anonymous |
//! | `POST` | `/session/logout` | Revokes the session and clears the cookie |

use axum::{
  extract::{FromRequestParts, State},
  http::request::Parts,
  response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use scriv_core::{
  account::{Session, User},
  comment::Author,
  store::CommentStore,
};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::{
  ApiState,
  error::{ApiError, ApiResult, Success},
};

const TOKEN_BYTES: usize = 32;

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh random session token, URL-safe base64.
pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The digest stored in place of the raw token.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Create a session for `user_id` and return the raw token for the cookie.
pub async fn issue_session<S: CommentStore>(
  store: &S,
  user_id: Uuid,
  ttl: Duration,
) -> Result<String, S::Error> {
  let token = generate_token();
  let now = Utc::now();
  store
    .create_session(Session {
      token_hash: hash_token(&token),
      user_id,
      created_at: now,
      expires_at: now + ttl,
    })
    .await?;
  info!(%user_id, expires_in_days = ttl.num_days(), "issued session");
  Ok(token)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The session user, if the request carries a live session cookie.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
  pub fn id(&self) -> Option<Uuid> { self.0.as_ref().map(|u| u.id) }
}

impl<S: CommentStore> FromRequestParts<ApiState<S>> for MaybeUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token_hash) = jar
      .get(&state.settings.cookie_name)
      .map(|c| hash_token(c.value()))
    else {
      return Ok(MaybeUser(None));
    };

    let user = state
      .store
      .user_for_session(&token_hash, Utc::now())
      .await
      .map_err(ApiError::store)?;
    Ok(MaybeUser(user))
  }
}

/// Like [`MaybeUser`] but rejects anonymous requests with `UNAUTHORIZED`.
pub struct AuthUser(pub User);

impl<S: CommentStore> FromRequestParts<ApiState<S>> for AuthUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
    user.map(AuthUser).ok_or_else(ApiError::unauthorized)
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WhoAmI {
  pub user: Option<Author>,
}

/// `GET /session`
pub async fn whoami(user: MaybeUser) -> ApiResult<WhoAmI> {
  Ok(Success(WhoAmI { user: user.0.as_ref().map(User::author) }))
}

#[derive(Debug, Serialize)]
pub struct LoggedOut {
  pub revoked: bool,
}

/// `POST /session/logout`
pub async fn logout<S: CommentStore>(
  State(state): State<ApiState<S>>,
  jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
  let name = state.settings.cookie_name.clone();
  let token_hash = jar
    .get(&name)
    .map(|c| hash_token(c.value()))
    .ok_or_else(ApiError::unauthorized)?;

  let revoked = state
    .store
    .revoke_session(&token_hash)
    .await
    .map_err(ApiError::store)?;

  let jar = jar.remove(Cookie::build(name).path("/"));
  Ok((jar, Success(LoggedOut { revoked })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_unique_and_url_safe() {
    let a = generate_token();
    let b = generate_token();
    assert_ne!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
  }

  #[test]
  fn hash_is_hex_sha256() {
    let h = hash_token("token");
    assert_eq!(h.len(), 64);
    assert_eq!(h, hash_token("token"));
    assert_ne!(h, hash_token("other"));
  }
}
