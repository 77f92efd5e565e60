//! Request extractors that report rejections through [`ApiError`].
//!
//! axum's own `Json` and `Query` reject with plain-text bodies; these wrap
//! them so malformed input still produces the JSON envelope with code
//! `VALIDATION`.

use axum::{
  extract::{FromRequest, FromRequestParts, Request},
  http::request::Parts,
};
use scriv_core::resource::{ParentRef, ResourceType};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::ApiError;

pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match axum::Json::<T>::from_request(req, state).await {
      Ok(axum::Json(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match axum::extract::Query::<T>::from_request_parts(parts, state).await {
      Ok(axum::extract::Query(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

/// The `(resource_id, resource_type)` pair as it arrives in query strings and
/// bodies.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResourceParams {
  pub resource_id:   Uuid,
  pub resource_type: ResourceType,
}

impl ResourceParams {
  pub fn target(&self) -> ParentRef {
    ParentRef::new(self.resource_type, self.resource_id)
  }
}
