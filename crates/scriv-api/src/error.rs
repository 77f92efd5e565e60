//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the server as the uniform envelope
//! `{"success": false, "error": "...", "code": "..."}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use scriv_core::result::{ActionResult, ErrorCode};
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] scriv_core::Error),

  /// The request body or query string could not be decoded.
  #[error("{0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error; used as `.map_err(ApiError::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn unauthorized() -> Self { Self::Core(scriv_core::Error::Unauthorized) }

  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Core(e) => e.code(),
      Self::BadRequest(_) => ErrorCode::Validation,
      Self::Store(_) => ErrorCode::Internal,
    }
  }
}

fn status_for(code: ErrorCode) -> StatusCode {
  match code {
    ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
    ErrorCode::Forbidden => StatusCode::FORBIDDEN,
    ErrorCode::NotFound => StatusCode::NOT_FOUND,
    ErrorCode::Validation | ErrorCode::DepthExceeded => {
      StatusCode::UNPROCESSABLE_ENTITY
    }
    ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.code();
    let message = match code {
      ErrorCode::Internal => {
        error!(error = %self, "request failed");
        "An unexpected error occurred".to_owned()
      }
      _ => self.to_string(),
    };
    let body: ActionResult<()> = ActionResult::failure(code, message);
    (status_for(code), Json(body)).into_response()
  }
}

/// A successful handler result, wrapped in the success envelope.
pub struct Success<T>(pub T);

impl<T: serde::Serialize> IntoResponse for Success<T> {
  fn into_response(self) -> Response {
    Json(ActionResult::Success(self.0)).into_response()
  }
}

pub type ApiResult<T> = Result<Success<T>, ApiError>;
