//! Error types for `scriv-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{resource::ParentRef, result::ErrorCode};

#[derive(Debug, Error)]
pub enum Error {
  #[error("Unauthorized")]
  Unauthorized,

  #[error("Forbidden")]
  Forbidden,

  #[error("Resource not found")]
  ResourceNotFound(ParentRef),

  #[error("Parent comment not found")]
  ParentCommentNotFound(Uuid),

  #[error("{0}")]
  Validation(String),

  #[error("reply would sit at level {level}, deeper than the {max_depth} visible levels")]
  DepthExceeded { level: u32, max_depth: u32 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error; used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// The machine-readable code sent alongside the message.
  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Unauthorized => ErrorCode::Unauthorized,
      Self::Forbidden => ErrorCode::Forbidden,
      Self::ResourceNotFound(_) | Self::ParentCommentNotFound(_) => {
        ErrorCode::NotFound
      }
      Self::Validation(_) => ErrorCode::Validation,
      Self::DepthExceeded { .. } => ErrorCode::DepthExceeded,
      Self::Store(_) => ErrorCode::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
