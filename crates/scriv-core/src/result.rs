//! The uniform response envelope shared by server and client.
//!
//! Every operation answers with either
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": "...", "code": "..."}`.

use serde::{
  Deserialize, Deserializer, Serialize, Serializer,
  de,
  ser::SerializeMap,
};

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  Unauthorized,
  Forbidden,
  NotFound,
  Validation,
  DepthExceeded,
  Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
  pub code:  ErrorCode,
  pub error: String,
}

/// Discriminated result of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
  Success(T),
  Failure(Failure),
}

impl<T> ActionResult<T> {
  pub fn failure(code: ErrorCode, error: impl Into<String>) -> Self {
    Self::Failure(Failure { code, error: error.into() })
  }

  pub fn into_result(self) -> Result<T, Failure> {
    match self {
      Self::Success(data) => Ok(data),
      Self::Failure(f) => Err(f),
    }
  }
}

impl<T: Serialize> Serialize for ActionResult<T> {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      Self::Success(data) => {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("success", &true)?;
        map.serialize_entry("data", data)?;
        map.end()
      }
      Self::Failure(Failure { code, error }) => {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("success", &false)?;
        map.serialize_entry("error", error)?;
        map.serialize_entry("code", code)?;
        map.end()
      }
    }
  }
}

#[derive(Deserialize)]
struct RawResult<T> {
  success: bool,
  data:    Option<T>,
  #[serde(default)]
  error:   Option<String>,
  #[serde(default)]
  code:    Option<ErrorCode>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ActionResult<T> {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = RawResult::<T>::deserialize(deserializer)?;
    if raw.success {
      raw
        .data
        .map(Self::Success)
        .ok_or_else(|| de::Error::missing_field("data"))
    } else {
      Ok(Self::Failure(Failure {
        code:  raw.code.unwrap_or(ErrorCode::Internal),
        error: raw.error.unwrap_or_else(|| "An unknown error occurred".into()),
      }))
    }
  }
}
