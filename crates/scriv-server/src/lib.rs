//! Scriv HTTP server: configuration and application assembly.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite store
//! and serves [`app`].

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use chrono::Duration;
use scriv_api::{ApiSettings, ApiState, DEFAULT_COOKIE_NAME, api_router};
use scriv_core::{store::CommentStore, thread::DepthPolicy};
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCRIV_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  pub cookie_name:            String,
  pub session_ttl_days:       i64,
  /// Shared secret the cleanup cron job must present.
  pub cron_secret:            Option<String>,
  /// Visible comment levels.
  pub max_depth:              u32,
  pub enforce_depth_on_write: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "127.0.0.1".to_string(),
      port:                   4000,
      store_path:             PathBuf::from("~/.local/share/scriv/scriv.db"),
      cookie_name:            DEFAULT_COOKIE_NAME.to_string(),
      session_ttl_days:       30,
      cron_secret:            None,
      max_depth:              DepthPolicy::DEFAULT_MAX_DEPTH,
      enforce_depth_on_write: false,
    }
  }
}

impl ServerConfig {
  pub fn session_ttl(&self) -> Duration { Duration::days(self.session_ttl_days) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      cookie_name: self.cookie_name.clone(),
      depth:       DepthPolicy {
        max_depth:        self.max_depth,
        enforce_on_write: self.enforce_depth_on_write,
      },
      cron_secret: self.cron_secret.clone().filter(|s| !s.is_empty()),
    }
  }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application router: the API mounted under `/api`.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: CommentStore + 'static,
{
  Router::new().nest("/api", api_router(ApiState::new(store, config.api_settings())))
}
