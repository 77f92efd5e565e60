//! JSON API for Scriv comment threads, reactions and bookmarks.
//!
//! Exposes an axum [`Router`] backed by any [`scriv_core::store::CommentStore`].
//! Every response body is the envelope from [`scriv_core::result`]. TLS and
//! the login handshake are the caller's responsibility; sessions are minted
//! with [`session::issue_session`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", scriv_api::api_router(state))
//! ```

pub mod articles;
pub mod bookmarks;
pub mod comments;
pub mod error;
pub mod extract;
pub mod reactions;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use scriv_core::{store::CommentStore, thread::DepthPolicy};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

pub const DEFAULT_COOKIE_NAME: &str = "scriv_session";

// ─── State ────────────────────────────────────────────────────────────────────

/// Per-deployment settings the handlers read.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub cookie_name: String,
  pub depth:       DepthPolicy,
  /// When set, the cleanup endpoint requires a matching `x-cron-secret`.
  pub cron_secret: Option<String>,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
      depth:       DepthPolicy::default(),
      cron_secret: None,
    }
  }
}

/// Shared state threaded through all axum handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self { store, settings: Arc::new(settings) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), settings: self.settings.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CommentStore + 'static,
{
  Router::new()
    // Comments
    .route("/comments", get(comments::list::<S>).post(comments::create::<S>))
    // Reactions
    .route("/reactions", get(reactions::summary::<S>))
    .route("/reactions/toggle", post(reactions::toggle::<S>))
    // Bookmarks
    .route("/bookmarks", get(bookmarks::list::<S>))
    .route("/bookmarks/status", get(bookmarks::status::<S>))
    .route("/bookmarks/toggle", post(bookmarks::toggle::<S>))
    // Session
    .route("/session", get(session::whoami))
    .route("/session/logout", post(session::logout::<S>))
    // Articles
    .route("/articles/scheduled", get(articles::scheduled::<S>))
    .route("/articles/{id}/deletion", post(articles::schedule_deletion::<S>))
    .route(
      "/cron/cleanup-articles",
      get(articles::cleanup::<S>).post(articles::cleanup::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
