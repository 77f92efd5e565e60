//! Async HTTP client wrapping the scriv JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response, header};
use scriv_core::{
  bookmark::{Bookmark, BookmarkState},
  comment::{Author, Comment, CommentNode},
  reaction::{ReactionKind, ReactionStatus, ReactionToggle},
  resource::ParentRef,
  result::ActionResult,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the scriv API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:    String,
  pub cookie_name: String,
  /// Raw session token, as printed by `scriv-server issue-session`.
  pub session:     Option<String>,
}

/// Async HTTP client for the scriv JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct WhoAmI {
  user: Option<Author>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// The same connection without the session cookie.
  #[cfg(test)]
  pub fn signed_out(&self) -> Self {
    let config = ApiConfig { session: None, ..self.config.clone() };
    Self { client: self.client.clone(), config }
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.config.session {
      Some(token) => {
        req.header(header::COOKIE, format!("{}={token}", self.config.cookie_name))
      }
      None => req,
    }
  }

  fn resource_query(target: ParentRef) -> [(&'static str, String); 2] {
    [
      ("resource_id", target.id().to_string()),
      ("resource_type", target.kind().to_string()),
    ]
  }

  /// Unwrap the response envelope. Failures become errors carrying the
  /// server's code and message.
  async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    let envelope: ActionResult<T> = resp
      .json()
      .await
      .with_context(|| format!("{what} → {status}: unreadable response"))?;
    envelope
      .into_result()
      .map_err(|f| anyhow!("{what} → {:?}: {}", f.code, f.error))
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  /// `GET /api/comments?resource_id=..&resource_type=..`
  pub async fn comments(&self, target: ParentRef) -> Result<Vec<CommentNode>> {
    let resp = self
      .client
      .get(self.url("/comments"))
      .query(&Self::resource_query(target))
      .send()
      .await
      .context("GET /comments failed")?;
    Self::decode(resp, "GET /comments").await
  }

  /// `POST /api/comments`
  pub async fn create_comment(
    &self,
    target: ParentRef,
    body: &str,
    client_key: Uuid,
  ) -> Result<Comment> {
    let resp = self
      .auth(self.client.post(self.url("/comments")))
      .json(&json!({
        "resource_id": target.id(),
        "resource_type": target.kind(),
        "body": body,
        "client_key": client_key,
      }))
      .send()
      .await
      .context("POST /comments failed")?;
    Self::decode(resp, "POST /comments").await
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  /// `POST /api/reactions/toggle`
  pub async fn toggle_reaction(
    &self,
    target: ParentRef,
    kind: ReactionKind,
  ) -> Result<ReactionToggle> {
    let resp = self
      .auth(self.client.post(self.url("/reactions/toggle")))
      .json(&json!({
        "resource_id": target.id(),
        "resource_type": target.kind(),
        "reaction_type": kind,
      }))
      .send()
      .await
      .context("POST /reactions/toggle failed")?;
    Self::decode(resp, "POST /reactions/toggle").await
  }

  /// `GET /api/reactions?resource_id=..&resource_type=..`
  pub async fn reactions(&self, target: ParentRef) -> Result<Vec<ReactionStatus>> {
    let resp = self
      .auth(self.client.get(self.url("/reactions")))
      .query(&Self::resource_query(target))
      .send()
      .await
      .context("GET /reactions failed")?;
    Self::decode(resp, "GET /reactions").await
  }

  // ── Bookmarks ─────────────────────────────────────────────────────────────

  /// `POST /api/bookmarks/toggle`
  pub async fn toggle_bookmark(&self, target: ParentRef) -> Result<BookmarkState> {
    let resp = self
      .auth(self.client.post(self.url("/bookmarks/toggle")))
      .json(&json!({
        "resource_id": target.id(),
        "resource_type": target.kind(),
      }))
      .send()
      .await
      .context("POST /bookmarks/toggle failed")?;
    Self::decode(resp, "POST /bookmarks/toggle").await
  }

  /// `GET /api/bookmarks?limit=..&offset=..`
  pub async fn bookmarks(
    &self,
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> Result<Vec<Bookmark>> {
    let mut query = Vec::new();
    if let Some(l) = limit {
      query.push(("limit", l.to_string()));
    }
    if let Some(o) = offset {
      query.push(("offset", o.to_string()));
    }
    let resp = self
      .auth(self.client.get(self.url("/bookmarks")))
      .query(&query)
      .send()
      .await
      .context("GET /bookmarks failed")?;
    Self::decode(resp, "GET /bookmarks").await
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `GET /api/session`; `None` when the token is missing or expired.
  pub async fn whoami(&self) -> Result<Option<Author>> {
    let resp = self
      .auth(self.client.get(self.url("/session")))
      .send()
      .await
      .context("GET /session failed")?;
    let me: WhoAmI = Self::decode(resp, "GET /session").await?;
    Ok(me.user)
  }
}
