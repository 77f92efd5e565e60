//! scriv-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # Sessions without a login flow
//!
//! The login handshake lives outside this server. To mint a session cookie for
//! local use (creating the user if needed):
//!
//! ```
//! cargo run -p scriv-server -- issue-session --username ada
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scriv_api::session::issue_session;
use scriv_core::{
  account::{NewArticle, NewUser},
  store::CommentStore,
};
use scriv_server::ServerConfig;
use scriv_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Scriv comment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Create a session for a user and print the cookie token.
  IssueSession {
    #[arg(long)]
    username: String,
    /// Display name, used only when the user is created.
    #[arg(long)]
    name:     Option<String>,
    #[arg(long)]
    email:    Option<String>,
  },
  /// Create an article owned by an existing user and print its id.
  AddArticle {
    #[arg(long)]
    author: String,
    #[arg(long)]
    title:  String,
    #[arg(long)]
    handle: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SCRIV").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(dir) = store_path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {dir:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::IssueSession { username, name, email } => {
      let user = match store.find_user_by_username(&username).await? {
        Some(user) => user,
        None => {
          store
            .add_user(NewUser {
              name:     name.unwrap_or_else(|| username.clone()),
              email:    email.unwrap_or_else(|| format!("{username}@localhost")),
              username: username.clone(),
            })
            .await?
        }
      };
      let token = issue_session(&store, user.id, server_cfg.session_ttl()).await?;
      println!("{}={token}", server_cfg.cookie_name);
      Ok(())
    }
    Command::AddArticle { author, title, handle } => {
      let user = store
        .find_user_by_username(&author)
        .await?
        .with_context(|| format!("no user named {author:?}"))?;
      let article = store
        .add_article(NewArticle { author_id: user.id, title, handle })
        .await?;
      println!("{}", article.id);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = scriv_server::app(Arc::new(store), server_cfg);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    max_depth = server_cfg.max_depth,
    enforce_depth_on_write = server_cfg.enforce_depth_on_write,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
