//! `scriv`: command-line client for a scriv comment server.
//!
//! # Usage
//!
//! ```text
//! scriv --url http://localhost:4000 thread article <article-id>
//! scriv --session <token> reply --article <article-id> --parent <comment-id> "agreed"
//! scriv --config ~/.config/scriv/config.toml bookmarks
//! ```

mod app;
mod cache;
mod client;
mod render;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use scriv_core::{
  reaction::ReactionKind,
  resource::{ParentRef, ResourceType},
  thread::DepthPolicy,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:4000";
const DEFAULT_COOKIE_NAME: &str = "scriv_session";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scriv", about = "Command-line client for scriv comment threads")]
struct Args {
  /// Path to a TOML config file (url, session, cookie_name, max_depth).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the scriv server (default: http://localhost:4000).
  #[arg(long, env = "SCRIV_URL")]
  url: Option<String>,

  /// Session token, as printed by `scriv-server issue-session`.
  #[arg(long, env = "SCRIV_SESSION")]
  session: Option<String>,

  /// Visible thread depth; should match the server's `max_depth`.
  #[arg(long)]
  max_depth: Option<u32>,

  #[command(subcommand)]
  command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
  Article,
  Comment,
}

impl From<Kind> for ResourceType {
  fn from(kind: Kind) -> Self {
    match kind {
      Kind::Article => ResourceType::Article,
      Kind::Comment => ResourceType::Comment,
    }
  }
}

#[derive(clap::Args, Debug)]
struct Target {
  #[arg(value_enum)]
  kind: Kind,
  id:   Uuid,
}

impl Target {
  fn parent_ref(&self) -> ParentRef { ParentRef::new(self.kind.into(), self.id) }
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the comment thread under a resource.
  Thread {
    #[command(flatten)]
    target: Target,
  },
  /// Post a top-level comment on a resource.
  Comment {
    #[command(flatten)]
    target: Target,
    body:   String,
  },
  /// Reply to a comment in an article's thread.
  Reply {
    #[arg(long)]
    article: Uuid,
    #[arg(long)]
    parent:  Uuid,
    body:    String,
  },
  /// Toggle a reaction on a resource.
  React {
    #[command(flatten)]
    target:   Target,
    #[arg(value_parser = parse_reaction)]
    reaction: ReactionKind,
  },
  /// Show reaction counts for a resource.
  Reactions {
    #[command(flatten)]
    target: Target,
  },
  /// Toggle a bookmark on a resource.
  Bookmark {
    #[command(flatten)]
    target: Target,
  },
  /// List your bookmarks, newest first.
  Bookmarks {
    #[arg(long)]
    limit:  Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
  },
  /// Show the user the session belongs to.
  Whoami,
}

fn parse_reaction(s: &str) -> Result<ReactionKind, String> {
  ReactionKind::parse(&s.to_ascii_uppercase()).ok_or_else(|| {
    let known: Vec<_> = ReactionKind::ALL.iter().map(|k| k.as_str()).collect();
    format!("unknown reaction {s:?}; expected one of {}", known.join(", "))
  })
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:         String,
  #[serde(default)]
  session:     String,
  #[serde(default)]
  cookie_name: String,
  max_depth:   Option<u32>,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url:    args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    cookie_name: non_empty(&file_cfg.cookie_name)
      .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
    session:     args.session.or_else(|| non_empty(&file_cfg.session)),
  };
  let max_depth = args
    .max_depth
    .or(file_cfg.max_depth)
    .unwrap_or(DepthPolicy::DEFAULT_MAX_DEPTH);

  let mut app = App::new(ApiClient::new(api_config)?, max_depth);
  run(&mut app, args.command).await
}

async fn run(app: &mut App, command: Command) -> Result<()> {
  match command {
    Command::Thread { target } => {
      let root = target.parent_ref();
      app.thread(root).await?;
      let forest = app.cache.get(&root).unwrap_or_default();
      if forest.is_empty() {
        println!("no comments on {root}");
      } else {
        print!("{}", render::forest(forest, &app.cache));
      }
    }
    Command::Comment { target, body } => {
      let root = target.parent_ref();
      let comment = app.submit(root, root, &body).await?;
      println!("posted {}", comment.id);
    }
    Command::Reply { article, parent, body } => {
      let root = ParentRef::Article(article);
      let comment = app.submit(root, ParentRef::Comment(parent), &body).await?;
      println!("posted {}", comment.id);
      if let Some(forest) = app.cache.get(&root) {
        print!("{}", render::forest(forest, &app.cache));
      }
    }
    Command::React { target, reaction } => {
      let toggle = app.client.toggle_reaction(target.parent_ref(), reaction).await?;
      let verb = if toggle.reacted { "added" } else { "removed" };
      println!("{verb} {}", toggle.reaction_type.as_str());
    }
    Command::Reactions { target } => {
      for status in app.client.reactions(target.parent_ref()).await? {
        let mark = if status.is_reacted { "*" } else { " " };
        println!("{mark} {:<8} {}", status.reaction_type.as_str(), status.count);
      }
    }
    Command::Bookmark { target } => {
      let state = app.client.toggle_bookmark(target.parent_ref()).await?;
      println!("{}", if state.bookmarked { "bookmarked" } else { "unbookmarked" });
    }
    Command::Bookmarks { limit, offset } => {
      for bookmark in app.client.bookmarks(limit, offset).await? {
        println!(
          "{}  {}",
          bookmark.created_at.format("%Y-%m-%d %H:%M"),
          bookmark.resource
        );
      }
    }
    Command::Whoami => match app.client.whoami().await? {
      Some(me) => println!("{} (@{}) <{}>", me.name, me.username, me.email),
      None => println!("not signed in"),
    },
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reaction_names_are_case_insensitive() {
    assert_eq!(parse_reaction("fire"), Ok(ReactionKind::Fire));
    assert_eq!(parse_reaction("HAHA"), Ok(ReactionKind::Haha));
    assert!(parse_reaction("meh").unwrap_err().contains("LOVE"));
  }

  #[test]
  fn args_parse_target_and_reply() {
    let id = Uuid::new_v4();
    let args = Args::try_parse_from(["scriv", "thread", "article", &id.to_string()]).unwrap();
    let Command::Thread { target } = args.command else { panic!("wrong command") };
    assert_eq!(target.parent_ref(), ParentRef::Article(id));

    let parent = Uuid::new_v4();
    let args = Args::try_parse_from([
      "scriv",
      "reply",
      "--article",
      &id.to_string(),
      "--parent",
      &parent.to_string(),
      "hi",
    ])
    .unwrap();
    assert!(matches!(args.command, Command::Reply { body, .. } if body == "hi"));
  }

  #[test]
  fn config_file_fields_are_optional() {
    let cfg: ConfigFile = toml::from_str("url = \"http://x\"").unwrap();
    assert_eq!(cfg.url, "http://x");
    assert!(cfg.session.is_empty());
    assert!(cfg.max_depth.is_none());
  }
}
