//! SQL schema for the Scriv SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Only the SHA-256 digest of the cookie token is kept.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articles (
    article_id          TEXT PRIMARY KEY,
    author_id           TEXT NOT NULL REFERENCES users(user_id),
    title               TEXT NOT NULL,
    handle              TEXT NOT NULL UNIQUE,
    delete_scheduled_at TEXT,
    created_at          TEXT NOT NULL
);

-- Comments are append-only. The parent is polymorphic, so resource_id
-- carries no foreign key.
CREATE TABLE IF NOT EXISTS comments (
    comment_id    TEXT PRIMARY KEY,
    resource_id   TEXT NOT NULL,
    resource_type TEXT NOT NULL CHECK (resource_type IN ('ARTICLE', 'COMMENT')),
    body          TEXT NOT NULL,
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    client_key    TEXT,
    created_at    TEXT NOT NULL   -- fixed-width RFC 3339, sorts as text
);

CREATE UNIQUE INDEX IF NOT EXISTS comments_client_key_idx
    ON comments(user_id, client_key) WHERE client_key IS NOT NULL;
CREATE INDEX IF NOT EXISTS comments_parent_idx
    ON comments(resource_type, resource_id, created_at);

CREATE TABLE IF NOT EXISTS reactions (
    resource_id   TEXT NOT NULL,
    resource_type TEXT NOT NULL CHECK (resource_type IN ('ARTICLE', 'COMMENT')),
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    reaction_type TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (resource_id, resource_type, user_id, reaction_type)
);

CREATE TABLE IF NOT EXISTS bookmarks (
    bookmark_id   TEXT PRIMARY KEY,
    resource_id   TEXT NOT NULL,
    resource_type TEXT NOT NULL CHECK (resource_type IN ('ARTICLE', 'COMMENT')),
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    created_at    TEXT NOT NULL,
    UNIQUE (resource_id, resource_type, user_id)
);

CREATE INDEX IF NOT EXISTS bookmarks_user_idx ON bookmarks(user_id, created_at);

PRAGMA user_version = 1;
";
