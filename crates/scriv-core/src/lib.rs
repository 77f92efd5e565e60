//! Core types and trait definitions for Scriv comment threads.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod bookmark;
pub mod comment;
pub mod error;
pub mod reaction;
pub mod resource;
pub mod result;
pub mod store;
pub mod thread;

pub use error::{Error, Result};
