//! Core types and trait definitions for snote, a stock note tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store, quote-search and HTTP crates all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod note;
pub mod query;
pub mod remote;
pub mod stock;
pub mod store;
pub mod timestamp;

pub use error::{Error, Result};
