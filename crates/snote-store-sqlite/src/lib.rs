//! SQLite backend for snote.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Also owns the schema migrations and the
//! CSV stock import.

mod encode;
mod lazy;
mod store;

pub mod config;
pub mod error;
pub mod import;
pub mod migrate;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use lazy::LazyStore;
pub use store::SqliteStore;
