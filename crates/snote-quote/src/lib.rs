//! Remote stock lookup against a Yahoo-Finance-style search endpoint.
//!
//! [`QuoteClient`] implements [`snote_core::remote::RemoteStockSearch`]. It
//! fans a query out over several spellings and mirror URLs, keeps only quotes
//! that [`classify::is_domestic_stock`] accepts, and never returns an error to
//! the caller.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;

pub use client::QuoteClient;
pub use config::QuoteConfig;
pub use error::{Error, Result};
