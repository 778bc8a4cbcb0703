//! Connection settings for [`crate::SqliteStore::connect`].

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Where the database lives and how hard to try when opening it.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  /// Path to the SQLite file; created on first open.
  pub path:               PathBuf,
  /// Total open attempts before giving up.
  #[serde(default = "default_connect_attempts")]
  pub connect_attempts:   u32,
  /// Delay before the second attempt; doubles after each failure.
  #[serde(default = "default_connect_backoff_ms")]
  pub connect_backoff_ms: u64,
}

fn default_connect_attempts() -> u32 { 5 }

fn default_connect_backoff_ms() -> u64 { 2_000 }

impl DatabaseConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path:               path.into(),
      connect_attempts:   default_connect_attempts(),
      connect_backoff_ms: default_connect_backoff_ms(),
    }
  }

  pub fn initial_backoff(&self) -> Duration {
    Duration::from_millis(self.connect_backoff_ms)
  }
}

impl Default for DatabaseConfig {
  fn default() -> Self { Self::new("snote.db") }
}
