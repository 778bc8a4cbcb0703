//! Error type for `snote-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] snote_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("could not open database after {attempts} attempts: {last}")]
  ConnectExhausted {
    attempts: u32,
    #[source]
    last:     tokio_rusqlite::Error,
  },

  /// A migration file failed; nothing from that file was kept.
  #[error("migration {name} failed: {source}")]
  Migration {
    name:   String,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
