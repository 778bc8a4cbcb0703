//! Error types for `snote-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid note type: {0:?} (expected TAG or STORY)")]
  InvalidNoteType(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
