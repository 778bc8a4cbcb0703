//! Error types for the page and form handlers.
//!
//! Form flows turn an [`Error`] into an error [`Flash`] on a redirect; JSON
//! callers get the `snote-api` envelope; page renders fall back to plain
//! status responses.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use snote_api::ApiError;
use thiserror::Error;
use tracing::error;

use crate::flash::Flash;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  /// `admin.password_hash` cannot be parsed; an operator error.
  #[error("admin password_hash is invalid: {0}")]
  AdminConfig(String),
  #[error("not found: {0}")]
  NotFound(String),
  /// User input rejected before any write; the message is shown verbatim.
  #[error("invalid input: {0}")]
  Invalid(String),
  #[error("csv error: {0}")]
  Import(#[source] snote_store_sqlite::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("render error: {0}")]
  Render(#[from] std::io::Error),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  fn log(&self) {
    match self {
      Error::Store(_) | Error::Render(_) | Error::Import(_) | Error::AdminConfig(_) => {
        error!(error = %self, "request failed")
      }
      _ => {}
    }
  }

  /// The notice shown after a failed form submission.
  pub fn to_flash(&self) -> Flash {
    self.log();
    match self {
      Error::Unauthorized => Flash::error("需要管理員權限"),
      Error::NotFound(m) | Error::Invalid(m) => Flash::error(m.clone()),
      Error::Import(_) => Flash::error("讀取 CSV 檔案失敗"),
      Error::Store(_) | Error::Render(_) | Error::AdminConfig(_) => {
        Flash::error("系統錯誤，請稍後重試")
      }
    }
  }

  /// The JSON envelope for callers that asked for JSON.
  pub fn into_api(self) -> Response {
    match self {
      Error::Unauthorized => self.into_response(),
      Error::NotFound(m) => ApiError::NotFound(m).into_response(),
      Error::Invalid(m) => ApiError::BadRequest(m).into_response(),
      Error::Import(e) => ApiError::store(e).into_response(),
      Error::Store(e) => ApiError::Store(e).into_response(),
      Error::Render(e) => ApiError::store(e).into_response(),
      Error::AdminConfig(m) => ApiError::Store(m.into()).into_response(),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    self.log();
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"snote admin\""),
        );
        res
      }
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m).into_response(),
      Error::Invalid(m) => (StatusCode::BAD_REQUEST, m).into_response(),
      Error::Import(_) | Error::Store(_) | Error::Render(_) | Error::AdminConfig(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "系統錯誤，請稍後重試").into_response()
      }
    }
  }
}
