//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Rendered as `{"success": false, "error": ..., "message"?: ...}`. Store
/// failures are logged and reported with a generic message only.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (
        StatusCode::NOT_FOUND,
        json!({ "success": false, "error": m }),
      ),
      ApiError::BadRequest(m) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "error": m }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({
            "success": false,
            "error":   "資料庫錯誤",
            "message": "系統錯誤，請稍後重試",
          }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
