//! Health checks.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use snote_core::{remote::RemoteStockSearch, store::NoteStore};
use tracing::warn;

use crate::ApiState;

/// `GET /health` — 200 when the database answers, 503 otherwise.
pub async fn health<S, R>(State(state): State<ApiState<S, R>>) -> (StatusCode, Json<Value>)
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  let (status, health, database) = match state.store.ping().await {
    Ok(()) => (StatusCode::OK, "healthy", "connected"),
    Err(e) => {
      warn!(error = %e, "health check failed");
      (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
    }
  };

  (
    status,
    Json(json!({
      "status":      health,
      "database":    database,
      "environment": &*state.environment,
    })),
  )
}

/// `GET /test-db`
pub async fn test_db<S, R>(State(state): State<ApiState<S, R>>) -> (StatusCode, Json<Value>)
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  match state.store.ping().await {
    Ok(()) => (
      StatusCode::OK,
      Json(json!({ "status": "success", "message": "資料庫連線正常" })),
    ),
    Err(e) => {
      warn!(error = %e, "database test failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "message": "資料庫連線失敗" })),
      )
    }
  }
}
