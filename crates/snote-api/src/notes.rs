//! Handlers for `/api/notes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/notes` | Optional `?search=&sort_by=&sort_order=` |
//! | `GET`  | `/api/notes/{id}` | 404 if not found or not a number |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
};
use serde::Deserialize;
use serde_json::{Value, json};
use snote_core::{query::NoteQuery, remote::RemoteStockSearch, store::NoteStore};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Raw listing parameters; unknown sort values fall back rather than reject.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub search:     Option<String>,
  pub sort_by:    Option<String>,
  pub sort_order: Option<String>,
}

impl ListParams {
  pub fn to_query(&self) -> NoteQuery {
    NoteQuery::from_params(
      self.search.as_deref(),
      self.sort_by.as_deref(),
      self.sort_order.as_deref(),
    )
  }
}

/// `GET /api/notes`
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let query = params.to_query();
  let notes = state
    .store
    .list_notes(&query)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(json!({
    "success":     true,
    "total":       notes.len(),
    "notes":       notes,
    "search_term": query.search_term().unwrap_or_default(),
    "sort_by":     query.sort_by,
    "sort_order":  query.sort_order,
  })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

fn missing() -> ApiError { ApiError::NotFound("筆記不存在".to_owned()) }

/// `GET /api/notes/{id}`
///
/// An id that is not an integer cannot name a note, so it is a 404 too.
pub async fn get_one<S, R>(
  State(state): State<ApiState<S, R>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  let Path(id) = id.map_err(|_| missing())?;
  let note = state
    .store
    .get_note(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(missing)?;
  Ok(Json(json!({ "success": true, "note": note })))
}
