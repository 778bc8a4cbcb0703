//! `POST /delete/{id}`

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
  http::HeaderMap,
  response::{IntoResponse, Response},
};
use serde_json::json;
use snote_core::{remote::RemoteStockSearch, store::NoteStore};

use crate::{
  AppState,
  error::Error,
  flash::Flash,
  handlers::{note_id, redirect_home, wants_json},
};

pub async fn handler<S, R>(
  State(state): State<AppState<S, R>>,
  id: Result<Path<i64>, PathRejection>,
  headers: HeaderMap,
) -> Response
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let result = match note_id(id) {
    Ok(id) => match state.store.delete_note(id).await {
      Ok(true) => Ok(()),
      Ok(false) => Err(Error::NotFound("筆記不存在".to_owned())),
      Err(e) => Err(Error::store(e)),
    },
    Err(e) => Err(e),
  };

  match (result, wants_json(&headers)) {
    (Ok(()), true) => Json(json!({ "success": true })).into_response(),
    (Ok(()), false) => redirect_home(&state, Flash::success("筆記已刪除")),
    (Err(e), true) => e.into_api(),
    (Err(e), false) => redirect_home(&state, e.to_flash()),
  }
}
