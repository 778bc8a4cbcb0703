//! `GET /edit/{id}` renders the edit form; `POST /edit/{id}` applies it.
//!
//! The POST accepts a form or a JSON body. JSON callers (by `Content-Type` or
//! `Accept`) get `{"success": true, "note": ...}` or the API error envelope;
//! form callers are redirected with a notice. Invalid form input goes back to
//! the edit page, everything else to `/`.

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
  http::HeaderMap,
  response::{IntoResponse, Response},
};
use serde_json::json;
use snote_core::{note::Note, remote::RemoteStockSearch, store::NoteStore};
use tracing::info;

use crate::{
  AppState,
  error::Error,
  flash::{Flash, IncomingFlash},
  handlers::{
    FormOrJson, NoteInput, html_page, note_id, redirect_home, redirect_to, wants_json,
  },
  page,
};

fn missing() -> Error { Error::NotFound("筆記不存在".to_owned()) }

/// `GET /edit/{id}`
pub async fn form<S, R>(
  State(state): State<AppState<S, R>>,
  IncomingFlash(flash): IncomingFlash,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Response, Error>
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let id = match note_id(id) {
    Ok(id) => id,
    Err(e) => return Ok(redirect_home(&state, e.to_flash())),
  };
  let note = match state.store.get_note(id).await {
    Ok(Some(note)) => note,
    Ok(None) => return Ok(redirect_home(&state, missing().to_flash())),
    Err(e) => return Ok(redirect_home(&state, Error::store(e).to_flash())),
  };

  let body = page::edit(&note, flash.as_ref())?;
  Ok(html_page(body, flash.is_some()))
}

/// `POST /edit/{id}`
pub async fn submit<S, R>(
  State(state): State<AppState<S, R>>,
  id: Result<Path<i64>, PathRejection>,
  headers: HeaderMap,
  body: Result<FormOrJson<NoteInput>, Error>,
) -> Response
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let id = match note_id(id) {
    Ok(id) => id,
    Err(e) if wants_json(&headers) => return e.into_api(),
    Err(e) => return redirect_home(&state, e.to_flash()),
  };
  let result = match body {
    Ok(FormOrJson(input)) => update(&state, id, input).await,
    Err(e) => Err(e),
  };

  match (result, wants_json(&headers)) {
    (Ok(note), true) => Json(json!({ "success": true, "note": note })).into_response(),
    (Ok(note), false) => {
      redirect_home(&state, Flash::success(format!("筆記已更新: {}", note.stock_code)))
    }
    (Err(e), true) => e.into_api(),
    (Err(e @ Error::Invalid(_)), false) => {
      redirect_to(&state, &format!("/edit/{id}"), e.to_flash())
    }
    (Err(e), false) => redirect_home(&state, e.to_flash()),
  }
}

async fn update<S, R>(state: &AppState<S, R>, id: i64, input: NoteInput) -> Result<Note, Error>
where
  S: NoteStore,
{
  let edit = input.into_edit()?;

  if !state.store.update_note(id, edit).await.map_err(Error::store)? {
    return Err(missing());
  }
  info!(note_id = id, "note updated");

  state
    .store
    .get_note(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(missing)
}
