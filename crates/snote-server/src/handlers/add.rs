//! `POST /add` — create a note from the form, then redirect home.

use axum::{
  Form,
  extract::{State, rejection::FormRejection},
  response::Response,
};
use snote_core::{note::Note, remote::RemoteStockSearch, store::NoteStore};
use tracing::info;

use crate::{
  AppState,
  error::Error,
  flash::Flash,
  handlers::{NoteInput, form_body, redirect_home},
};

pub async fn handler<S, R>(
  State(state): State<AppState<S, R>>,
  input: Result<Form<NoteInput>, FormRejection>,
) -> Response
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let result = match form_body(input) {
    Ok(input) => add(&state, input).await,
    Err(e) => Err(e),
  };
  match result {
    Ok(note) => {
      info!(note_id = note.id, stock_code = %note.stock_code, "note created via form");
      redirect_home(&state, Flash::success(format!("成功添加筆記: {}", note.stock_code)))
    }
    Err(e) => redirect_home(&state, e.to_flash()),
  }
}

async fn add<S, R>(state: &AppState<S, R>, input: NoteInput) -> Result<Note, Error>
where
  S: NoteStore,
{
  let new = input.into_new_note()?;
  state.store.add_note(new).await.map_err(Error::store)
}
