//! `GET /` — the note list.
//!
//! A store failure still renders the page, with an empty list and an inline
//! notice.

use axum::{
  extract::{Query, State},
  response::Response,
};
use snote_api::notes::ListParams;
use snote_core::{remote::RemoteStockSearch, store::NoteStore};
use tracing::error;

use crate::{
  AppState,
  error::Error,
  flash::IncomingFlash,
  handlers::html_page,
  page,
};

pub async fn handler<S, R>(
  State(state): State<AppState<S, R>>,
  IncomingFlash(flash): IncomingFlash,
  Query(params): Query<ListParams>,
) -> Result<Response, Error>
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let query = params.to_query();

  let (notes, notice) = match state.store.list_notes(&query).await {
    Ok(notes) => (notes, None),
    Err(e) => {
      error!(error = %e, "failed to load notes");
      (Vec::new(), Some("加載數據時發生錯誤"))
    }
  };

  let body = page::index(&notes, &query, flash.as_ref(), notice)?;
  Ok(html_page(body, flash.is_some()))
}
