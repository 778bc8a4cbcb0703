//! `POST /admin/import-stocks` — bulk-load a CSV file from the server's disk.

use axum::{
  Form,
  extract::{State, rejection::FormRejection},
  response::Response,
};
use serde::Deserialize;
use snote_core::{remote::RemoteStockSearch, stock::ImportSummary, store::NoteStore};
use snote_store_sqlite::import::read_csv;

use crate::{
  AppState,
  auth::Admin,
  error::Error,
  flash::Flash,
  handlers::{form_body, redirect_home},
};

#[derive(Debug, Deserialize)]
pub struct ImportForm {
  #[serde(default)]
  pub csv_path: String,
}

pub async fn handler<S, R>(
  _admin: Admin,
  State(state): State<AppState<S, R>>,
  form: Result<Form<ImportForm>, FormRejection>,
) -> Response
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let result = match form_body(form) {
    Ok(form) => import(&state, form.csv_path.trim()).await,
    Err(e) => Err(e),
  };
  match result {
    Ok(summary) => redirect_home(
      &state,
      Flash::success(format!(
        "匯入完成：新增或更新 {} 筆，更新 {} 筆，略過 {} 筆",
        summary.upserted, summary.updated, summary.skipped
      )),
    ),
    Err(e) => redirect_home(&state, e.to_flash()),
  }
}

async fn import<S, R>(state: &AppState<S, R>, path: &str) -> Result<ImportSummary, Error>
where
  S: NoteStore,
{
  if path.is_empty() {
    return Err(Error::Invalid("請輸入 CSV 路徑".to_owned()));
  }
  let rows = read_csv(path).await.map_err(Error::Import)?;
  state.store.import_stocks(rows).await.map_err(Error::store)
}
