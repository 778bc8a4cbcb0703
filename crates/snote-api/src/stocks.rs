//! Stock lookup endpoints used by the add-note form.
//!
//! `/search-stocks` backs the code autocomplete. It asks the local table
//! first and only falls back to the remote search when nothing matched
//! locally. Any failure yields an empty list, never an error status.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use snote_core::{
  remote::RemoteStockSearch,
  stock::{StockSuggestion, merge_suggestions},
  store::NoteStore,
};
use tracing::{debug, error, warn};

use crate::ApiState;

/// Maximum suggestions returned by `/search-stocks`.
pub const SUGGESTION_LIMIT: usize = 10;

// ─── Autocomplete ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionBody {
  pub code:    String,
  pub name:    String,
  pub display: String,
}

impl From<StockSuggestion> for SuggestionBody {
  fn from(s: StockSuggestion) -> Self {
    Self { display: s.display(), code: s.code, name: s.name }
  }
}

/// `GET /search-stocks?q=<query>`
pub async fn search<S, R>(
  State(state): State<ApiState<S, R>>,
  params: Result<Query<SearchParams>, QueryRejection>,
) -> Json<Vec<SuggestionBody>>
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  let Ok(Query(params)) = params else {
    return Json(Vec::new());
  };
  let q = params.q.trim();
  if q.is_empty() {
    return Json(Vec::new());
  }

  let local: Vec<StockSuggestion> =
    match state.store.search_stocks(q, SUGGESTION_LIMIT).await {
      Ok(stocks) => stocks.into_iter().map(Into::into).collect(),
      Err(e) => {
        warn!(query = q, error = %e, "local stock search failed");
        return Json(Vec::new());
      }
    };

  let remote = if local.is_empty() {
    debug!(query = q, "no local match; asking remote search");
    state.remote.search(q, SUGGESTION_LIMIT).await
  } else {
    Vec::new()
  };

  let merged = merge_suggestions(local, remote, SUGGESTION_LIMIT);
  Json(merged.into_iter().map(SuggestionBody::from).collect())
}

// ─── Exact lookup ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InfoParams {
  #[serde(default)]
  pub code: String,
}

fn info_error(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}

/// `GET /get-stock-info?code=<code>`
pub async fn info<S, R>(
  State(state): State<ApiState<S, R>>,
  params: Result<Query<InfoParams>, QueryRejection>,
) -> Response
where
  S: NoteStore,
  R: RemoteStockSearch,
{
  let Ok(Query(params)) = params else {
    return info_error(StatusCode::BAD_REQUEST, "請提供股票代碼");
  };
  let code = params.code.trim();
  if code.is_empty() {
    return info_error(StatusCode::BAD_REQUEST, "請提供股票代碼");
  }

  match state.store.get_stock(code).await {
    Ok(Some(stock)) => Json(json!({
      "code":     stock.stock_code,
      "name":     stock.stock_name,
      "industry": stock.industry,
    }))
    .into_response(),
    Ok(None) => info_error(StatusCode::NOT_FOUND, "找不到此股票"),
    Err(e) => {
      error!(code, error = %e, "stock lookup failed");
      info_error(StatusCode::INTERNAL_SERVER_ERROR, "查詢股票資訊失敗")
    }
  }
}
