//! JSON HTTP surface for snote.
//!
//! Exposes an axum [`Router`] backed by any [`NoteStore`] and
//! [`RemoteStockSearch`]. The HTML pages, flash notices and admin routes live
//! in `snote-server`, which merges this router into its own.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new().merge(snote_api::api_router(state))
//! ```

pub mod error;
pub mod health;
pub mod notes;
pub mod stocks;

use std::sync::Arc;

use axum::{Router, routing::get};
use snote_core::{remote::RemoteStockSearch, store::NoteStore};

pub use error::ApiError;

/// Shared state for the API handlers.
pub struct ApiState<S, R> {
  pub store:       Arc<S>,
  pub remote:      Arc<R>,
  /// Reported by `/health`, e.g. `development`.
  pub environment: Arc<str>,
}

// Manual impl: a derive would demand `S: Clone` and `R: Clone`.
impl<S, R> Clone for ApiState<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      remote:      self.remote.clone(),
      environment: self.environment.clone(),
    }
  }
}

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(state: ApiState<S, R>) -> Router<()>
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  Router::new()
    // Notes
    .route("/api/notes", get(notes::list::<S, R>))
    .route("/api/notes/{id}", get(notes::get_one::<S, R>))
    // Stocks
    .route("/search-stocks", get(stocks::search::<S, R>))
    .route("/get-stock-info", get(stocks::info::<S, R>))
    // Liveness
    .route("/health", get(health::health::<S, R>))
    .route("/test-db", get(health::test_db::<S, R>))
    .with_state(state)
}
