//! Web front end for snote.
//!
//! Serves the HTML pages and form flows on top of the JSON routes from
//! `snote-api`, backed by any [`NoteStore`] and [`RemoteStockSearch`].

pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod page;

pub use config::ServerConfig;
pub use error::Error;

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  routing::{get, post},
};
use rand_core::OsRng;
use snote_api::ApiState;
use snote_core::{remote::RemoteStockSearch, store::NoteStore};
use tower_http::trace::TraceLayer;

use flash::FlashKey;
use handlers::{add, delete, edit, import, index};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, R> {
  pub store:     Arc<S>,
  pub remote:    Arc<R>,
  pub config:    Arc<ServerConfig>,
  pub flash_key: Arc<FlashKey>,
}

impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      remote:    self.remote.clone(),
      config:    self.config.clone(),
      flash_key: self.flash_key.clone(),
    }
  }
}

impl<S, R> AppState<S, R> {
  /// Build state from a loaded config. The flash key comes from
  /// `secret_key`, or is random when that is unset.
  pub fn new(store: S, remote: R, config: ServerConfig) -> Self {
    let flash_key = match config.secret_key.as_deref() {
      Some(secret) if !secret.is_empty() => FlashKey::from_secret(secret),
      _ => {
        tracing::warn!("secret_key not set; using a random key for this process");
        FlashKey::random()
      }
    };
    Self {
      store:     Arc::new(store),
      remote:    Arc::new(remote),
      config:    Arc::new(config),
      flash_key: Arc::new(flash_key),
    }
  }

  pub fn api_state(&self) -> ApiState<S, R> {
    ApiState {
      store:       self.store.clone(),
      remote:      self.remote.clone(),
      environment: Arc::from(self.config.environment.as_str()),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: pages, form actions and the JSON API.
pub fn router<S, R>(state: AppState<S, R>) -> Router
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  let api = snote_api::api_router(state.api_state());

  Router::new()
    .route("/", get(index::handler::<S, R>))
    .route("/add", post(add::handler::<S, R>))
    .route("/edit/{id}", get(edit::form::<S, R>).post(edit::submit::<S, R>))
    .route("/delete/{id}", post(delete::handler::<S, R>))
    .route("/admin/import-stocks", post(import::handler::<S, R>))
    .with_state(state)
    .merge(api)
    .layer(TraceLayer::new_for_http())
}

/// Hash a password into an argon2 PHC string for `admin.password_hash`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

#[cfg(test)]
mod tests;
