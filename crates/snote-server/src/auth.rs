//! HTTP Basic auth for the admin routes.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use snote_core::{remote::RemoteStockSearch, store::NoteStore};

use crate::{AppState, error::Error};

/// Admin credentials from the `[admin]` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Present in a handler means the request may use admin routes: either
/// credentials matched or no admin account is configured.
pub struct Admin;

/// Username and password from a `Basic` `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let (user, pass) = std::str::from_utf8(&decoded).ok()?.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Check the request's Basic credentials against the configured admin.
///
/// A `password_hash` that is not a PHC string fails every request with
/// [`Error::AdminConfig`], whatever the client sent.
pub fn verify_auth(headers: &HeaderMap, admin: &AdminAuth) -> Result<(), Error> {
  let hash = PasswordHash::new(&admin.password_hash)
    .map_err(|e| Error::AdminConfig(e.to_string()))?;

  let (user, pass) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  if user != admin.username {
    return Err(Error::Unauthorized);
  }

  Argon2::default()
    .verify_password(pass.as_bytes(), &hash)
    .map_err(|_| Error::Unauthorized)
}

impl<S, R> FromRequestParts<AppState<S, R>> for Admin
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, R>,
  ) -> Result<Self, Self::Rejection> {
    if let Some(admin) = state.config.admin.as_ref() {
      verify_auth(&parts.headers, admin)?;
    }
    Ok(Admin)
  }
}
