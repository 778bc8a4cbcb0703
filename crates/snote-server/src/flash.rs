//! One-shot notices carried across a redirect in a signed cookie.
//!
//! The cookie value is `base64url(json) "." hex(hmac_sha256(key, json))`. A
//! value that fails verification is ignored, so a client can drop or replay
//! a notice but never forge one.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use snote_core::{remote::RemoteStockSearch, store::NoteStore};

use crate::AppState;

pub const COOKIE_NAME: &str = "snote_flash";

type HmacSha256 = Hmac<Sha256>;

// ─── Notice ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
  Success,
  Error,
}

impl FlashKind {
  pub fn as_str(self) -> &'static str {
    match self {
      FlashKind::Success => "success",
      FlashKind::Error => "error",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
  pub kind:    FlashKind,
  pub message: String,
}

impl Flash {
  pub fn success(message: impl Into<String>) -> Self {
    Self { kind: FlashKind::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { kind: FlashKind::Error, message: message.into() }
  }
}

// ─── Signing ─────────────────────────────────────────────────────────────────

/// HMAC-SHA-256 key for flash cookies.
pub struct FlashKey([u8; 32]);

impl FlashKey {
  /// Derive a key from the configured secret.
  pub fn from_secret(secret: &str) -> Self {
    Self(Sha256::digest(secret.as_bytes()).into())
  }

  /// A fresh key from the OS RNG.
  pub fn random() -> Self {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    Self(key)
  }

  /// A MAC primed with this key. HMAC takes keys of any length, so this
  /// only fails if the `hmac` crate changes that contract.
  fn mac(&self) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(&self.0).ok()
  }

  fn tag(&self, message: &[u8]) -> Option<Vec<u8>> {
    Some(self.mac()?.chain_update(message).finalize().into_bytes().to_vec())
  }

  /// `None` only when the key cannot be used, in which case no cookie is set.
  pub fn seal(&self, flash: &Flash) -> Option<String> {
    let json = serde_json::to_vec(flash).ok()?;
    let tag = self.tag(&json)?;
    Some(format!("{}.{}", B64.encode(&json), hex::encode(tag)))
  }

  pub fn open(&self, value: &str) -> Option<Flash> {
    let (payload, tag) = value.split_once('.')?;
    let json = B64.decode(payload).ok()?;
    let tag = hex::decode(tag).ok()?;
    self.mac()?.chain_update(&json).verify_slice(&tag).ok()?;
    serde_json::from_slice(&json).ok()
  }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// The `Set-Cookie` value carrying `flash` to the next request.
pub fn set_cookie(key: &FlashKey, flash: &Flash) -> Option<HeaderValue> {
  let sealed = key.seal(flash)?;
  HeaderValue::from_str(&format!(
    "{COOKIE_NAME}={sealed}; Path=/; HttpOnly; SameSite=Lax; Max-Age=300"
  ))
  .ok()
}

/// The `Set-Cookie` value that clears a consumed notice.
pub fn clear_cookie() -> HeaderValue {
  HeaderValue::from_static("snote_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v)
}

/// The verified notice on an incoming request, if any.
pub struct IncomingFlash(pub Option<Flash>);

impl<S, R> FromRequestParts<AppState<S, R>> for IncomingFlash
where
  S: NoteStore + 'static,
  R: RemoteStockSearch + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, R>,
  ) -> Result<Self, Self::Rejection> {
    let flash = cookie_value(&parts.headers, COOKIE_NAME)
      .filter(|v| !v.is_empty())
      .and_then(|v| state.flash_key.open(v));
    Ok(IncomingFlash(flash))
  }
}
