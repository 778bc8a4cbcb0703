use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_ENDPOINTS: &[&str] = &[
  "https://query2.finance.yahoo.com/v1/finance/search",
  "https://query1.finance.yahoo.com/v1/finance/search",
];

/// Settings for [`crate::QuoteClient`].
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
  /// When `false`, searches return nothing without touching the network.
  #[serde(default = "default_enabled")]
  pub enabled:    bool,
  /// Mirror URLs, tried in order.
  #[serde(default = "default_endpoints")]
  pub endpoints:  Vec<String>,
  /// Per-request timeout.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

fn default_enabled() -> bool { true }

fn default_endpoints() -> Vec<String> {
  DEFAULT_ENDPOINTS.iter().map(|s| (*s).to_owned()).collect()
}

fn default_timeout_ms() -> u64 { 6_000 }

impl QuoteConfig {
  pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

impl Default for QuoteConfig {
  fn default() -> Self {
    Self {
      enabled:    default_enabled(),
      endpoints:  default_endpoints(),
      timeout_ms: default_timeout_ms(),
    }
  }
}
