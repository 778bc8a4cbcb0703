//! Runtime configuration.
//!
//! Sources, later ones winning: built-in defaults, the optional TOML file
//! given with `--config`, then `SNOTE_*` environment variables. Nested keys
//! use `__`, e.g. `SNOTE_DATABASE__PATH`; `SNOTE_QUOTE__ENDPOINTS` takes a
//! comma-separated list.

use std::path::Path;

use serde::Deserialize;
use snote_quote::QuoteConfig;
use snote_store_sqlite::DatabaseConfig;
use tracing::level_filters::LevelFilter;

use crate::auth::AdminAuth;

/// Deployment flavour; only affects log verbosity and `/health` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  #[serde(alias = "dev")]
  Development,
  #[serde(alias = "prod")]
  Production,
}

impl Environment {
  pub fn as_str(self) -> &'static str {
    match self {
      Environment::Development => "development",
      Environment::Production => "production",
    }
  }

  /// Log level used when `RUST_LOG` is unset.
  pub fn default_log_level(self) -> LevelFilter {
    match self {
      Environment::Development => LevelFilter::DEBUG,
      Environment::Production => LevelFilter::INFO,
    }
  }
}

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  #[serde(default)]
  pub environment: Environment,
  /// Key for signing flash cookies. A random per-process key is used when
  /// unset, so notices do not survive a restart.
  #[serde(default)]
  pub secret_key:  Option<String>,
  #[serde(default)]
  pub database:    DatabaseConfig,
  #[serde(default)]
  pub quote:       QuoteConfig,
  /// Credentials guarding `/admin/*`; open when absent.
  #[serde(default)]
  pub admin:       Option<AdminAuth>,
}

impl ServerConfig {
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 5000)?
      .set_default("environment", "development")?
      .set_default("database.path", "snote.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SNOTE")
          .prefix_separator("_")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("quote.endpoints")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:        "127.0.0.1".to_owned(),
      port:        5000,
      environment: Environment::default(),
      secret_key:  None,
      database:    DatabaseConfig::default(),
      quote:       QuoteConfig::default(),
      admin:       None,
    }
  }
}
