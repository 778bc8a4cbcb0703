//! [`QuoteClient`] — the HTTP side of the remote stock lookup.

use reqwest::{
  Client, StatusCode,
  header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER},
};
use serde::Deserialize;
use snote_core::{remote::RemoteStockSearch, stock::StockSuggestion};
use tracing::{debug, warn};

use crate::{Error, QuoteConfig, Result, classify::Quote};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/124.0 Safari/537.36";

/// Suffixes appended to the user's query; some hits only surface with a
/// market hint.
const VARIANT_SUFFIXES: &[&str] = &["", " TW", " 台股", " 台灣"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  quotes: Vec<Quote>,
}

/// Async client for the quote-search endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct QuoteClient {
  client: Client,
  config: QuoteConfig,
}

impl QuoteClient {
  pub fn new(config: QuoteConfig) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(
      ACCEPT,
      HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
      ACCEPT_LANGUAGE,
      HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(REFERER, HeaderValue::from_static("https://tw.stock.yahoo.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://tw.stock.yahoo.com"));

    let client = Client::builder()
      .user_agent(USER_AGENT)
      .default_headers(headers)
      .timeout(config.timeout())
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &QuoteConfig { &self.config }

  /// One GET against one mirror.
  async fn fetch(&self, endpoint: &str, term: &str, limit: usize) -> Result<Vec<Quote>> {
    let quotes_count = limit.saturating_mul(2).max(20).to_string();
    let resp = self
      .client
      .get(endpoint)
      .query(&[
        ("q", term),
        ("quotesCount", quotes_count.as_str()),
        ("newsCount", "0"),
        ("lang", "zh-TW"),
        ("region", "TW"),
      ])
      .send()
      .await?;

    if resp.status() != StatusCode::OK {
      return Err(Error::Status(resp.status()));
    }
    let body: SearchResponse = resp.json().await?;
    Ok(body.quotes)
  }

  /// Every variant against one mirror, appending unseen codes to `found`.
  async fn search_mirror(
    &self,
    endpoint: &str,
    query: &str,
    limit: usize,
    found: &mut Vec<StockSuggestion>,
  ) {
    for suffix in VARIANT_SUFFIXES {
      let term = format!("{query}{suffix}");
      let quotes = match self.fetch(endpoint, &term, limit).await {
        Ok(quotes) => quotes,
        Err(e) => {
          warn!(endpoint, term = %term, error = %e, "quote search failed");
          continue;
        }
      };

      for suggestion in quotes.into_iter().filter_map(Quote::into_suggestion) {
        if !found.iter().any(|s| s.code == suggestion.code) {
          found.push(suggestion);
        }
      }
    }
  }
}

impl RemoteStockSearch for QuoteClient {
  async fn search(&self, query: &str, limit: usize) -> Vec<StockSuggestion> {
    let query = query.trim();
    if !self.config.enabled || query.is_empty() || limit == 0 {
      return Vec::new();
    }

    let mut found = Vec::new();
    for endpoint in &self.config.endpoints {
      self.search_mirror(endpoint, query, limit, &mut found).await;
      if !found.is_empty() {
        break;
      }
    }

    debug!(query, hits = found.len(), "quote search finished");
    found.truncate(limit);
    found
  }
}
