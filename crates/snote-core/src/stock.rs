//! Stocks — the ticker identities notes are attached to.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A ticker identity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
  pub stock_code:   String,
  pub stock_name:   String,
  pub industry:     Option<String>,
  #[serde(with = "crate::timestamp")]
  pub last_updated: NaiveDateTime,
}

/// The name stored for a stock whose real name is not known yet.
pub fn placeholder_name(code: &str) -> String { format!("股票{code}") }

/// One row of a bulk stock import. Empty code or name marks the row as
/// skippable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StockRecord {
  #[serde(alias = "code", default)]
  pub stock_code: String,
  #[serde(alias = "name", default)]
  pub stock_name: String,
  #[serde(default)]
  pub industry:   Option<String>,
}

impl StockRecord {
  pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      stock_code: code.into(),
      stock_name: name.into(),
      industry:   None,
    }
  }

  pub fn is_complete(&self) -> bool {
    !self.stock_code.trim().is_empty() && !self.stock_name.trim().is_empty()
  }
}

/// Counters reported by a bulk import.
///
/// A single upsert statement cannot tell an insert from an update, so
/// `upserted` counts both and `updated` stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub upserted: usize,
  pub updated:  usize,
  pub skipped:  usize,
}

/// Where an autocomplete suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
  Local,
  Remote,
}

/// An autocomplete entry for the stock-code input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSuggestion {
  pub code:    String,
  pub name:    String,
  #[serde(skip)]
  pub source:  SuggestionSource,
}

impl StockSuggestion {
  pub fn remote(code: impl Into<String>, name: impl Into<String>) -> Self {
    Self { code: code.into(), name: name.into(), source: SuggestionSource::Remote }
  }

  /// Text shown in the dropdown, e.g. `2330 台積電`.
  pub fn display(&self) -> String { format!("{} {}", self.code, self.name) }
}

impl From<Stock> for StockSuggestion {
  fn from(s: Stock) -> Self {
    Self {
      code:   s.stock_code,
      name:   s.stock_name,
      source: SuggestionSource::Local,
    }
  }
}

/// Merge local and remote suggestions: local entries first, one entry per
/// code, at most `limit` in total.
pub fn merge_suggestions(
  local: Vec<StockSuggestion>,
  remote: Vec<StockSuggestion>,
  limit: usize,
) -> Vec<StockSuggestion> {
  let mut seen = HashSet::new();
  local
    .into_iter()
    .chain(remote)
    .filter(|s| seen.insert(s.code.clone()))
    .take(limit)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn local(code: &str, name: &str) -> StockSuggestion {
    StockSuggestion {
      code:   code.into(),
      name:   name.into(),
      source: SuggestionSource::Local,
    }
  }

  #[test]
  fn merge_prefers_local_and_dedups_by_code() {
    let merged = merge_suggestions(
      vec![local("2330", "台積電")],
      vec![
        StockSuggestion::remote("2330", "TSMC"),
        StockSuggestion::remote("2317", "鴻海"),
      ],
      10,
    );
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].name, "台積電");
    assert_eq!(merged[0].source, SuggestionSource::Local);
    assert_eq!(merged[1].code, "2317");
  }

  #[test]
  fn merge_respects_limit() {
    let remote = (0..20)
      .map(|i| StockSuggestion::remote(format!("{}", 1000 + i), "x"))
      .collect();
    assert_eq!(merge_suggestions(vec![], remote, 10).len(), 10);
  }

  #[test]
  fn incomplete_records_are_detected() {
    assert!(StockRecord::new("2330", "台積電").is_complete());
    assert!(!StockRecord::new("2330", " ").is_complete());
    assert!(!StockRecord::new("", "台積電").is_complete());
  }

  #[test]
  fn display_joins_code_and_name() {
    assert_eq!(StockSuggestion::remote("2454", "聯發科").display(), "2454 聯發科");
  }
}
