//! Listing parameters for [`crate::store::NoteStore::list_notes`].
//!
//! Sort column and direction are closed enums so that the store can splice
//! them into `ORDER BY` without ever interpolating user text.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Columns a note listing may be ordered by.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortBy {
  StockCode,
  StockName,
  NoteType,
  #[default]
  CreatedAt,
}

impl SortBy {
  /// Parse a user-supplied column name; anything unrecognised falls back to
  /// [`SortBy::CreatedAt`].
  pub fn lenient(s: Option<&str>) -> Self {
    s.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  /// Parse `ASC` / `DESC` in any case; anything else falls back to `DESC`.
  pub fn lenient(s: Option<&str>) -> Self {
    s.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
  }
}

/// Parameters for listing notes.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
  /// Substring matched against code, name, content and ref.
  pub search:     Option<String>,
  pub sort_by:    SortBy,
  pub sort_order: SortOrder,
}

impl NoteQuery {
  /// Build a query from raw request parameters, applying the fallbacks.
  pub fn from_params(
    search: Option<&str>,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
  ) -> Self {
    Self {
      search:     search.map(str::to_owned),
      sort_by:    SortBy::lenient(sort_by),
      sort_order: SortOrder::lenient(sort_order),
    }
  }

  /// The trimmed search term, or `None` when blank.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_sort_column_falls_back_to_created_at() {
    assert_eq!(SortBy::lenient(Some("content; DROP TABLE notes")), SortBy::CreatedAt);
    assert_eq!(SortBy::lenient(None), SortBy::CreatedAt);
    assert_eq!(SortBy::lenient(Some("stock_name")), SortBy::StockName);
  }

  #[test]
  fn sort_order_is_case_insensitive() {
    assert_eq!(SortOrder::lenient(Some("asc")), SortOrder::Asc);
    assert_eq!(SortOrder::lenient(Some("DESC")), SortOrder::Desc);
    assert_eq!(SortOrder::lenient(Some("sideways")), SortOrder::Desc);
  }

  #[test]
  fn blank_search_term_is_ignored() {
    let q = NoteQuery::from_params(Some("  "), None, None);
    assert!(q.search_term().is_none());
    let q = NoteQuery::from_params(Some(" 台積電 "), None, None);
    assert_eq!(q.search_term(), Some("台積電"));
  }

  #[test]
  fn column_names_match_sql() {
    assert_eq!(SortBy::StockCode.as_ref(), "stock_code");
    assert_eq!(SortOrder::Asc.as_ref(), "ASC");
  }
}
