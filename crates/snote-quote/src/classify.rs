//! Deciding whether a search hit is a Taiwan-listed security.
//!
//! The upstream search is global, so a query like `台積電` also returns ADRs
//! and foreign listings. A quote is kept when any one of these holds:
//!
//! 1. the symbol carries a `.TW` or `.TWO` suffix;
//! 2. the exchange is one of `TAI`, `TWO`, `TWSE` or `TPEX`;
//! 3. the display name contains a CJK ideograph;
//! 4. the code is all digits and at least four long.

use serde::Deserialize;
use snote_core::stock::StockSuggestion;

const SUFFIXES: &[&str] = &[".TW", ".TWO"];

const EXCHANGES: &[&str] = &["TAI", "TWO", "TWSE", "TPEX"];

/// One entry of the search response's `quotes` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quote {
  #[serde(default)]
  pub symbol:    Option<String>,
  #[serde(default)]
  pub shortname: Option<String>,
  #[serde(default)]
  pub longname:  Option<String>,
  #[serde(default)]
  pub exchange:  Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
  s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Quote {
  pub fn symbol(&self) -> Option<&str> { non_empty(&self.symbol) }

  /// The symbol up to its first `.`, e.g. `2330` for `2330.TW`.
  pub fn code(&self) -> Option<&str> {
    self
      .symbol()
      .map(|s| s.split('.').next().unwrap_or(s))
      .filter(|c| !c.is_empty())
  }

  /// `longname`, then `shortname`, then the code.
  pub fn display_name(&self) -> Option<&str> {
    non_empty(&self.longname)
      .or_else(|| non_empty(&self.shortname))
      .or_else(|| self.code())
  }

  /// The suggestion for this quote, if it is a domestic listing.
  pub fn into_suggestion(self) -> Option<StockSuggestion> {
    if !is_domestic_stock(&self) {
      return None;
    }
    let code = self.code()?;
    let name = self.display_name().unwrap_or(code);
    Some(StockSuggestion::remote(code, name))
  }
}

fn is_cjk(c: char) -> bool {
  matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

pub fn is_domestic_stock(quote: &Quote) -> bool {
  let Some(symbol) = quote.symbol() else {
    return false;
  };

  if SUFFIXES.iter().any(|suffix| symbol.ends_with(suffix)) {
    return true;
  }

  let exchange = non_empty(&quote.exchange);
  if exchange.is_some_and(|x| EXCHANGES.iter().any(|e| e.eq_ignore_ascii_case(x))) {
    return true;
  }

  if quote.display_name().is_some_and(|name| name.chars().any(is_cjk)) {
    return true;
  }

  quote
    .code()
    .is_some_and(|code| code.len() >= 4 && code.bytes().all(|b| b.is_ascii_digit()))
}
