//! The `RemoteStockSearch` trait — a fallback source of stock suggestions.
//!
//! Implemented by `snote-quote`. The HTTP layer only consults it when the
//! local stock table has no match.

use std::future::Future;

use crate::stock::StockSuggestion;

/// A remote lookup of stock codes by free-text query.
///
/// Implementations never fail: unreachable or misbehaving providers degrade to
/// an empty result, and the diagnostic is logged by the implementation.
pub trait RemoteStockSearch: Send + Sync {
  fn search<'a>(
    &'a self,
    query: &'a str,
    limit: usize,
  ) -> impl Future<Output = Vec<StockSuggestion>> + Send + 'a;
}
