//! Reading stock lists from CSV.
//!
//! The header row must name `stock_code` and `stock_name` (or `code` and
//! `name`); an `industry` column is optional. Values are trimmed and an empty
//! industry becomes `NULL`.

use std::path::Path;

use snote_core::stock::StockRecord;

use crate::Result;

/// Parse CSV text into import rows.
///
/// A row that fails to deserialise is kept as an empty record so the import
/// counts it as skipped instead of aborting the whole file.
pub fn parse_csv(text: &str) -> Result<Vec<StockRecord>> {
  let text = text.strip_prefix('\u{feff}').unwrap_or(text);
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(text.as_bytes());

  let mut rows = Vec::new();
  for (line, result) in reader.deserialize::<StockRecord>().enumerate() {
    match result {
      Ok(mut record) => {
        record.industry = record.industry.filter(|i| !i.trim().is_empty());
        rows.push(record);
      }
      Err(e) => {
        tracing::warn!(row = line + 1, error = %e, "unreadable stock row");
        rows.push(StockRecord::default());
      }
    }
  }
  Ok(rows)
}

/// Read and parse a CSV file.
pub async fn read_csv(path: impl AsRef<Path>) -> Result<Vec<StockRecord>> {
  let text = tokio::fs::read_to_string(path).await?;
  parse_csv(&text)
}
