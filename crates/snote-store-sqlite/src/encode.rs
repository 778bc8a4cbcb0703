//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text; note types as their
//! uppercase wire form.

use chrono::NaiveDateTime;
use snote_core::{
  note::{Note, NoteType},
  query::{SortBy, SortOrder},
  stock::Stock,
  timestamp,
};

use crate::Result;

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_ts(dt: NaiveDateTime) -> String { timestamp::format(dt) }

pub fn decode_ts(s: &str) -> Result<NaiveDateTime> { Ok(timestamp::parse(s)?) }

fn decode_opt_ts(s: Option<String>) -> Result<Option<NaiveDateTime>> {
  s.as_deref()
    .filter(|s| !s.is_empty())
    .map(decode_ts)
    .transpose()
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `\`, `%` and `_` so the term matches literally under
/// `LIKE ... ESCAPE '\'`.
fn escape_like(term: &str) -> String {
  let mut out = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

pub fn contains_pattern(term: &str) -> String {
  format!("%{}%", escape_like(term))
}

pub fn prefix_pattern(term: &str) -> String { format!("{}%", escape_like(term)) }

// ─── ORDER BY ────────────────────────────────────────────────────────────────

/// The qualified column behind a [`SortBy`] in the note listing query.
pub fn sort_column(sort_by: SortBy) -> &'static str {
  match sort_by {
    SortBy::StockCode => "n.stock_code",
    SortBy::StockName => "stock_name",
    SortBy::NoteType => "n.note_type",
    SortBy::CreatedAt => "n.created_at",
  }
}

pub fn sort_direction(order: SortOrder) -> &'static str {
  match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawNote::from_row`].
pub const NOTE_COLUMNS: &str = "n.id, n.stock_code,
  COALESCE(s.stock_name, n.stock_code) AS stock_name,
  n.note_type, n.content, n.ref, n.ref_time, n.created_at, n.updated_at";

/// Raw values read directly from a `notes` row joined with `stocks`.
pub struct RawNote {
  pub id:         i64,
  pub stock_code: String,
  pub stock_name: String,
  pub note_type:  String,
  pub content:    String,
  pub reference:  Option<String>,
  pub ref_time:   Option<String>,
  pub created_at: String,
  pub updated_at: Option<String>,
}

impl RawNote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      stock_code: row.get(1)?,
      stock_name: row.get(2)?,
      note_type:  row.get(3)?,
      content:    row.get(4)?,
      reference:  row.get(5)?,
      ref_time:   row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
    })
  }

  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      id:         self.id,
      stock_code: self.stock_code,
      stock_name: self.stock_name,
      note_type:  NoteType::parse(&self.note_type)?,
      content:    self.content,
      reference:  self.reference,
      ref_time:   decode_opt_ts(self.ref_time)?,
      created_at: decode_ts(&self.created_at)?,
      updated_at: decode_opt_ts(self.updated_at)?,
    })
  }
}

/// Column list matching [`RawStock::from_row`].
pub const STOCK_COLUMNS: &str =
  "stock_code, stock_name, industry, last_updated";

/// Raw values read directly from a `stocks` row.
pub struct RawStock {
  pub stock_code:   String,
  pub stock_name:   String,
  pub industry:     Option<String>,
  pub last_updated: String,
}

impl RawStock {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      stock_code:   row.get(0)?,
      stock_name:   row.get(1)?,
      industry:     row.get(2)?,
      last_updated: row.get(3)?,
    })
  }

  pub fn into_stock(self) -> Result<Stock> {
    Ok(Stock {
      stock_code:   self.stock_code,
      stock_name:   self.stock_name,
      industry:     self.industry,
      last_updated: decode_ts(&self.last_updated)?,
    })
  }
}
