//! The `NoteStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `snote-store-sqlite`).
//! The HTTP crates depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  note::{NewNote, Note, NoteEdit},
  query::NoteQuery,
  stock::{ImportSummary, Stock, StockRecord},
};

/// Abstraction over a note store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait NoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Persist a note, creating or renaming its stock first.
  ///
  /// The stock row is inserted if the code is new, and its name updated if
  /// the resolved name differs from the stored one.
  fn add_note(
    &self,
    input: NewNote,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + '_;

  /// List notes joined with their stock names, filtered and ordered by
  /// `query`.
  fn list_notes<'a>(
    &'a self,
    query: &'a NoteQuery,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a;

  /// Retrieve a note by id. Returns `None` if not found.
  fn get_note(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Note>, Self::Error>> + Send + '_;

  /// Overwrite the editable fields of a note and stamp `updated_at`.
  /// Returns `false` if no note has this id.
  fn update_note(
    &self,
    id: i64,
    edit: NoteEdit,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a note. Returns `false` if no note has this id.
  fn delete_note(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Stocks ────────────────────────────────────────────────────────────

  /// Ranked fuzzy match over stock code and name, at most `limit` rows.
  fn search_stocks<'a>(
    &'a self,
    query: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Stock>, Self::Error>> + Send + 'a;

  /// Exact lookup by code.
  fn get_stock<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Stock>, Self::Error>> + Send + 'a;

  /// Bulk upsert; incomplete rows are skipped and counted.
  fn import_stocks(
    &self,
    rows: Vec<StockRecord>,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + '_;

  /// Seed a default stock if the table is empty. Returns whether a row was
  /// written.
  fn init_common_stocks(
    &self,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Liveness ──────────────────────────────────────────────────────────

  /// Cheap round trip to the database.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
