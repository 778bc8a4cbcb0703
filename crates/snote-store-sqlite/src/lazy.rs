//! [`LazyStore`] — a [`SqliteStore`] opened on first use.
//!
//! The server uses it so that an unreachable database at startup is not
//! fatal. Until an open succeeds every operation fails with the open error,
//! which the HTTP layer already turns into degraded pages; each later call
//! tries to open again.

use snote_core::{
  note::{NewNote, Note, NoteEdit},
  query::NoteQuery,
  stock::{ImportSummary, Stock, StockRecord},
  store::NoteStore,
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{DatabaseConfig, Error, Result, SqliteStore, migrate::Migration};

pub struct LazyStore {
  config:     DatabaseConfig,
  /// Applied right after the first successful open.
  migrations: Vec<Migration>,
  inner:      OnceCell<SqliteStore>,
}

impl LazyStore {
  /// A store that has not been opened yet.
  pub fn new(config: DatabaseConfig) -> Self {
    Self { config, migrations: Vec::new(), inner: OnceCell::new() }
  }

  /// Wrap a store that is already open.
  pub fn connected(config: DatabaseConfig, store: SqliteStore) -> Self {
    Self { config, migrations: Vec::new(), inner: OnceCell::new_with(Some(store)) }
  }

  pub fn with_migrations(mut self, migrations: Vec<Migration>) -> Self {
    self.migrations = migrations;
    self
  }

  pub fn is_open(&self) -> bool { self.inner.initialized() }

  /// The open store, opening it now if needed. Concurrent callers wait on
  /// the same attempt; a failed attempt leaves the cell empty.
  async fn store(&self) -> Result<&SqliteStore> {
    self
      .inner
      .get_or_try_init(|| async {
        let store = SqliteStore::try_open(&self.config.path).await.map_err(|e| {
          warn!(path = %self.config.path.display(), error = %e, "database still unavailable");
          Error::Database(e)
        })?;
        if !self.migrations.is_empty() {
          let applied = store.migrate(&self.migrations).await?;
          info!(count = applied.len(), "migrations applied");
        }
        info!(path = %self.config.path.display(), "database connection established");
        Ok::<_, Error>(store)
      })
      .await
  }
}

impl NoteStore for LazyStore {
  type Error = Error;

  async fn add_note(&self, input: NewNote) -> Result<Note> {
    self.store().await?.add_note(input).await
  }

  async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
    self.store().await?.list_notes(query).await
  }

  async fn get_note(&self, id: i64) -> Result<Option<Note>> {
    self.store().await?.get_note(id).await
  }

  async fn update_note(&self, id: i64, edit: NoteEdit) -> Result<bool> {
    self.store().await?.update_note(id, edit).await
  }

  async fn delete_note(&self, id: i64) -> Result<bool> {
    self.store().await?.delete_note(id).await
  }

  async fn search_stocks(&self, query: &str, limit: usize) -> Result<Vec<Stock>> {
    self.store().await?.search_stocks(query, limit).await
  }

  async fn get_stock(&self, code: &str) -> Result<Option<Stock>> {
    self.store().await?.get_stock(code).await
  }

  async fn import_stocks(&self, rows: Vec<StockRecord>) -> Result<ImportSummary> {
    self.store().await?.import_stocks(rows).await
  }

  async fn init_common_stocks(&self) -> Result<bool> {
    self.store().await?.init_common_stocks().await
  }

  async fn ping(&self) -> Result<()> {
    self.store().await?.ping().await
  }
}
