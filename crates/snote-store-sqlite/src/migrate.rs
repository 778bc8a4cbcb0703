//! Schema migrations.
//!
//! A migration is a named SQL script. Scripts are applied in name order and
//! each applied name is recorded in the `migrations` ledger table, so running
//! the same set twice is a no-op. The scripts bundled with this crate live in
//! `migrations/` and are compiled in; a directory of `.sql` files can be
//! loaded instead.

use std::path::Path;

use crate::Result;

/// Markers that introduce a migration's one-line description.
const DESCRIPTION_MARKERS: &[&str] = &["-- Description:", "-- 描述:"];

/// Ledger DDL; created before any migration runs.
pub(crate) const LEDGER_DDL: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    migration_name TEXT NOT NULL UNIQUE,
    executed_at    TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
    description    TEXT
);
";

const BUNDLED: &[(&str, &str)] = &[
  (
    "0001_create_stocks_and_notes.sql",
    include_str!("../migrations/0001_create_stocks_and_notes.sql"),
  ),
  (
    "0002_add_note_updated_at.sql",
    include_str!("../migrations/0002_add_note_updated_at.sql"),
  ),
  (
    "0003_add_note_reference.sql",
    include_str!("../migrations/0003_add_note_reference.sql"),
  ),
];

/// A single schema-change script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
  /// File name; doubles as the ledger key.
  pub name: String,
  pub sql:  String,
}

impl Migration {
  pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
    Self { name: name.into(), sql: sql.into() }
  }

  /// Text after the first description marker, if any.
  pub fn description(&self) -> Option<String> {
    self.sql.lines().find_map(|line| {
      DESCRIPTION_MARKERS.iter().find_map(|marker| {
        line
          .split_once(marker)
          .map(|(_, rest)| rest.trim().to_owned())
          .filter(|d| !d.is_empty())
      })
    })
  }

  /// The script split into statements on `;`.
  ///
  /// Whole-line `--` comments are dropped first, so a `;` inside a comment
  /// never splits a statement.
  pub fn statements(&self) -> Vec<String> {
    let code: String = self
      .sql
      .lines()
      .filter(|line| !line.trim_start().starts_with("--"))
      .collect::<Vec<_>>()
      .join("\n");

    code
      .split(';')
      .map(str::trim)
      .filter(|stmt| !stmt.is_empty())
      .map(str::to_owned)
      .collect()
  }
}

/// The migrations compiled into this crate, in application order.
pub fn bundled() -> Vec<Migration> {
  BUNDLED
    .iter()
    .map(|(name, sql)| Migration::new(*name, *sql))
    .collect()
}

/// Load every `*.sql` file in `dir`, sorted by file name.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<Migration>> {
  let mut migrations = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let path = entry?.path();
    if !path.is_file() || path.extension().is_none_or(|ext| ext != "sql") {
      continue;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    let sql = std::fs::read_to_string(&path)?;
    migrations.push(Migration::new(name, sql));
  }
  migrations.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(migrations)
}

/// Whether a migration has been applied, as reported by
/// [`crate::SqliteStore::migration_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
  pub name:        String,
  /// Ledger timestamp; `None` while pending.
  pub executed_at: Option<String>,
  pub description: Option<String>,
  /// `false` for ledger entries with no corresponding script.
  pub known:       bool,
}

impl MigrationStatus {
  pub fn is_applied(&self) -> bool { self.executed_at.is_some() }
}
