//! [`SqliteStore`] — the SQLite implementation of [`NoteStore`].

use std::{path::Path, time::Duration};

use rusqlite::OptionalExtension as _;
use snote_core::{
  note::{NewNote, Note, NoteEdit},
  query::NoteQuery,
  stock::{ImportSummary, Stock, StockRecord},
  store::NoteStore,
  timestamp,
};
use tracing::{debug, info, warn};

use crate::{
  DatabaseConfig, Error, Result,
  encode::{
    NOTE_COLUMNS, RawNote, RawStock, STOCK_COLUMNS, contains_pattern, encode_ts,
    prefix_pattern, sort_column, sort_direction,
  },
  import,
  migrate::{LEDGER_DDL, Migration, MigrationStatus},
};

/// Stock written by [`NoteStore::init_common_stocks`] into an empty table.
const DEFAULT_STOCK: (&str, &str, &str) = ("2330", "台積電", "半導體業");

/// Ceiling for the delay between connection attempts.
pub(crate) const MAX_BACKOFF: Duration = Duration::from_secs(60);

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Double `delay`, saturating at [`MAX_BACKOFF`].
pub(crate) fn next_backoff(delay: Duration) -> Duration {
  delay.saturating_mul(2).min(MAX_BACKOFF)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A note store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Every
/// operation borrows the connection for the duration of one `call` closure.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the database described by `config`, retrying with exponential
  /// backoff. Does not run migrations.
  pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
    let attempts = config.connect_attempts.max(1);
    let mut delay = config.initial_backoff().min(MAX_BACKOFF);
    let mut attempt = 1;

    loop {
      match Self::try_open(&config.path).await {
        Ok(store) => {
          if attempt > 1 {
            info!(attempt, "database connection established");
          }
          return Ok(store);
        }
        Err(last) if attempt >= attempts => {
          return Err(Error::ConnectExhausted { attempts, last });
        }
        Err(e) => {
          warn!(
            attempt,
            error = %e,
            "database connection failed; retrying in {delay:?}"
          );
          tokio::time::sleep(delay).await;
          delay = next_backoff(delay);
          attempt += 1;
        }
      }
    }
  }

  pub(crate) async fn try_open(path: &Path) -> tokio_rusqlite::Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Open an in-memory store with the bundled migrations applied, useful for
  /// testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    conn
      .call(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
      })
      .await?;
    let store = Self { conn };
    store.migrate(&crate::migrate::bundled()).await?;
    Ok(store)
  }

  // ── Migrations ────────────────────────────────────────────────────────────

  async fn ensure_ledger(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(LEDGER_DDL)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn applied_migrations(&self) -> Result<Vec<(String, String)>> {
    self.ensure_ledger().await?;
    let applied = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT migration_name, executed_at FROM migrations ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(applied)
  }

  /// Apply every migration not yet in the ledger, in order.
  ///
  /// Each script and its ledger row commit together. The first failure rolls
  /// back that script and stops the run; earlier scripts stay applied.
  /// Returns the names applied by this call.
  pub async fn migrate(&self, migrations: &[Migration]) -> Result<Vec<String>> {
    let applied = self.applied_migrations().await?;
    let mut ran = Vec::new();

    for migration in migrations {
      if applied.iter().any(|(name, _)| *name == migration.name) {
        debug!(migration = %migration.name, "already applied");
        continue;
      }

      let name = migration.name.clone();
      let statements = migration.statements();
      let description = migration.description();

      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          for statement in &statements {
            tx.execute_batch(statement)?;
          }
          tx.execute(
            "INSERT INTO migrations (migration_name, description) VALUES (?1, ?2)",
            rusqlite::params![name, description],
          )?;
          tx.commit()?;
          Ok(())
        })
        .await
        .map_err(|source| Error::Migration {
          name: migration.name.clone(),
          source,
        })?;

      info!(migration = %migration.name, "migration applied");
      ran.push(migration.name.clone());
    }

    Ok(ran)
  }

  /// Report each known migration as applied or pending, followed by any
  /// ledger entries with no matching script.
  pub async fn migration_status(
    &self,
    migrations: &[Migration],
  ) -> Result<Vec<MigrationStatus>> {
    let applied = self.applied_migrations().await?;

    let mut report: Vec<MigrationStatus> = migrations
      .iter()
      .map(|m| MigrationStatus {
        name:        m.name.clone(),
        executed_at: applied
          .iter()
          .find(|(name, _)| *name == m.name)
          .map(|(_, at)| at.clone()),
        description: m.description(),
        known:       true,
      })
      .collect();

    report.extend(
      applied
        .into_iter()
        .filter(|(name, _)| !migrations.iter().any(|m| m.name == *name))
        .map(|(name, at)| MigrationStatus {
          name,
          executed_at: Some(at),
          description: None,
          known: false,
        }),
    );

    Ok(report)
  }

  // ── Extras ────────────────────────────────────────────────────────────────

  /// Read a CSV file and upsert its rows; see [`NoteStore::import_stocks`].
  pub async fn import_stocks_csv(
    &self,
    path: impl AsRef<Path>,
  ) -> Result<ImportSummary> {
    let rows = import::read_csv(path).await?;
    self.import_stocks(rows).await
  }

  /// Row counts of the `stocks` and `notes` tables.
  pub async fn table_counts(&self) -> Result<(i64, i64)> {
    let counts = self
      .conn
      .call(|conn| {
        let stocks: i64 =
          conn.query_row("SELECT COUNT(*) FROM stocks", [], |r| r.get(0))?;
        let notes: i64 =
          conn.query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))?;
        Ok((stocks, notes))
      })
      .await?;
    Ok(counts)
  }
}

// ─── NoteStore impl ──────────────────────────────────────────────────────────

impl NoteStore for SqliteStore {
  type Error = Error;

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn add_note(&self, input: NewNote) -> Result<Note> {
    input.validate()?;

    let code       = input.stock_code.trim().to_owned();
    let supplied   = input.supplied_stock_name().map(str::to_owned);
    let new_name   = input.resolved_stock_name();
    let now        = timestamp::now();
    let now_str    = encode_ts(now);
    let note_type  = input.note_type.as_ref().to_owned();
    let content    = input.content.clone();
    let reference  = input.reference.clone();
    let ref_time   = input.ref_time.map(encode_ts);

    let (id, stock_name) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT stock_name FROM stocks WHERE stock_code = ?1",
            rusqlite::params![code],
            |r| r.get(0),
          )
          .optional()?;

        let stock_name = match (current, supplied) {
          (None, _) => {
            tx.execute(
              "INSERT INTO stocks (stock_code, stock_name, industry, last_updated)
               VALUES (?1, ?2, NULL, ?3)",
              rusqlite::params![code, new_name, now_str],
            )?;
            debug!(stock_code = %code, "created stock");
            new_name
          }
          (Some(current), Some(supplied)) if current != supplied => {
            tx.execute(
              "UPDATE stocks SET stock_name = ?2, last_updated = ?3
               WHERE stock_code = ?1",
              rusqlite::params![code, supplied, now_str],
            )?;
            debug!(stock_code = %code, from = %current, to = %supplied, "renamed stock");
            supplied
          }
          (Some(current), _) => current,
        };

        tx.execute(
          "INSERT INTO notes (stock_code, note_type, content, ref, ref_time, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![code, note_type, content, reference, ref_time, now_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, stock_name))
      })
      .await?;

    info!(note_id = id, stock_code = %input.stock_code.trim(), "note added");

    Ok(Note {
      id,
      stock_code: input.stock_code.trim().to_owned(),
      stock_name,
      note_type: input.note_type,
      content: input.content,
      reference: input.reference,
      ref_time: input.ref_time,
      created_at: now,
      updated_at: None,
    })
  }

  async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
    let pattern   = query.search_term().map(contains_pattern);
    let column    = sort_column(query.sort_by);
    let direction = sort_direction(query.sort_order);

    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let where_clause = if pattern.is_some() {
          "WHERE n.stock_code LIKE ?1 ESCAPE '\\'
              OR s.stock_name LIKE ?1 ESCAPE '\\'
              OR n.content    LIKE ?1 ESCAPE '\\'
              OR n.ref        LIKE ?1 ESCAPE '\\'"
        } else {
          ""
        };

        // `column` and `direction` come from closed enums, never from input.
        let sql = format!(
          "SELECT {NOTE_COLUMNS}
           FROM notes n
           LEFT JOIN stocks s ON s.stock_code = n.stock_code
           {where_clause}
           ORDER BY {column} {direction}, n.id {direction}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = match &pattern {
          Some(p) => stmt.query_map(rusqlite::params![p], RawNote::from_row)?,
          None => stmt.query_map([], RawNote::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  async fn get_note(&self, id: i64) -> Result<Option<Note>> {
    let raw: Option<RawNote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 LEFT JOIN stocks s ON s.stock_code = n.stock_code
                 WHERE n.id = ?1"
              ),
              rusqlite::params![id],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNote::into_note).transpose()
  }

  async fn update_note(&self, id: i64, edit: NoteEdit) -> Result<bool> {
    edit.validate()?;

    let note_type = edit.note_type.as_ref().to_owned();
    let ref_time  = edit.ref_time.map(encode_ts);
    let now_str   = encode_ts(timestamp::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notes
           SET note_type = ?2, content = ?3, ref = ?4, ref_time = ?5, updated_at = ?6
           WHERE id = ?1",
          rusqlite::params![id, note_type, edit.content, edit.reference, ref_time, now_str],
        )?)
      })
      .await?;

    if changed == 0 {
      debug!(note_id = id, "update matched no note");
    }
    Ok(changed > 0)
  }

  async fn delete_note(&self, id: i64) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM notes WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed > 0 {
      info!(note_id = id, "note deleted");
    }
    Ok(changed > 0)
  }

  // ── Stocks ────────────────────────────────────────────────────────────────

  async fn search_stocks(&self, query: &str, limit: usize) -> Result<Vec<Stock>> {
    let query = query.trim().to_owned();
    if query.is_empty() || limit == 0 {
      return Ok(Vec::new());
    }

    let contains = contains_pattern(&query);
    let prefix   = prefix_pattern(&query);
    let limit    = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawStock> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STOCK_COLUMNS}
           FROM stocks
           WHERE stock_code LIKE ?2 ESCAPE '\\' OR stock_name LIKE ?2 ESCAPE '\\'
           ORDER BY
             CASE
               WHEN stock_code = ?1 THEN 1
               WHEN stock_name = ?1 THEN 2
               WHEN stock_code LIKE ?3 ESCAPE '\\' THEN 3
               WHEN stock_name LIKE ?3 ESCAPE '\\' THEN 4
               WHEN stock_name LIKE ?2 ESCAPE '\\' THEN 5
               ELSE 6
             END,
             stock_code
           LIMIT ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![query, contains, prefix, limit],
            RawStock::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStock::into_stock).collect()
  }

  async fn get_stock(&self, code: &str) -> Result<Option<Stock>> {
    let code = code.trim().to_owned();

    let raw: Option<RawStock> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE stock_code = ?1"),
              rusqlite::params![code],
              RawStock::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStock::into_stock).transpose()
  }

  async fn import_stocks(&self, rows: Vec<StockRecord>) -> Result<ImportSummary> {
    let now_str = encode_ts(timestamp::now());

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();
        {
          let mut upsert = tx.prepare(
            "INSERT INTO stocks (stock_code, stock_name, industry, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(stock_code) DO UPDATE SET
               stock_name   = excluded.stock_name,
               industry     = COALESCE(excluded.industry, stocks.industry),
               last_updated = excluded.last_updated",
          )?;

          for row in rows {
            if !row.is_complete() {
              summary.skipped += 1;
              continue;
            }
            let industry = row
              .industry
              .as_deref()
              .map(str::trim)
              .filter(|i| !i.is_empty());
            upsert.execute(rusqlite::params![
              row.stock_code.trim(),
              row.stock_name.trim(),
              industry,
              now_str,
            ])?;
            summary.upserted += 1;
          }
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    info!(
      upserted = summary.upserted,
      skipped = summary.skipped,
      "stock import finished"
    );
    Ok(summary)
  }

  async fn init_common_stocks(&self) -> Result<bool> {
    let now_str = encode_ts(timestamp::now());

    let seeded = self
      .conn
      .call(move |conn| {
        let count: i64 =
          conn.query_row("SELECT COUNT(*) FROM stocks", [], |r| r.get(0))?;
        if count > 0 {
          return Ok(false);
        }
        let (code, name, industry) = DEFAULT_STOCK;
        conn.execute(
          "INSERT INTO stocks (stock_code, stock_name, industry, last_updated)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![code, name, industry, now_str],
        )?;
        Ok(true)
      })
      .await?;

    if seeded {
      info!("seeded default stock");
    }
    Ok(seeded)
  }

  // ── Liveness ──────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
