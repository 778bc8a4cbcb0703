//! `snote` — stock note server and maintenance commands.
//!
//! Reads `snote.toml` (or the path given with `--config`) plus `SNOTE_*`
//! environment variables, then runs one subcommand. With no subcommand the
//! web server starts.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin.password_hash`:
//!
//! ```text
//! cargo run -p snote-server --bin snote -- hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use snote_core::store::NoteStore;
use snote_quote::QuoteClient;
use snote_server::{AppState, ServerConfig};
use snote_store_sqlite::{
  LazyStore, SqliteStore,
  migrate::{self, Migration},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stock note server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "snote.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the web server (the default).
  Serve {
    /// Apply pending migrations before serving.
    #[arg(long)]
    migrate: bool,
  },
  /// Apply pending schema migrations.
  Migrate {
    /// Directory of `*.sql` files; the bundled set when omitted.
    #[arg(long)]
    dir: Option<PathBuf>,
  },
  /// List migrations and whether each has been applied.
  MigrateStatus {
    #[arg(long)]
    dir: Option<PathBuf>,
  },
  /// Upsert stocks from a CSV file with `stock_code,stock_name[,industry]`.
  ImportStocks {
    #[arg(default_value = "data/example_stocks.csv")]
    csv: PathBuf,
  },
  /// Check database connectivity and print table sizes.
  CheckDb,
  /// Print the argon2 hash for a password entered on stdin.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(cfg.environment.default_log_level().into())
        .from_env_lossy(),
    )
    .init();

  match cli.command.unwrap_or(Command::Serve { migrate: false }) {
    Command::Serve { migrate } => serve(cfg, migrate).await,
    Command::Migrate { dir } => run_migrations(&cfg, dir.as_deref()).await,
    Command::MigrateStatus { dir } => migration_status(&cfg, dir.as_deref()).await,
    Command::ImportStocks { csv } => import_stocks(&cfg, &csv).await,
    Command::CheckDb => check_db(&cfg).await,
    Command::HashPassword => {
      let password = read_password()?;
      let hash = snote_server::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      println!("{hash}");
      Ok(())
    }
  }
}

async fn connect(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::connect(&cfg.database)
    .await
    .with_context(|| format!("failed to open database at {}", cfg.database.path.display()))
}

fn load_migrations(dir: Option<&Path>) -> anyhow::Result<Vec<Migration>> {
  match dir {
    Some(dir) => migrate::load_dir(dir)
      .with_context(|| format!("failed to read migrations from {}", dir.display())),
    None => Ok(migrate::bundled()),
  }
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

async fn serve(cfg: ServerConfig, migrate: bool) -> anyhow::Result<()> {
  let store = match SqliteStore::connect(&cfg.database).await {
    Ok(store) => {
      if migrate {
        let applied = store
          .migrate(&migrate::bundled())
          .await
          .context("migration failed")?;
        tracing::info!(count = applied.len(), "migrations applied");
        if store.init_common_stocks().await.context("failed to seed stocks")? {
          tracing::info!("seeded default stock list");
        }
      }
      LazyStore::connected(cfg.database.clone(), store)
    }
    Err(e) => {
      tracing::error!(
        path = %cfg.database.path.display(),
        error = %e,
        "database unavailable; serving degraded pages and retrying on each request"
      );
      let store = LazyStore::new(cfg.database.clone());
      if migrate { store.with_migrations(migrate::bundled()) } else { store }
    }
  };

  let remote = QuoteClient::new(cfg.quote.clone()).context("failed to build HTTP client")?;
  let address = cfg.address();
  let environment = cfg.environment;

  let app = snote_server::router(AppState::new(store, remote, cfg));

  tracing::info!(environment = environment.as_str(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn run_migrations(cfg: &ServerConfig, dir: Option<&Path>) -> anyhow::Result<()> {
  let migrations = load_migrations(dir)?;
  let store = connect(cfg).await?;
  let applied = store.migrate(&migrations).await.context("migration failed")?;

  if applied.is_empty() {
    println!("Database is up to date.");
  } else {
    for name in &applied {
      println!("applied  {name}");
    }
    println!("{} migration(s) applied.", applied.len());
  }
  Ok(())
}

async fn migration_status(cfg: &ServerConfig, dir: Option<&Path>) -> anyhow::Result<()> {
  let migrations = load_migrations(dir)?;
  let store = connect(cfg).await?;
  let report = store
    .migration_status(&migrations)
    .await
    .context("failed to read migration ledger")?;

  for m in &report {
    let state = match (&m.executed_at, m.known) {
      (Some(at), true) => format!("applied {at}"),
      (Some(at), false) => format!("applied {at} (no such file)"),
      (None, _) => "pending".to_owned(),
    };
    let description = m.description.as_deref().unwrap_or_default();
    println!("{:<40} {:<32} {description}", m.name, state);
  }
  let pending = report.iter().filter(|m| !m.is_applied()).count();
  println!("{pending} pending.");
  Ok(())
}

async fn import_stocks(cfg: &ServerConfig, csv: &Path) -> anyhow::Result<()> {
  let store = connect(cfg).await?;
  let summary = store
    .import_stocks_csv(csv)
    .await
    .with_context(|| format!("failed to import {}", csv.display()))?;

  println!(
    "upserted {}, updated {}, skipped {}",
    summary.upserted, summary.updated, summary.skipped
  );
  Ok(())
}

async fn check_db(cfg: &ServerConfig) -> anyhow::Result<()> {
  let store = connect(cfg).await?;
  store.ping().await.context("database did not answer")?;
  println!("Connected to {}", cfg.database.path.display());

  match store.table_counts().await {
    Ok((stocks, notes)) => println!("stocks: {stocks}\nnotes:  {notes}"),
    Err(e) => println!("tables not readable ({e}); run `snote migrate` first"),
  }

  let pending = store
    .migration_status(&migrate::bundled())
    .await
    .context("failed to read migration ledger")?
    .iter()
    .filter(|m| !m.is_applied())
    .count();
  println!("pending migrations: {pending}");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
