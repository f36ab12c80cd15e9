//! ideate-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), loads the
//! CSV idea table into the in-memory corpus, opens an in-process SQLite
//! store, and serves the survey API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use ideate_api::{AppState, ServerConfig};
use ideate_core::corpus::IdeaCorpus;
use ideate_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Ideate survey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("IDEATE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Load the idea table. Any failure here is fatal: the survey never runs
  // against a partial corpus.
  let idea_table_path = expand_tilde(&server_cfg.idea_table_path);
  let records = ideate_corpus_csv::load_idea_table(&idea_table_path)
    .with_context(|| {
      format!("failed to load idea table at {idea_table_path:?}")
    })?;
  let corpus = IdeaCorpus::from_records(records);
  tracing::info!(
    rows = corpus.len(),
    apps = corpus.applications().len(),
    "idea corpus loaded"
  );

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Build application state.
  let state = AppState {
    corpus: Arc::new(corpus),
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = ideate_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
