//! tunimaqam-api - Tunisian maqam content service
//!
//! Serves the maqam corpus, note analysis, recommendations and learning
//! content over HTTP. Configuration resolves CLI > environment > TOML > defaults.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};
use tunimaqam_api::{build_router, AppState};
use tunimaqam_common::config::{
    load_toml_config, CliOverrides, ServiceConfig, DEFAULT_LOG_LEVEL, ROOT_FOLDER_ENV,
};
use tunimaqam_common::db::{count_entries, init_database, resolve_auth_secret, seed_from_file};

/// Command-line arguments for tunimaqam-api
#[derive(Parser, Debug)]
#[command(name = "tunimaqam-api")]
#[command(about = "Tunisian maqam knowledge, analysis and learning service")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config_dir>/tunimaqam/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TUNIMAQAM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TUNIMAQAM_PORT")]
    port: Option<u16>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "TUNIMAQAM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Token signing secret; 0 disables authorization (default: stored in the database)
    #[arg(long, env = "TUNIMAQAM_AUTH_SECRET")]
    auth_secret: Option<i64>,

    /// Lifetime of issued tokens in seconds
    #[arg(long, env = "TUNIMAQAM_TOKEN_TTL_SECS")]
    token_ttl_secs: Option<i64>,

    /// JSON corpus imported when the database is empty
    #[arg(long)]
    seed_file: Option<PathBuf>,
}

/// `RUST_LOG` when set, else `level` for everything plus request spans
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},tower_http=debug", level).into())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before reading the config file so its warnings show;
    // a log level from the file is applied once the file is read
    let initial_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let (filter, filter_handle) = reload::Layer::new(log_filter(&initial_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServiceConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            auth_secret: args.auth_secret,
            token_ttl_secs: args.token_ttl_secs,
        },
        toml,
    );

    if config.log_level != initial_level {
        filter_handle
            .reload(log_filter(&config.log_level))
            .context("Failed to apply log level")?;
    }

    info!("Starting TuniMaqam API v{}", env!("CARGO_PKG_VERSION"));
    info!("Root folder: {}", config.root_folder.display());

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    if let Some(seed_file) = &args.seed_file {
        let inserted = seed_from_file(&pool, seed_file)
            .await
            .with_context(|| format!("Failed to seed from {}", seed_file.display()))?;
        info!("Seed file {}: {} maqamet inserted", seed_file.display(), inserted);
    }

    let corpus_size = count_entries(&pool).await?;
    if corpus_size == 0 {
        warn!("Corpus is empty; start with --seed-file to import maqamet");
    } else {
        info!("Corpus holds {} maqamet", corpus_size);
    }

    let auth_secret = resolve_auth_secret(&pool, config.auth_secret)
        .await
        .context("Failed to load token signing secret")?;
    if auth_secret != 0 {
        info!("Authorization enabled (token TTL {}s)", config.token_ttl_secs);
    } else {
        warn!("Authorization disabled (auth_secret = 0)");
    }

    let state = AppState::new(pool, auth_secret);
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("tunimaqam-api listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
