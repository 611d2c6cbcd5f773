//! issue-token - print a signed bearer token for tunimaqam-api
//!
//! Operators hand these to clients; the secret must match the service's
//! `auth_secret`. Without one on the command line, in the environment or in
//! the config file, the secret stored in the service database is used.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tunimaqam_common::auth::{issue_token, Role};
use tunimaqam_common::config::{load_toml_config, CliOverrides, ServiceConfig, ROOT_FOLDER_ENV};
use tunimaqam_common::db::{init_database, resolve_auth_secret};

#[derive(Parser, Debug)]
#[command(name = "issue-token")]
#[command(about = "Issue a signed bearer token for tunimaqam-api")]
#[command(version)]
struct Args {
    /// Identity carried by the token
    #[arg(long)]
    email: String,

    /// admin, expert or learner
    #[arg(long)]
    role: Role,

    /// Token lifetime in seconds (default: config token_ttl_secs)
    #[arg(long)]
    ttl_secs: Option<i64>,

    /// Signing secret (default: config auth_secret, then the stored secret)
    #[arg(long, env = "TUNIMAQAM_AUTH_SECRET")]
    secret: Option<i64>,

    /// Root folder holding the service database
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServiceConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            auth_secret: args.secret,
            token_ttl_secs: args.ttl_secs,
            ..Default::default()
        },
        toml,
    );

    if config.token_ttl_secs <= 0 {
        bail!("token lifetime must be positive, got {}", config.token_ttl_secs);
    }

    let secret = match config.auth_secret {
        Some(secret) => secret,
        None => {
            let db_path = config.database_path();
            let pool = init_database(&db_path)
                .await
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            let secret = resolve_auth_secret(&pool, None)
                .await
                .context("Failed to load token signing secret")?;
            pool.close().await;
            secret
        }
    };
    if secret == 0 {
        bail!("auth_secret is 0; the service does not check tokens");
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    let token = issue_token(
        &args.email,
        args.role,
        config.token_ttl_secs,
        secret,
        now_ms,
    );
    println!("{}", token);

    Ok(())
}
