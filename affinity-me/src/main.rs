//! affinity-me (Matching Engine) - ranks preference items for a request context
//!
//! Startup sequence:
//! 1. Parse command line, locate and read the TOML config
//! 2. Initialize tracing and log build identification
//! 3. Resolve root folder, open or create the database
//! 4. Load engine parameters from the settings table
//! 5. Serve HTTP

use affinity_common::config::{CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig};
use affinity_me::params::EngineParams;
use affinity_me::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "affinity-me", version, about = "Affinity Matching Engine")]
struct Args {
    /// Folder holding affinity.db (overrides AFFINITY_ROOT_FOLDER and config file)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP bind address, host:port
    #[arg(long, env = "AFFINITY_BIND")]
    bind: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "AFFINITY_LOG")]
    log_level: Option<String>,

    /// Config file (default: platform config dir/affinity/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();

    // Read config before tracing so its log level can apply; outcome is logged below
    let config_path = TomlConfig::locate(args.config.as_deref());
    let config_result = config_path.as_deref().map(TomlConfig::load);
    let toml = match &config_result {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| EnvFilter::new(&defaults.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Build identification first, before any database delays
    info!(
        "Starting Affinity Matching Engine (affinity-me) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match (&config_path, &config_result) {
        (Some(path), Some(Ok(_))) => info!("Loaded config file: {}", path.display()),
        (Some(path), Some(Err(e))) => warn!("Ignoring config file {}: {}", path.display(), e),
        _ => info!("No config file found, using defaults"),
    }

    let root_folder = RootFolderResolver::new("affinity-me")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(toml.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match affinity_common::db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let params = EngineParams::load(&pool)
        .await
        .context("Failed to load engine parameters")?;

    let state = AppState::new(pool, params);
    let app = build_router(state);

    let bind = args.bind.or(toml.bind).unwrap_or(defaults.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("affinity-me listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
