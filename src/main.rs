pub mod api;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod price;
pub mod schema;
pub mod store;
pub mod utils;
pub mod services {
    pub mod import;
    pub mod market_sync;
    pub mod seed;
}

use crate::config::Config;
use crate::services::{import, market_sync, seed};
use crate::store::postgres::{build_pool, PgStore};
use crate::store::Store;
use clap::{Parser, Subcommand};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Parser)]
#[command(name = "offplan-api", version, about = "Off-plan property catalogue, leads and market API")]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Insert the built-in developer and area catalogue, skipping existing slugs
    Seed,
    /// Upsert projects from a JSON file and refresh area roll-ups
    ImportProjects { file: PathBuf },
    /// Upsert market statistics from a JSON file
    ImportMarket { file: PathBuf },
}

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

fn run(command: Command) -> Result<(), String> {
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (listen={}, pool_size={}, cors_origin={})",
        cfg.listen_address(),
        cfg.pool_size,
        cfg.cors_origin.as_deref().unwrap_or("*")
    );

    let pool = build_pool(&cfg.database_url, cfg.pool_size)?;
    let mut conn = pool.get().map_err(|e| format!("DB connection failed: {}", e))?;
    info!("Connected to database");

    apply_database_migrations(&mut conn)?;

    match command {
        Command::Migrate => Ok(()),
        Command::Seed => seed::run(&mut conn),
        Command::ImportProjects { file } => import::run(&mut conn, &file).map(|_| ()),
        Command::ImportMarket { file } => market_sync::run(&mut conn, &file).map(|_| ()),
        Command::Serve => {
            // Return the migration connection to the pool before serving.
            drop(conn);
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("failed to start async runtime: {}", e))?;
            runtime.block_on(api::serve(&cfg, store))
        }
    }
}

fn load_env(explicit: Option<PathBuf>) -> Result<Option<LoadedEnvFile>, String> {
    if let Some(path) = explicit {
        dotenvy::from_path(&path).map_err(|e| format!("failed to load env file {}: {}", path.display(), e))?;
        return Ok(Some(LoadedEnvFile { path, explicit: true }));
    }
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(LoadedEnvFile { path, explicit: false })),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(format!("failed to load .env: {}", e)),
    }
}

fn main() {
    let cli = Cli::parse();

    let loaded_env = match load_env(cli.env_file) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "offplan-api {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(cli.command.unwrap_or(Command::Serve)) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
