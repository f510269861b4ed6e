use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use lexqa_core::config::DatabaseConfig;

pub mod repository;
pub use repository::*;

/// Embedded schema migrations, applied on every pool initialization.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexqa");
    fs::create_dir_all(&data_dir).ok();
    data_dir.join("lexqa.db")
}

fn resolve_db_path(config: &DatabaseConfig) -> PathBuf {
    if config.sqlite_path == PathBuf::from("lexqa.db") {
        return default_db_path();
    }
    config.sqlite_path.clone()
}

/// Open the SQLite pool and run migrations.
pub async fn init_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let db_path = resolve_db_path(config);
    info!("Initializing database at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut connect_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .foreign_keys(config.enable_foreign_keys)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    if config.enable_wal {
        connect_options = connect_options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout))
        .connect_with(connect_options)
        .await?;

    MIGRATOR.run(&pool).await?;

    info!("Database initialized");
    Ok(pool)
}
