//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or create an atomic transaction as
//! the need arises and call through to the functions without any other changes.
use std::{str::FromStr, time::Duration};

use log::debug;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod ledgers;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a pool on the database at `url`, creating the file and any missing parent directories.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    if let Some(dir) = options.clone().get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
        if !dir.exists() {
            debug!("🗃️ Creating database directory {}", dir.display());
            tokio::fs::create_dir_all(dir).await.map_err(SqlxError::Io)?;
        }
    }
    debug!("🗃️ Opening SQLite pool with {max_connections} connections");
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
