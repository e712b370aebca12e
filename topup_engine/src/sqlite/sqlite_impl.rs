//! `SqliteDatabase` is a concrete implementation of a ledger backend.
//!
//! Each trait method is a single statement, so the conditional writes are atomic without an explicit transaction.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{ledgers, new_pool};
use crate::{
    db_types::{LedgerRecord, UserId},
    traits::{LedgerStore, LedgerStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl LedgerStore for SqliteDatabase {
    async fn fetch_ledger(&self, user_id: &UserId) -> Result<Option<LedgerRecord>, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        ledgers::fetch_ledger(user_id, &mut conn).await
    }

    async fn insert_ledger(&self, record: &LedgerRecord) -> Result<(), LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        ledgers::insert_ledger(record, &mut conn).await?;
        debug!("🗃️ Ledger for {} has been created", record.user_id);
        Ok(())
    }

    async fn update_ledger(&self, record: &LedgerRecord, expected_version: i64) -> Result<(), LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        ledgers::update_ledger(record, expected_version, &mut conn).await?;
        debug!("🗃️ Ledger for {} updated to version {}", record.user_id, record.version);
        Ok(())
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), LedgerStoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerStoreError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
