use thiserror::Error;

use crate::db_types::{LedgerRecord, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The ledger for {0} was modified by another writer")]
    Conflict(UserId),
}

impl From<sqlx::Error> for LedgerStoreError {
    fn from(e: sqlx::Error) -> Self {
        LedgerStoreError::DatabaseError(e.to_string())
    }
}

/// The `LedgerStore` trait defines the storage primitives the ledger needs.
///
/// Writes are conditional so that callers can run an optimistic read-modify-write loop:
/// * [`insert_ledger`](LedgerStore::insert_ledger) only succeeds if no ledger exists for the user yet.
/// * [`update_ledger`](LedgerStore::update_ledger) only succeeds if the stored version still equals the version the
///   caller read.
///
/// Both return [`LedgerStoreError::Conflict`] when the condition does not hold. Implementations must make each call
/// atomic with respect to concurrent callers.
#[allow(async_fn_in_trait)]
pub trait LedgerStore {
    /// Fetches the ledger for the given user. If no ledger exists, `None` is returned.
    async fn fetch_ledger(&self, user_id: &UserId) -> Result<Option<LedgerRecord>, LedgerStoreError>;

    /// Creates a new ledger.
    async fn insert_ledger(&self, record: &LedgerRecord) -> Result<(), LedgerStoreError>;

    /// Replaces the ledger for `record.user_id`, provided the stored ledger is still at `expected_version`.
    async fn update_ledger(&self, record: &LedgerRecord, expected_version: i64) -> Result<(), LedgerStoreError>;
}
