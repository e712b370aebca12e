//! # Ledger storage contracts
//!
//! The ledger treats its backing store as a document store holding one [`LedgerRecord`] per user. Backends implement
//! [`LedgerStore`]; everything else (idempotency, retry on conflict) lives in [`crate::LedgerApi`].
//!
//! [`LedgerRecord`]: crate::db_types::LedgerRecord
mod ledger_store;

pub use ledger_store::{LedgerStore, LedgerStoreError};
