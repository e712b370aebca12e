//! Top-up ledger engine
//!
//! This library holds the ledger logic for the top-up service. It knows nothing about Razorpay or HTTP.
//!
//! The library is divided into three sections:
//! 1. Storage ([`traits`]). A backend only has to provide three operations on a per-user [`db_types::LedgerRecord`]:
//!    fetch, insert-if-absent and update-if-unchanged. SQLite and an in-memory backend are provided.
//! 2. The ledger API ([`LedgerApi`]). `apply_credit` is the only way balances change. It is idempotent per payment id
//!    and safe under concurrent deliveries for the same user.
//! 3. The data types shared by both ([`db_types`]).
pub mod db_types;
mod ledger_api;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use ledger_api::{
    errors::LedgerApiError,
    ledger_objects::{CreditOutcome, LedgerConfig},
    reconciler::LedgerApi,
};
pub use memory::MemoryLedgerStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{LedgerStore, LedgerStoreError};
