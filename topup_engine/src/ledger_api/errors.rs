use thiserror::Error;

use crate::{
    db_types::{Paise, UserId},
    traits::LedgerStoreError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A concurrent write to the ledger for {0} won the race")]
    Conflict(UserId),
    #[error("Could not update the ledger for {user_id} after {attempts} attempts")]
    RetriesExhausted { user_id: UserId, attempts: u32 },
    #[error("Crediting the ledger for {0} would overflow the balance")]
    BalanceOverflow(UserId),
    #[error("Credits must be positive, not {0}")]
    InvalidAmount(Paise),
}

impl From<LedgerStoreError> for LedgerApiError {
    fn from(e: LedgerStoreError) -> Self {
        match e {
            LedgerStoreError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerStoreError::Conflict(user_id) => Self::Conflict(user_id),
        }
    }
}
