//! An in-memory ledger backend. Useful for development and tests; nothing survives a restart.
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use crate::{
    db_types::{LedgerRecord, UserId},
    traits::{LedgerStore, LedgerStoreError},
};

#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    ledgers: Arc<RwLock<HashMap<UserId, LedgerRecord>>>,
}

impl Debug for MemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MemoryLedgerStore")
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.ledgers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ledgers.read().await.is_empty()
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn fetch_ledger(&self, user_id: &UserId) -> Result<Option<LedgerRecord>, LedgerStoreError> {
        Ok(self.ledgers.read().await.get(user_id).cloned())
    }

    async fn insert_ledger(&self, record: &LedgerRecord) -> Result<(), LedgerStoreError> {
        let mut ledgers = self.ledgers.write().await;
        if ledgers.contains_key(&record.user_id) {
            return Err(LedgerStoreError::Conflict(record.user_id.clone()));
        }
        trace!("🗃️ New in-memory ledger for {}", record.user_id);
        ledgers.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn update_ledger(&self, record: &LedgerRecord, expected_version: i64) -> Result<(), LedgerStoreError> {
        let mut ledgers = self.ledgers.write().await;
        match ledgers.get_mut(&record.user_id) {
            Some(current) if current.version == expected_version => {
                *current = record.clone();
                Ok(())
            },
            _ => Err(LedgerStoreError::Conflict(record.user_id.clone())),
        }
    }
}
