//! Applies credits to user ledgers.

use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{LedgerRecord, NewCredit, UserId},
    ledger_api::{
        errors::LedgerApiError,
        ledger_objects::{CreditOutcome, LedgerConfig},
    },
    traits::{LedgerStore, LedgerStoreError},
};

/// `LedgerApi` is the only way ledger balances change.
///
/// Payment processors deliver webhooks at-least-once, and may deliver the same event several times, concurrently.
/// [`LedgerApi::apply_credit`] therefore
/// * records every payment id it credits on the ledger itself, and refuses to credit a recorded id again, and
/// * writes with a conditional insert/update, re-reading and retrying when another writer got there first.
pub struct LedgerApi<B> {
    db: B,
    config: LedgerConfig,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?}, {:?})", self.db, self.config)
    }
}

impl<B> LedgerApi<B>
where B: LedgerStore
{
    pub fn new(db: B) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    pub fn with_config(db: B, config: LedgerConfig) -> Self {
        let config = LedgerConfig::new(config.max_write_attempts, config.payment_history_size);
        Self { db, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Fetches the ledger for the given user. If no credit has ever been applied, `None` is returned.
    pub async fn ledger_for_user(&self, user_id: &UserId) -> Result<Option<LedgerRecord>, LedgerApiError> {
        Ok(self.db.fetch_ledger(user_id).await?)
    }

    /// Credits `credit.amount` to the user's ledger, creating the ledger if necessary.
    ///
    /// If `credit.payment_id` has already been credited to this ledger, nothing is written and
    /// [`CreditOutcome::AlreadyApplied`] is returned. This is a success: the caller should acknowledge the delivery.
    pub async fn apply_credit(&self, credit: NewCredit) -> Result<CreditOutcome, LedgerApiError> {
        if !credit.amount.is_positive() {
            return Err(LedgerApiError::InvalidAmount(credit.amount));
        }
        let attempts = self.config.max_write_attempts;
        for attempt in 1..=attempts {
            let now = Utc::now();
            let result = match self.db.fetch_ledger(&credit.user_id).await? {
                None => {
                    let record = LedgerRecord::open(&credit, now);
                    let written = self.db.insert_ledger(&record).await;
                    written.map(|_| CreditOutcome::Created(record))
                },
                Some(existing) if existing.has_applied(&credit.payment_id) => {
                    info!("📒️ Payment {} has already been credited to {}. Skipping.", credit.payment_id, credit.user_id);
                    return Ok(CreditOutcome::AlreadyApplied(existing));
                },
                Some(existing) => {
                    let updated = existing
                        .credited(&credit, now, self.config.payment_history_size)
                        .ok_or_else(|| LedgerApiError::BalanceOverflow(credit.user_id.clone()))?;
                    let written = self.db.update_ledger(&updated, existing.version).await;
                    written.map(|_| CreditOutcome::Credited(updated))
                },
            };
            match result {
                Ok(outcome) => {
                    let record = outcome.record();
                    info!("📒️ Credited {credit}. Balance is now {} (ledger v{})", record.balance, record.version);
                    return Ok(outcome);
                },
                Err(LedgerStoreError::Conflict(_)) => {
                    debug!("📒️ Write conflict on the ledger for {} (attempt {attempt}/{attempts})", credit.user_id);
                },
                Err(e) => return Err(e.into()),
            }
        }
        warn!("📒️ Gave up crediting {credit} after {attempts} conflicting writes");
        Err(LedgerApiError::RetriesExhausted { user_id: credit.user_id, attempts })
    }
}
