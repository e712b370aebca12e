use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
pub use topup_common::Paise;

//--------------------------------------       UserId        ---------------------------------------------------------
/// The application's identifier for a user. Opaque to this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------      PaymentId      ---------------------------------------------------------
/// The payment processor's identifier for a payment, e.g. `pay_DESlfW9H8K9uqM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for PaymentId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------      NewCredit      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredit {
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub amount: Paise,
}

impl NewCredit {
    pub fn new<U: Into<UserId>, P: Into<PaymentId>>(user_id: U, payment_id: P, amount: Paise) -> Self {
        Self { user_id: user_id.into(), payment_id: payment_id.into(), amount }
    }
}

impl Display for NewCredit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} for {} (payment {})", self.amount, self.user_id, self.payment_id)
    }
}

//--------------------------------------    LedgerRecord     ---------------------------------------------------------
/// The per-user ledger. Created on the first credit and never deleted.
///
/// `applied_payments` holds the most recent payment ids credited to this ledger (oldest first). It is the idempotency
/// witness: a payment id in this list is never credited again.
///
/// Amounts are held in paise but serialize in major units, e.g. `"balance": 100.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub user_id: UserId,
    #[serde(with = "topup_common::major_units")]
    pub balance: Paise,
    #[serde(with = "topup_common::major_units")]
    pub total_top_up: Paise,
    pub last_payment_id: PaymentId,
    pub applied_payments: Vec<PaymentId>,
    /// Incremented on every write. Used for optimistic concurrency control.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// A brand-new ledger holding a single credit.
    pub fn open(credit: &NewCredit, now: DateTime<Utc>) -> Self {
        Self {
            user_id: credit.user_id.clone(),
            balance: credit.amount,
            total_top_up: credit.amount,
            last_payment_id: credit.payment_id.clone(),
            applied_payments: vec![credit.payment_id.clone()],
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_applied(&self, payment_id: &PaymentId) -> bool {
        &self.last_payment_id == payment_id || self.applied_payments.contains(payment_id)
    }

    /// Returns the next version of this ledger with `credit` applied, keeping at most `history_size` payment ids.
    /// Returns `None` if the balance would overflow.
    pub fn credited(&self, credit: &NewCredit, now: DateTime<Utc>, history_size: usize) -> Option<Self> {
        let balance = self.balance.checked_add(credit.amount)?;
        let total_top_up = self.total_top_up.checked_add(credit.amount)?;
        let mut applied_payments = self.applied_payments.clone();
        applied_payments.push(credit.payment_id.clone());
        let excess = applied_payments.len().saturating_sub(history_size.max(1));
        applied_payments.drain(..excess);
        Some(Self {
            user_id: self.user_id.clone(),
            balance,
            total_top_up,
            last_payment_id: credit.payment_id.clone(),
            applied_payments,
            version: self.version + 1,
            created_at: self.created_at,
            updated_at: now,
        })
    }
}
