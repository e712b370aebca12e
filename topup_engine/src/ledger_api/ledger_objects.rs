use crate::db_types::LedgerRecord;

pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 8;
pub const DEFAULT_PAYMENT_HISTORY_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How many times a conflicting write is retried before giving up. Always at least 1.
    pub max_write_attempts: u32,
    /// How many applied payment ids are kept per user for replay detection. Always at least 1.
    pub payment_history_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS, payment_history_size: DEFAULT_PAYMENT_HISTORY_SIZE }
    }
}

impl LedgerConfig {
    pub fn new(max_write_attempts: u32, payment_history_size: usize) -> Self {
        Self { max_write_attempts: max_write_attempts.max(1), payment_history_size: payment_history_size.max(1) }
    }
}

/// What `apply_credit` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// No ledger existed; one was created holding this credit.
    Created(LedgerRecord),
    /// The credit was added to an existing ledger.
    Credited(LedgerRecord),
    /// The payment had been credited before. Nothing was written.
    AlreadyApplied(LedgerRecord),
}

impl CreditOutcome {
    pub fn record(&self) -> &LedgerRecord {
        match self {
            Self::Created(r) | Self::Credited(r) | Self::AlreadyApplied(r) => r,
        }
    }

    pub fn is_new_credit(&self) -> bool {
        !matches!(self, Self::AlreadyApplied(_))
    }
}
