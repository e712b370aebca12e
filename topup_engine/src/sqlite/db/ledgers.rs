use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{LedgerRecord, Paise, PaymentId, UserId},
    traits::LedgerStoreError,
};

/// Amounts are stored as major-unit decimal text (`"100.00"`). `applied_payments` is stored as a JSON array of
/// payment ids.
#[derive(FromRow)]
struct LedgerRow {
    user_id: String,
    balance: String,
    total_top_up: String,
    last_payment_id: String,
    applied_payments: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerRecord {
    type Error = LedgerStoreError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let applied_payments = serde_json::from_str::<Vec<PaymentId>>(&row.applied_payments).map_err(|e| {
            LedgerStoreError::DatabaseError(format!("Corrupt payment history for {}. {e}", row.user_id))
        })?;
        Ok(Self {
            user_id: UserId(row.user_id.clone()),
            balance: stored_amount(&row.user_id, &row.balance)?,
            total_top_up: stored_amount(&row.user_id, &row.total_top_up)?,
            last_payment_id: PaymentId(row.last_payment_id),
            applied_payments,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn stored_amount(user_id: &str, value: &str) -> Result<Paise, LedgerStoreError> {
    Paise::parse_major(value)
        .map_err(|e| LedgerStoreError::DatabaseError(format!("Corrupt amount in ledger for {user_id}. {e}")))
}

fn history_json(record: &LedgerRecord) -> Result<String, LedgerStoreError> {
    serde_json::to_string(&record.applied_payments)
        .map_err(|e| LedgerStoreError::DatabaseError(format!("Could not serialize payment history. {e}")))
}

pub async fn fetch_ledger(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerRecord>, LedgerStoreError> {
    let row: Option<LedgerRow> = sqlx::query_as(
        r#"
        SELECT user_id, balance, total_top_up, last_payment_id, applied_payments, version, created_at, updated_at
        FROM ledgers
        WHERE user_id = $1"#,
    )
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    row.map(LedgerRecord::try_from).transpose()
}

/// Inserts a new ledger. Returns `Conflict` if a ledger for the user already exists.
pub async fn insert_ledger(record: &LedgerRecord, conn: &mut SqliteConnection) -> Result<(), LedgerStoreError> {
    let history = history_json(record)?;
    let result = sqlx::query(
        r#"
        INSERT INTO ledgers
            (user_id, balance, total_top_up, last_payment_id, applied_payments, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id) DO NOTHING"#,
    )
    .bind(record.user_id.as_str())
    .bind(record.balance.to_major().to_string())
    .bind(record.total_top_up.to_major().to_string())
    .bind(record.last_payment_id.as_str())
    .bind(history)
    .bind(record.version)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Ledger for {} already exists", record.user_id);
        return Err(LedgerStoreError::Conflict(record.user_id.clone()));
    }
    Ok(())
}

/// Overwrites the ledger, but only if it is still at `expected_version`. Returns `Conflict` otherwise.
pub async fn update_ledger(
    record: &LedgerRecord,
    expected_version: i64,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerStoreError> {
    let history = history_json(record)?;
    let result = sqlx::query(
        r#"
        UPDATE ledgers SET
            balance = $1,
            total_top_up = $2,
            last_payment_id = $3,
            applied_payments = $4,
            version = $5,
            updated_at = $6
        WHERE user_id = $7 AND version = $8"#,
    )
    .bind(record.balance.to_major().to_string())
    .bind(record.total_top_up.to_major().to_string())
    .bind(record.last_payment_id.as_str())
    .bind(history)
    .bind(record.version)
    .bind(record.updated_at)
    .bind(record.user_id.as_str())
    .bind(expected_version)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Ledger for {} is no longer at version {expected_version}", record.user_id);
        return Err(LedgerStoreError::Conflict(record.user_id.clone()));
    }
    Ok(())
}
