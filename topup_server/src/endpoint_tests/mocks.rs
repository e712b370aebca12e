use mockall::mock;
use topup_engine::{
    db_types::{LedgerRecord, UserId},
    LedgerStore,
    LedgerStoreError,
};

mock! {
    pub LedgerBackend {}
    impl LedgerStore for LedgerBackend {
        async fn fetch_ledger(&self, user_id: &UserId) -> Result<Option<LedgerRecord>, LedgerStoreError>;
        async fn insert_ledger(&self, record: &LedgerRecord) -> Result<(), LedgerStoreError>;
        async fn update_ledger(&self, record: &LedgerRecord, expected_version: i64) -> Result<(), LedgerStoreError>;
    }
}
