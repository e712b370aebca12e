use log::*;
use tempfile::TempDir;
use topup_engine::SqliteDatabase;

/// Creates a fresh, migrated SQLite ledger in a temporary directory. The directory (and database) is removed when the
/// returned `TempDir` is dropped, so keep it alive for the duration of the test.
pub async fn prepare_test_db() -> (TempDir, SqliteDatabase) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("test_ledger.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    (dir, db)
}
