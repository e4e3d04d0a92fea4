#![allow(dead_code)]

pub mod scenarios;

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use booking_core::document::{self, DocumentTransactionManager};
use booking_core::sqlite::{self, SqliteTransactionManager};

/// Install a tracing subscriber once so coordinator and service logging
/// shows up in test output.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// SQLite transaction manager over a fresh temporary database.
///
/// The returned directory keeps the database alive for the test.
pub async fn sqlite_manager() -> (SqliteTransactionManager, TempDir) {
    init_tracing();
    let dir = TempDir::new().expect("failed to create temp dir");
    let pool = sqlite::connect(&dir.path().join("booking.db"))
        .await
        .expect("failed to open sqlite database");
    sqlite::initialize_schema(&pool)
        .await
        .expect("failed to create schema");
    (SqliteTransactionManager::from_pool(Arc::new(pool)), dir)
}

/// Document transaction manager over a fresh temporary database.
pub fn document_manager() -> (DocumentTransactionManager, TempDir) {
    init_tracing();
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = document::open(&dir.path().join("booking.redb"))
        .expect("failed to open document database");
    (DocumentTransactionManager::from_database(Arc::new(db)), dir)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("invalid test date")
}
