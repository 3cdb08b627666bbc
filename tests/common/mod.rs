#![allow(dead_code)]

use std::sync::Mutex;

use chrono::NaiveDate;
use fund_ledger::{
    config::{Config, ConfigManager},
    core::ledger_manager::LedgerManager,
    ledger::{PaymentStatus, Transaction, TransactionType, OPERATING_DIVISION},
    storage::json_backend::JsonStorage,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates isolated managers backed by unique directories for each test.
pub fn setup_test_env() -> (LedgerManager, ConfigManager) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let storage =
        JsonStorage::new(Some(base.join("data")), Some(3)).expect("create json storage backend");
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let config = config_manager.load().expect("load default config");
    let ledger_manager = LedgerManager::new("Test Estate", config).with_storage(Box::new(storage));

    (ledger_manager, config_manager)
}

/// In-memory manager with the standard chart and default configuration.
pub fn manager() -> LedgerManager {
    LedgerManager::new("Test Estate", Config::default())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn unpaid_income(account: &str, amount: f64, on: NaiveDate) -> Transaction {
    Transaction::new(
        TransactionType::Income,
        account,
        amount,
        PaymentStatus::Unpaid,
        OPERATING_DIVISION,
        on,
    )
}

pub fn unpaid_expense(account: &str, amount: f64, on: NaiveDate) -> Transaction {
    Transaction::new(
        TransactionType::Expense,
        account,
        amount,
        PaymentStatus::Unpaid,
        OPERATING_DIVISION,
        on,
    )
}

/// `(account, debit, credit)` per line, in line order.
pub fn line_summary(manager: &LedgerManager, id: uuid::Uuid) -> Vec<(String, f64, f64)> {
    manager
        .journal(id)
        .expect("journal exists")
        .lines
        .iter()
        .map(|line| (line.account_code.clone(), line.debit_amount, line.credit_amount))
        .collect()
}
