mod common;

use common::{date, line_summary, manager, unpaid_expense, unpaid_income};
use fund_ledger::{
    ledger::{DateRange, OPERATING_DIVISION},
    LedgerError,
};

fn lines(expected: &[(&str, f64, f64)]) -> Vec<(String, f64, f64)> {
    expected
        .iter()
        .map(|(code, debit, credit)| (code.to_string(), *debit, *credit))
        .collect()
}

#[test]
fn unpaid_income_accrues_a_receivable() {
    let mut manager = manager();
    let txn = unpaid_income("5101", 10_000.0, date(2024, 1, 10));
    let id = manager.create_from_transaction(&txn, false).unwrap();
    assert_eq!(
        line_summary(&manager, id),
        lines(&[("1301", 10_000.0, 0.0), ("5101", 0.0, 10_000.0)])
    );
    assert!(manager.journal(id).unwrap().is_draft());
}

#[test]
fn settling_income_clears_the_receivable() {
    let mut manager = manager();
    let txn = unpaid_income("5101", 10_000.0, date(2024, 1, 10));
    manager.create_from_transaction(&txn, true).unwrap();
    let id = manager.settle_transaction(&txn, "1102", true).unwrap();
    assert_eq!(
        line_summary(&manager, id),
        lines(&[("1102", 10_000.0, 0.0), ("1301", 0.0, 10_000.0)])
    );
}

#[test]
fn unpaid_expense_and_its_settlement() {
    let mut manager = manager();
    let txn = unpaid_expense("6101", 50_000.0, date(2024, 2, 5));
    let accrual = manager.create_from_transaction(&txn, true).unwrap();
    assert_eq!(
        line_summary(&manager, accrual),
        lines(&[("6101", 50_000.0, 0.0), ("2101", 0.0, 50_000.0)])
    );
    let settlement = manager.settle_transaction(&txn, "1102", true).unwrap();
    assert_eq!(
        line_summary(&manager, settlement),
        lines(&[("2101", 50_000.0, 0.0), ("1102", 0.0, 50_000.0)])
    );
}

#[test]
fn trial_balance_over_generated_journals_is_balanced() {
    let mut manager = manager();
    let income = unpaid_income("5101", 10_000.0, date(2024, 1, 10));
    let expense = unpaid_expense("6101", 50_000.0, date(2024, 2, 5));
    manager.create_from_transaction(&income, true).unwrap();
    manager.settle_transaction(&income, "1102", true).unwrap();
    manager.create_from_transaction(&expense, true).unwrap();
    manager.settle_transaction(&expense, "1102", true).unwrap();

    let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
    let trial = manager.trial_balance(range, None).unwrap();
    assert!(trial.is_balanced);
    assert_eq!(trial.total_debit, trial.total_credit);
    assert_eq!(trial.total_debit, 120_000.0);
    assert_eq!(trial.row("1301").unwrap().balance, 0.0);
    assert_eq!(trial.row("2101").unwrap().balance, 0.0);
    assert_eq!(trial.row("1102").unwrap().balance, -40_000.0);

    assert_eq!(manager.division_balance(OPERATING_DIVISION).unwrap(), -40_000.0);
}

#[test]
fn generation_is_deterministic() {
    let manager = manager();
    let txn = unpaid_income("5101", 250.0, date(2024, 3, 1)).with_note("March fees");
    let first = fund_ledger::core::services::GeneratorService::generate_journal(
        manager.ledger(),
        &manager.config().default_accounts,
        &txn,
    )
    .unwrap();
    let second = fund_ledger::core::services::GeneratorService::generate_journal(
        manager.ledger(),
        &manager.config().default_accounts,
        &txn,
    )
    .unwrap();
    assert_eq!(first, second);
    assert!(first.description.ends_with(" - March fees"));
}

#[test]
fn settling_a_paid_transaction_is_rejected() {
    let mut manager = manager();
    let mut txn = unpaid_income("5101", 80.0, date(2024, 4, 1));
    txn.status = fund_ledger::ledger::PaymentStatus::Paid;
    assert!(matches!(
        manager.settle_transaction(&txn, "1102", true),
        Err(LedgerError::Validation(_))
    ));
    assert_eq!(manager.ledger().journal_count(), 0);
}

#[test]
fn unknown_payment_account_is_reported() {
    let mut manager = manager();
    let txn = unpaid_income("5101", 80.0, date(2024, 4, 1));
    let err = manager.settle_transaction(&txn, "1999", true).unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));
    assert!(err.is_not_found());
}
