mod common;

use common::{date, manager, unpaid_expense, unpaid_income};
use fund_ledger::{
    ledger::{DateRange, JournalInput, JournalLine, UnitOwner, RESERVE_DIVISION},
    CreateOptions, LedgerManager,
};

fn populated() -> LedgerManager {
    let mut manager = manager();
    let income = unpaid_income("5101", 10_000.0, date(2024, 1, 10));
    manager.create_from_transaction(&income, true).unwrap();
    manager.settle_transaction(&income, "1102", true).unwrap();
    let expense = unpaid_expense("6101", 4_000.0, date(2024, 2, 5));
    manager.create_from_transaction(&expense, true).unwrap();
    let reserve = JournalInput::new(date(2024, 2, 6), "Reserve interest", RESERVE_DIVISION)
        .line(JournalLine::debit("1103", 1_500.0))
        .line(JournalLine::credit("5103", 1_500.0));
    manager.create_journal(reserve, CreateOptions::posted()).unwrap();
    manager
}

#[test]
fn income_statement_partitions_revenue_and_expense() {
    let manager = populated();
    let statement = manager.income_statement(DateRange::all(), None).unwrap();
    assert_eq!(statement.total_revenue, 11_500.0);
    assert_eq!(statement.total_expense, 4_000.0);
    assert_eq!(statement.net_income, 7_500.0);
}

#[test]
fn balance_sheet_folds_unclosed_income_into_equity() {
    let manager = populated();
    let sheet = manager.balance_sheet(date(2024, 12, 31), None).unwrap();
    assert_eq!(sheet.total_assets, 11_500.0);
    assert_eq!(sheet.total_liabilities, 4_000.0);
    assert_eq!(sheet.total_equity, 0.0);
    assert_eq!(sheet.net_income_to_date, 7_500.0);
    assert_eq!(sheet.total_liabilities_and_equity, sheet.total_assets);
    assert!(sheet.is_balanced);

    let january = manager.balance_sheet(date(2024, 1, 31), None).unwrap();
    assert_eq!(january.total_assets, 10_000.0);
    assert_eq!(january.total_liabilities, 0.0);
    assert_eq!(january.net_income_to_date, 10_000.0);
}

#[test]
fn closing_moves_income_into_retained_earnings() {
    let mut manager = populated();
    let as_of = date(2024, 12, 31);
    assert!(manager.close_period(as_of, None).unwrap().is_some());

    let sheet = manager.balance_sheet(as_of, None).unwrap();
    assert_eq!(sheet.net_income_to_date, 0.0);
    assert_eq!(sheet.total_equity, 7_500.0);
    assert!(sheet.is_balanced);

    assert!(manager.close_period(as_of, None).unwrap().is_none());
}

#[test]
fn division_filter_limits_the_trial_balance() {
    let manager = populated();
    let trial = manager
        .trial_balance(DateRange::all(), Some(RESERVE_DIVISION))
        .unwrap();
    assert_eq!(trial.total_debit, 1_500.0);
    let codes: Vec<&str> = trial.rows.iter().map(|row| row.account_code.as_str()).collect();
    assert_eq!(codes, vec!["1103", "5103"]);
    assert!(trial.rollups.iter().any(|rollup| rollup.account_code == "1000"));
}

#[test]
fn debug_breakdown_explains_the_sign_rule() {
    let manager = populated();
    let rows = manager.balance_sheet_debug(date(2024, 12, 31), None);
    let payable = rows.iter().find(|row| row.account_code == "2101").unwrap();
    assert_eq!(payable.calculated, -4_000.0);
    assert_eq!(payable.displayed, 4_000.0);
    assert!(payable.sign_consistent);
}

#[test]
fn owner_statement_splits_at_range_start() {
    let mut manager = manager();
    manager
        .register_unit_owner(UnitOwner {
            code: "U-7".into(),
            name: "Rivera".into(),
            unit: None,
            attributes: Default::default(),
        })
        .unwrap();
    let january = unpaid_income("5101", 200.0, date(2024, 1, 5)).with_auxiliary("U-7");
    manager.create_from_transaction(&january, true).unwrap();
    let february = unpaid_income("5101", 150.0, date(2024, 2, 3)).with_auxiliary("U-7");
    manager.create_from_transaction(&february, true).unwrap();
    let mut payment = january.clone();
    payment.date = date(2024, 2, 10);
    manager.settle_transaction(&payment, "1102", true).unwrap();

    let range = DateRange::new(date(2024, 2, 1), date(2024, 2, 29)).unwrap();
    let report = manager.auxiliary_report("1301", "U-7", range).unwrap();
    assert_eq!(report.opening_balance, 200.0);
    assert_eq!(report.total_debit, 150.0);
    assert_eq!(report.total_credit, 200.0);
    assert_eq!(report.closing_balance, 150.0);
    assert_eq!(report.transactions.len(), 2);
}
