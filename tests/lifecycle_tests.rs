mod common;

use common::{date, manager, unpaid_income};
use fund_ledger::{
    core::services::JournalFilter,
    ledger::{
        DateRange, JournalInput, JournalLine, JournalPatch, JournalStatus, UnitOwner,
        OPERATING_DIVISION,
    },
    CreateOptions, LedgerError,
};

fn fee_input(amount: f64) -> JournalInput {
    JournalInput::new(date(2024, 5, 1), "Parking fee", OPERATING_DIVISION)
        .line(JournalLine::debit("1102", amount))
        .line(JournalLine::credit("5102", amount))
}

#[test]
fn journal_numbers_are_monotonic_and_never_reused() {
    let mut manager = manager();
    let first = manager.create_journal(fee_input(10.0), CreateOptions::default()).unwrap();
    let second = manager.create_journal(fee_input(20.0), CreateOptions::default()).unwrap();
    assert_eq!(manager.journal(first).unwrap().journal_number, "JV000001");
    assert_eq!(manager.journal(second).unwrap().journal_number, "JV000002");

    manager.delete_journal(second).unwrap();
    let third = manager.create_journal(fee_input(30.0), CreateOptions::default()).unwrap();
    assert_eq!(manager.journal(third).unwrap().journal_number, "JV000003");
}

#[test]
fn reposting_fails_without_duplicating_effects() {
    let mut manager = manager();
    let id = manager.create_journal(fee_input(75.0), CreateOptions::posted()).unwrap();
    assert!(matches!(
        manager.post_journal_by_id(id),
        Err(LedgerError::State(_))
    ));
    let trial = manager.trial_balance(DateRange::all(), None).unwrap();
    assert_eq!(trial.total_debit, 75.0);
    assert_eq!(manager.division_balance(OPERATING_DIVISION).unwrap(), 75.0);
}

#[test]
fn unbalanced_draft_cannot_post() {
    let mut manager = manager();
    let input = JournalInput::new(date(2024, 5, 2), "Typo", OPERATING_DIVISION)
        .line(JournalLine::debit("1102", 100.0))
        .line(JournalLine::credit("5102", 10.0));
    let id = manager.create_journal(input, CreateOptions::default()).unwrap();
    let err = manager.post_journal_by_id(id).unwrap_err();
    assert!(matches!(err, LedgerError::State(_)), "{err}");
    assert!(manager.journal(id).unwrap().is_draft());
    assert!(manager.journals(&JournalFilter::posted()).is_empty());
}

#[test]
fn drafts_can_be_patched_but_posted_journals_cannot() {
    let mut manager = manager();
    let id = manager.create_journal(fee_input(40.0), CreateOptions::default()).unwrap();
    let patch = JournalPatch {
        description: Some("Parking fee, unit 4B".into()),
        ..JournalPatch::default()
    };
    manager.update_journal(id, patch.clone()).unwrap();
    assert_eq!(manager.journal(id).unwrap().description, "Parking fee, unit 4B");

    manager.post_journal_by_id(id).unwrap();
    assert!(matches!(
        manager.update_journal(id, patch),
        Err(LedgerError::State(_))
    ));
    assert!(matches!(manager.delete_journal(id), Err(LedgerError::State(_))));
}

#[test]
fn approval_requires_submission() {
    let mut manager = manager();
    let id = manager.create_journal(fee_input(60.0), CreateOptions::default()).unwrap();
    assert!(matches!(
        manager.approve_journal(id, "treasurer"),
        Err(LedgerError::State(_))
    ));
    manager.submit_journal(id).unwrap();
    let journal = manager.approve_journal(id, "treasurer").unwrap();
    assert_eq!(journal.status, JournalStatus::Posted);
    assert_eq!(journal.posted_by.as_deref(), Some("treasurer"));
}

#[test]
fn cancelling_a_posted_journal_reverses_its_effects() {
    let mut manager = manager();
    manager
        .register_unit_owner(UnitOwner {
            code: "U-101".into(),
            name: "Kim".into(),
            unit: Some("101".into()),
            attributes: Default::default(),
        })
        .unwrap();
    let txn = unpaid_income("5101", 300.0, date(2024, 6, 1)).with_auxiliary("U-101");
    let id = manager.create_from_transaction(&txn, true).unwrap();
    assert_eq!(manager.auxiliary_balance("1301", "U-101").unwrap(), 300.0);

    assert!(matches!(
        manager.cancel_journal(id, "  "),
        Err(LedgerError::Validation(_))
    ));
    let cancelled = manager.cancel_journal(id, "billed twice").unwrap();
    assert_eq!(cancelled.status, JournalStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("billed twice"));

    assert_eq!(manager.auxiliary_balance("1301", "U-101").unwrap(), 0.0);
    assert_eq!(manager.division_balance(OPERATING_DIVISION).unwrap(), 0.0);
    let trial = manager.trial_balance(DateRange::all(), None).unwrap();
    assert!(trial.rows.is_empty());

    assert!(matches!(
        manager.cancel_journal(id, "again"),
        Err(LedgerError::State(_))
    ));
}

#[test]
fn unknown_journal_is_not_found() {
    let mut manager = manager();
    let err = manager.post_journal_by_id(uuid::Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, LedgerError::JournalNotFound(_)));
}

#[test]
fn unregistered_auxiliary_code_blocks_posting() {
    let mut manager = manager();
    let txn = unpaid_income("5101", 120.0, date(2024, 6, 2)).with_auxiliary("U-404");
    let err = manager.create_from_transaction(&txn, true).unwrap_err();
    assert!(err.to_string().contains("U-404"), "{err}");
    assert_eq!(manager.ledger().journal_count(), 0);
}
