//! Ledger domain models, persistence-friendly types, and helpers.

pub mod account;
pub mod auxiliary;
pub mod division;
pub mod journal;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod report;
pub mod rule;
pub mod transaction;

pub use account::{Account, AccountType, NormalBalance, COMMON_DIVISION};
pub use auxiliary::{AuxiliaryLedger, AuxiliaryReport, AuxiliaryTransaction};
pub use division::{Division, DivisionTransaction, OPERATING_DIVISION, RESERVE_DIVISION};
pub use journal::{
    amounts_equal, Journal, JournalInput, JournalLine, JournalPatch, JournalSequence,
    JournalStatus, BALANCE_TOLERANCE,
};
pub use ledger::{Ledger, UnitOwner, Vendor, CURRENT_SCHEMA_VERSION};
pub use report::{
    BalanceSheet, BalanceSheetDebugRow, DateRange, IncomeStatement, RollupRow, StatementLine,
    TrialBalance, TrialBalanceRow,
};
pub use rule::{
    AmountRange, DefaultAccount, JournalGenerationRule, JournalPattern, RuleCondition,
    SidePattern,
};
pub use transaction::{PaymentStatus, Transaction, TransactionType};
