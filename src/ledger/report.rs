//! Statement shapes produced by the reporting service.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::account::{AccountType, NormalBalance};

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeError {
    InvalidRange,
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::InvalidRange => f.write_str("date range end must not precede start"),
        }
    }
}

impl std::error::Error for DateRangeError {}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DateRangeError> {
        if to < from {
            return Err(DateRangeError::InvalidRange);
        }
        Ok(Self { from, to })
    }

    /// Everything up to and including `as_of`.
    pub fn through(as_of: NaiveDate) -> Self {
        Self {
            from: NaiveDate::MIN,
            to: as_of,
        }
    }

    pub fn all() -> Self {
        Self {
            from: NaiveDate::MIN,
            to: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    pub debit_total: f64,
    pub credit_total: f64,
    pub balance: f64,
}

/// Aggregate of every postable descendant of a rollup account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollupRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub depth: usize,
    pub debit_total: f64,
    pub credit_total: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalance {
    pub range: DateRange,
    #[serde(default)]
    pub division: Option<String>,
    pub rows: Vec<TrialBalanceRow>,
    #[serde(default)]
    pub rollups: Vec<RollupRow>,
    pub total_debit: f64,
    pub total_credit: f64,
    pub is_balanced: bool,
}

impl TrialBalance {
    pub fn row(&self, code: &str) -> Option<&TrialBalanceRow> {
        self.rows.iter().find(|row| row.account_code == code)
    }

    pub fn rows_of(&self, account_type: AccountType) -> impl Iterator<Item = &TrialBalanceRow> {
        self.rows
            .iter()
            .filter(move |row| row.account_type == account_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementLine {
    pub account_code: String,
    pub account_name: String,
    pub amount: f64,
}

impl From<&TrialBalanceRow> for StatementLine {
    fn from(row: &TrialBalanceRow) -> Self {
        Self {
            account_code: row.account_code.clone(),
            account_name: row.account_name.clone(),
            amount: row.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeStatement {
    pub range: DateRange,
    #[serde(default)]
    pub division: Option<String>,
    pub revenues: Vec<StatementLine>,
    pub expenses: Vec<StatementLine>,
    pub total_revenue: f64,
    pub total_expense: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    #[serde(default)]
    pub division: Option<String>,
    pub assets: Vec<StatementLine>,
    pub liabilities: Vec<StatementLine>,
    pub equity: Vec<StatementLine>,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    /// Revenue minus expense not yet closed into equity.
    pub net_income_to_date: f64,
    pub total_liabilities_and_equity: f64,
    pub difference: f64,
    pub is_balanced: bool,
}

/// Per-account trace used to locate sign or statement errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheetDebugRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    pub debit_total: f64,
    pub credit_total: f64,
    /// Raw debit minus credit.
    pub calculated: f64,
    /// Amount shown on the statement after the sign rule.
    pub displayed: f64,
    pub sign_consistent: bool,
}
