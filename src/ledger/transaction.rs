use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        })
    }
}

/// Pre-journal intent handed to the generator. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_type: TransactionType,
    pub account_code: String,
    pub amount: f64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_account_code: Option<String>,
    pub division_code: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub auxiliary_code: Option<String>,
}

impl Transaction {
    pub fn new(
        transaction_type: TransactionType,
        account_code: impl Into<String>,
        amount: f64,
        status: PaymentStatus,
        division_code: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            transaction_type,
            account_code: account_code.into(),
            amount,
            status,
            payment_account_code: None,
            division_code: division_code.into(),
            date,
            note: None,
            tags: Vec::new(),
            auxiliary_code: None,
        }
    }

    pub fn income(
        account_code: impl Into<String>,
        amount: f64,
        status: PaymentStatus,
        division: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self::new(
            TransactionType::Income,
            account_code,
            amount,
            status,
            division,
            date,
        )
    }

    pub fn expense(
        account_code: impl Into<String>,
        amount: f64,
        status: PaymentStatus,
        division: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self::new(
            TransactionType::Expense,
            account_code,
            amount,
            status,
            division,
            date,
        )
    }

    pub fn with_payment_account(mut self, code: impl Into<String>) -> Self {
        self.payment_account_code = Some(code.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_auxiliary(mut self, code: impl Into<String>) -> Self {
        self.auxiliary_code = Some(code.into());
        self
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} {} on {} ({:.2})",
            self.status, self.transaction_type, self.account_code, self.date, self.amount
        )
    }
}
