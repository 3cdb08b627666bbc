//! Boundary records exchanged with import, export, and classification collaborators.

pub mod csv;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{
    Division, Journal, JournalInput, JournalLine, JournalStatus, PaymentStatus, TransactionType,
    TrialBalance, UnitOwner, Vendor,
};

/// JSON import document; absent collections are treated as empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[serde(default)]
    pub clear_existing: bool,
    #[serde(default)]
    pub journals: Vec<ImportJournal>,
    #[serde(default)]
    pub unit_owners: Vec<UnitOwner>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub opening_balances: Option<OpeningBalances>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportJournal {
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    /// Drafts stay drafts; `POSTED` journals are posted on import.
    #[serde(default)]
    pub status: Option<JournalStatus>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub details: Vec<ImportLine>,
}

impl ImportJournal {
    pub fn to_input(&self, fallback_division: &str) -> JournalInput {
        JournalInput {
            date: Some(self.date),
            description: self.description.clone(),
            division: Some(
                self.division
                    .clone()
                    .unwrap_or_else(|| fallback_division.to_string()),
            ),
            reference: self.reference.clone(),
            lines: self.details.iter().map(ImportLine::to_line).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportLine {
    pub account_code: String,
    #[serde(default)]
    pub debit_amount: f64,
    #[serde(default)]
    pub credit_amount: f64,
    #[serde(default)]
    pub auxiliary_code: Option<String>,
    #[serde(default)]
    pub service_month: Option<String>,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImportLine {
    pub fn to_line(&self) -> JournalLine {
        JournalLine {
            id: 0,
            account_code: self.account_code.clone(),
            debit_amount: self.debit_amount,
            credit_amount: self.credit_amount,
            auxiliary_code: self.auxiliary_code.clone(),
            service_month: self.service_month.clone(),
            payer_id: self.payer_id.clone(),
            description: self.description.clone(),
        }
    }
}

impl From<&JournalLine> for ImportLine {
    fn from(line: &JournalLine) -> Self {
        Self {
            account_code: line.account_code.clone(),
            debit_amount: line.debit_amount,
            credit_amount: line.credit_amount,
            auxiliary_code: line.auxiliary_code.clone(),
            service_month: line.service_month.clone(),
            payer_id: line.payer_id.clone(),
            description: line.description.clone(),
        }
    }
}

/// Opening position booked as one posted journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningBalances {
    pub date: NaiveDate,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub entries: Vec<OpeningEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningEntry {
    pub account_code: String,
    #[serde(default)]
    pub debit_amount: Option<f64>,
    #[serde(default)]
    pub credit_amount: Option<f64>,
}

impl OpeningBalances {
    pub fn to_input(&self, fallback_division: &str) -> JournalInput {
        let mut input = JournalInput::new(
            self.date,
            "Opening balances",
            self.division.as_deref().unwrap_or(fallback_division),
        );
        input.lines = self
            .entries
            .iter()
            .map(|entry| JournalLine {
                account_code: entry.account_code.clone(),
                debit_amount: entry.debit_amount.unwrap_or_default(),
                credit_amount: entry.credit_amount.unwrap_or_default(),
                ..JournalLine::default()
            })
            .collect();
        input
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub export_date: DateTime<Utc>,
    pub journals: Vec<Journal>,
    pub unit_owners: Vec<UnitOwner>,
    pub vendors: Vec<Vendor>,
    /// Absent when the posted book fails its consistency check.
    pub trial_balance: Option<TrialBalance>,
    pub divisions: Vec<Division>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub journals_created: usize,
    pub journals_posted: usize,
    pub unit_owners: usize,
    pub vendors: usize,
    pub opening_balance_journal: Option<String>,
}

/// Unvalidated suggestion from an external classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationHint {
    pub description: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub debit_account: String,
    pub credit_account: String,
    pub confidence: f64,
    #[serde(default)]
    pub division: Option<String>,
}

impl ClassificationHint {
    pub fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.confidence) {
            errors.push(format!(
                "confidence {} must lie between 0 and 1",
                self.confidence
            ));
        }
        if self.debit_account == self.credit_account {
            errors.push("debit and credit candidates must differ".to_string());
        }
        errors
    }

    pub fn to_input(&self, fallback_division: &str) -> JournalInput {
        JournalInput::new(
            self.date,
            self.description.clone(),
            self.division.as_deref().unwrap_or(fallback_division),
        )
        .line(JournalLine::debit(self.debit_account.clone(), self.amount))
        .line(JournalLine::credit(self.credit_account.clone(), self.amount))
    }
}

/// One parsed row of a bank statement or spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabularRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// Transaction shape shared by every row of one bulk import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowTemplate {
    pub transaction_type: TransactionType,
    pub account_code: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_account_code: Option<String>,
    pub division_code: String,
}
