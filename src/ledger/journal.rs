use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

/// Largest debit/credit difference still treated as balanced.
pub const BALANCE_TOLERANCE: f64 = 0.01;

pub fn amounts_equal(left: f64, right: f64) -> bool {
    (left - right).abs() < BALANCE_TOLERANCE
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalStatus {
    #[default]
    #[serde(alias = "draft", alias = "Draft")]
    Draft,
    #[serde(alias = "posted", alias = "Posted")]
    Posted,
    #[serde(alias = "cancelled", alias = "Cancelled", alias = "canceled")]
    Cancelled,
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JournalStatus::Draft => "DRAFT",
            JournalStatus::Posted => "POSTED",
            JournalStatus::Cancelled => "CANCELLED",
        })
    }
}

impl JournalStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(JournalStatus::Draft),
            "POSTED" => Some(JournalStatus::Posted),
            "CANCELLED" | "CANCELED" => Some(JournalStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JournalLine {
    #[serde(default)]
    pub id: u32,
    pub account_code: String,
    #[serde(default)]
    pub debit_amount: f64,
    #[serde(default)]
    pub credit_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount: f64) -> Self {
        Self {
            account_code: account_code.into(),
            debit_amount: amount,
            ..Self::default()
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: f64) -> Self {
        Self {
            account_code: account_code.into(),
            credit_amount: amount,
            ..Self::default()
        }
    }

    pub fn with_auxiliary(mut self, code: impl Into<String>) -> Self {
        self.auxiliary_code = Some(code.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_debit(&self) -> bool {
        self.debit_amount > 0.0
    }

    /// The non-zero side of the line.
    pub fn amount(&self) -> f64 {
        if self.is_debit() {
            self.debit_amount
        } else {
            self.credit_amount
        }
    }

    fn problems(&self, position: usize) -> Vec<String> {
        let mut errors = Vec::new();
        if self.account_code.trim().is_empty() {
            errors.push(format!("line {position}: account code is required"));
        }
        if self.debit_amount < 0.0 || self.credit_amount < 0.0 {
            errors.push(format!("line {position}: amounts cannot be negative"));
        } else if self.debit_amount > 0.0 && self.credit_amount > 0.0 {
            errors.push(format!(
                "line {position}: debit and credit cannot both be set"
            ));
        } else if self.debit_amount <= 0.0 && self.credit_amount <= 0.0 {
            errors.push(format!("line {position}: amount must be positive"));
        }
        errors
    }
}

/// Caller-supplied data for a new journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JournalInput {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<JournalLine>,
}

impl JournalInput {
    pub fn new(date: NaiveDate, description: impl Into<String>, division: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            description: description.into(),
            division: Some(division.into()),
            reference: None,
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }
}

/// Partial update applied to a draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalPatch {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub division: Option<String>,
    pub reference: Option<String>,
    pub lines: Option<Vec<JournalLine>>,
}

/// Monotonic journal number allocator owned by one ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalSequence {
    pub prefix: String,
    pub width: usize,
    pub next: u64,
}

impl Default for JournalSequence {
    fn default() -> Self {
        Self::new("JV", 6)
    }
}

impl JournalSequence {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width: width.max(1),
            next: 1,
        }
    }

    pub fn allocate(&mut self) -> String {
        let number = self.format(self.next);
        self.next += 1;
        number
    }

    pub fn format(&self, value: u64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.width)
    }

    /// Moves the counter past an externally assigned number with our prefix.
    pub fn observe(&mut self, number: &str) {
        let Some(rest) = number.strip_prefix(self.prefix.as_str()) else {
            return;
        };
        if let Ok(value) = rest.parse::<u64>() {
            if value >= self.next {
                self.next = value + 1;
            }
        }
    }
}

/// The unit of truth: a dated, balanced set of lines with a lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Journal {
    pub id: Uuid,
    pub journal_number: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub status: JournalStatus,
    pub lines: Vec<JournalLine>,
    pub total_debit: f64,
    pub total_credit: f64,
    pub is_balanced: bool,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Journal {
    /// Builds a draft from `input`, numbering lines from 1.
    pub fn create(input: JournalInput, journal_number: impl Into<String>) -> Self {
        let mut journal = Self {
            id: Uuid::new_v4(),
            journal_number: journal_number.into(),
            date: input.date,
            description: input.description,
            division: input.division.filter(|code| !code.trim().is_empty()),
            reference: input.reference,
            status: JournalStatus::Draft,
            lines: Vec::new(),
            total_debit: 0.0,
            total_credit: 0.0,
            is_balanced: true,
            meta: BTreeMap::new(),
            created_at: Utc::now(),
            submitted_at: None,
            posted_at: None,
            posted_by: None,
            cancelled_at: None,
            cancel_reason: None,
        };
        journal.set_lines(input.lines);
        journal
    }

    fn set_lines(&mut self, lines: Vec<JournalLine>) {
        self.lines = lines
            .into_iter()
            .enumerate()
            .map(|(idx, mut line)| {
                line.id = idx as u32 + 1;
                line
            })
            .collect();
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.total_debit = self.lines.iter().map(|line| line.debit_amount).sum();
        self.total_credit = self.lines.iter().map(|line| line.credit_amount).sum();
        self.is_balanced = amounts_equal(self.total_debit, self.total_credit);
    }

    pub fn is_draft(&self) -> bool {
        self.status == JournalStatus::Draft
    }

    pub fn is_posted(&self) -> bool {
        self.status == JournalStatus::Posted
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn references_account(&self, code: &str) -> bool {
        self.lines.iter().any(|line| line.account_code == code)
    }

    /// Non-throwing structural validation; an empty list means postable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.date.is_none() {
            errors.push("date is required".to_string());
        }
        if self.division.is_none() {
            errors.push("division is required".to_string());
        }
        if self.lines.len() < 2 {
            errors.push("a journal needs at least two lines".to_string());
        }
        for (idx, line) in self.lines.iter().enumerate() {
            errors.extend(line.problems(idx + 1));
        }
        if !self.is_balanced {
            errors.push(format!(
                "journal is not balanced: debit {:.2} vs credit {:.2}",
                self.total_debit, self.total_credit
            ));
        }
        errors
    }

    pub fn post(&self, actor: &str, at: DateTime<Utc>) -> Result<Journal> {
        if self.status != JournalStatus::Draft {
            return Err(LedgerError::State(format!(
                "journal {} is {} and cannot be posted",
                self.journal_number, self.status
            )));
        }
        if !self.is_balanced {
            return Err(LedgerError::State(format!(
                "journal {} is not balanced and cannot be posted",
                self.journal_number
            )));
        }
        let mut posted = self.clone();
        posted.status = JournalStatus::Posted;
        posted.posted_at = Some(at);
        posted.posted_by = Some(actor.to_string());
        Ok(posted)
    }

    pub fn cancel(&self, reason: &str, at: DateTime<Utc>) -> Result<Journal> {
        if self.status == JournalStatus::Cancelled {
            return Err(LedgerError::State(format!(
                "journal {} is already cancelled",
                self.journal_number
            )));
        }
        let mut cancelled = self.clone();
        cancelled.status = JournalStatus::Cancelled;
        cancelled.cancel_reason = Some(reason.to_string());
        cancelled.cancelled_at = Some(at);
        Ok(cancelled)
    }

    pub fn update_lines(&self, lines: Vec<JournalLine>) -> Result<Journal> {
        self.ensure_draft("edited")?;
        let mut updated = self.clone();
        updated.set_lines(lines);
        updated.submitted_at = None;
        Ok(updated)
    }

    pub fn apply_patch(&self, patch: JournalPatch) -> Result<Journal> {
        self.ensure_draft("edited")?;
        let mut updated = match patch.lines {
            Some(lines) => self.update_lines(lines)?,
            None => self.clone(),
        };
        if let Some(date) = patch.date {
            updated.date = Some(date);
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(division) = patch.division {
            updated.division = Some(division).filter(|code| !code.trim().is_empty());
        }
        if let Some(reference) = patch.reference {
            updated.reference = Some(reference);
        }
        updated.submitted_at = None;
        Ok(updated)
    }

    pub fn mark_submitted(&self, at: DateTime<Utc>) -> Result<Journal> {
        self.ensure_draft("submitted")?;
        let mut submitted = self.clone();
        submitted.submitted_at = Some(at);
        Ok(submitted)
    }

    fn ensure_draft(&self, action: &str) -> Result<()> {
        if self.status == JournalStatus::Draft {
            Ok(())
        } else {
            Err(LedgerError::State(format!(
                "journal {} is {} and cannot be {action}",
                self.journal_number, self.status
            )))
        }
    }
}
