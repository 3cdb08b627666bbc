//! Journal book: numbering, draft edits, and the posting lifecycle.
//!
//! Posting is the only place where division and auxiliary read-models change.
//! Every precondition is checked before the first mutation so a rejected post
//! leaves the ledger untouched.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::core::services::{AuxiliaryPosting, AuxiliaryService, DivisionService};
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    AccountType, DateRange, DivisionTransaction, Journal, JournalInput, JournalLine, JournalPatch,
    JournalStatus, Ledger, COMMON_DIVISION,
};

/// Optional predicates for [`JournalService::list`].
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub status: Option<JournalStatus>,
    pub division: Option<String>,
    pub range: Option<DateRange>,
}

impl JournalFilter {
    pub fn posted() -> Self {
        Self {
            status: Some(JournalStatus::Posted),
            ..Self::default()
        }
    }

    fn matches(&self, journal: &Journal) -> bool {
        self.status.map_or(true, |status| journal.status == status)
            && self
                .division
                .as_deref()
                .map_or(true, |division| journal.division.as_deref() == Some(division))
            && self.range.map_or(true, |range| {
                journal.date.map_or(false, |date| range.contains(date))
            })
    }
}

pub struct JournalService;

impl JournalService {
    /// Creates a draft numbered from the ledger's own sequence.
    pub fn create(ledger: &mut Ledger, input: JournalInput) -> Result<Uuid> {
        let number = ledger.sequence.allocate();
        tracing::debug!(%number, "journal number allocated");
        Ok(Self::insert(ledger, Journal::create(input, number)))
    }

    /// Creates a draft under an externally assigned number.
    pub fn create_with_number(ledger: &mut Ledger, input: JournalInput, number: &str) -> Result<Uuid> {
        if number.trim().is_empty() {
            return Self::create(ledger, input);
        }
        if ledger.journal_by_number(number).is_some() {
            return Err(LedgerError::invalid(format!(
                "journal number {number} is already in use"
            )));
        }
        ledger.sequence.observe(number);
        Ok(Self::insert(ledger, Journal::create(input, number)))
    }

    fn insert(ledger: &mut Ledger, journal: Journal) -> Uuid {
        let id = journal.id;
        ledger.journals.push(journal);
        ledger.touch();
        id
    }

    pub fn get(ledger: &Ledger, id: Uuid) -> Result<&Journal> {
        ledger.journal(id).ok_or(LedgerError::JournalNotFound(id))
    }

    fn position(ledger: &Ledger, id: Uuid) -> Result<usize> {
        ledger
            .journals
            .iter()
            .position(|journal| journal.id == id)
            .ok_or(LedgerError::JournalNotFound(id))
    }

    fn replace(ledger: &mut Ledger, journal: Journal) -> Result<&Journal> {
        let idx = Self::position(ledger, journal.id)?;
        ledger.journals[idx] = journal;
        ledger.touch();
        Ok(&ledger.journals[idx])
    }

    /// Matching journals ordered by date, then number; undated drafts sort first.
    pub fn list<'a>(ledger: &'a Ledger, filter: &JournalFilter) -> Vec<&'a Journal> {
        let mut journals: Vec<&Journal> = ledger
            .journals
            .iter()
            .filter(|journal| filter.matches(journal))
            .collect();
        journals.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.journal_number.cmp(&b.journal_number))
        });
        journals
    }

    pub fn update(ledger: &mut Ledger, id: Uuid, patch: JournalPatch) -> Result<&Journal> {
        let updated = Self::get(ledger, id)?.apply_patch(patch)?;
        Self::replace(ledger, updated)
    }

    pub fn update_lines(ledger: &mut Ledger, id: Uuid, lines: Vec<JournalLine>) -> Result<&Journal> {
        let updated = Self::get(ledger, id)?.update_lines(lines)?;
        Self::replace(ledger, updated)
    }

    /// Drafts only; posted history is cancelled, never deleted.
    pub fn delete(ledger: &mut Ledger, id: Uuid) -> Result<Journal> {
        let idx = Self::position(ledger, id)?;
        let journal = &ledger.journals[idx];
        if !journal.is_draft() {
            return Err(LedgerError::State(format!(
                "journal {} is {} and cannot be deleted",
                journal.journal_number, journal.status
            )));
        }
        let removed = ledger.journals.remove(idx);
        ledger.touch();
        Ok(removed)
    }

    /// Structural checks plus directory lookups; an empty list means postable.
    pub fn check(ledger: &Ledger, journal: &Journal) -> Vec<String> {
        let mut errors = journal.validate();
        errors.extend(Self::check_references(ledger, journal));
        errors
    }

    fn check_references(ledger: &Ledger, journal: &Journal) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(division) = journal.division.as_deref() {
            if ledger.division(division).is_none() {
                errors.push(format!("division {division} does not exist"));
            }
        }
        for line in &journal.lines {
            let Some(account) = ledger.account(&line.account_code) else {
                if !line.account_code.trim().is_empty() {
                    errors.push(format!("line {}: account {} does not exist", line.id, line.account_code));
                }
                continue;
            };
            if !account.is_postable {
                errors.push(format!(
                    "line {}: account {} is a group account and cannot be posted to",
                    line.id, account.code
                ));
            } else if !account.is_active {
                errors.push(format!("line {}: account {} is inactive", line.id, account.code));
            }
            if let Some(aux) = line.auxiliary_code.as_deref() {
                if !AuxiliaryService::exists(ledger, &account.code, aux) {
                    errors.push(format!(
                        "line {}: auxiliary ledger {aux} is not registered under {}",
                        line.id, account.code
                    ));
                }
            }
            if account.account_type == AccountType::Asset {
                if let Some(code) = fund_division(account.division.as_deref(), None) {
                    if ledger.division(code).is_none() {
                        errors.push(format!(
                            "line {}: account {} is tagged with unknown division {code}",
                            line.id, account.code
                        ));
                    }
                }
            }
        }
        errors
    }

    /// Marks a valid draft as ready for approval.
    pub fn submit(ledger: &mut Ledger, id: Uuid, at: DateTime<Utc>) -> Result<&Journal> {
        let journal = Self::get(ledger, id)?;
        let errors = Self::check(ledger, journal);
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }
        let submitted = journal.mark_submitted(at)?;
        Self::replace(ledger, submitted)
    }

    /// Posts a previously submitted draft.
    pub fn approve<'a>(
        ledger: &'a mut Ledger,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<&'a Journal> {
        let journal = Self::get(ledger, id)?;
        if journal.is_draft() && !journal.is_submitted() {
            return Err(LedgerError::State(format!(
                "journal {} has not been submitted for approval",
                journal.journal_number
            )));
        }
        Self::post(ledger, id, actor, at)
    }

    pub fn post<'a>(
        ledger: &'a mut Ledger,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<&'a Journal> {
        let journal = Self::get(ledger, id)?;
        let posted = journal.post(actor, at)?;
        let errors = Self::check(ledger, &posted);
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }
        let date = posted
            .date
            .ok_or_else(|| LedgerError::invalid("date is required"))?;
        apply_side_effects(ledger, &posted, date, false)?;
        tracing::info!(
            number = %posted.journal_number,
            total = posted.total_debit,
            actor,
            "journal posted"
        );
        Self::replace(ledger, posted)
    }

    /// Cancels a draft or posted journal; posted effects are reversed, not erased.
    pub fn cancel<'a>(
        ledger: &'a mut Ledger,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<&'a Journal> {
        if reason.trim().is_empty() {
            return Err(LedgerError::invalid("a cancellation reason is required"));
        }
        let journal = Self::get(ledger, id)?;
        let was_posted = journal.is_posted();
        let cancelled = journal.cancel(reason, at)?;
        if was_posted {
            let date = cancelled.date.unwrap_or_else(|| at.date_naive());
            apply_side_effects(ledger, &cancelled, date, true)?;
        }
        tracing::info!(number = %cancelled.journal_number, reason, "journal cancelled");
        Self::replace(ledger, cancelled)
    }
}

/// The account's own fund tag wins; untagged and common accounts fall back.
pub(crate) fn fund_division<'a>(tag: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    match tag {
        Some(code) if code != COMMON_DIVISION => Some(code),
        _ => fallback,
    }
}

fn apply_side_effects(ledger: &mut Ledger, journal: &Journal, date: NaiveDate, reverse: bool) -> Result<()> {
    let description = if reverse {
        format!("Reversal of {}: {}", journal.journal_number, journal.description)
    } else {
        journal.description.clone()
    };
    for line in &journal.lines {
        let is_debit = line.is_debit() != reverse;
        let amount = line.amount();
        let Some(account) = ledger.account(&line.account_code) else {
            continue;
        };
        let account_type = account.account_type;
        let division = if account_type == AccountType::Asset {
            fund_division(account.division.as_deref(), journal.division.as_deref())
                .map(str::to_string)
        } else {
            None
        };
        if let Some(code) = division {
            DivisionService::add_transaction(
                ledger,
                &code,
                DivisionTransaction {
                    journal_id: journal.id,
                    date,
                    amount,
                    is_debit,
                    account_type,
                },
            )?;
        }
        if let Some(aux) = line.auxiliary_code.as_deref() {
            let line_description = line.description.as_deref().unwrap_or(description.as_str());
            AuxiliaryService::post(
                ledger,
                &line.account_code,
                aux,
                AuxiliaryPosting {
                    amount,
                    is_debit,
                    journal_id: journal.id,
                    date,
                    description: line_description,
                },
            )?;
        }
    }
    Ok(())
}
