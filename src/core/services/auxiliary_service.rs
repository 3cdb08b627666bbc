use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::services::AccountService;
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    AuxiliaryLedger, AuxiliaryReport, AuxiliaryTransaction, DateRange, Ledger,
};

/// One auxiliary posting derived from a journal line.
#[derive(Debug, Clone)]
pub struct AuxiliaryPosting<'a> {
    pub amount: f64,
    pub is_debit: bool,
    pub journal_id: Uuid,
    pub date: NaiveDate,
    pub description: &'a str,
}

/// Sub-ledgers that track one entity's share of a master account.
pub struct AuxiliaryService;

impl AuxiliaryService {
    /// Opens a sub-ledger, or renames it when it already exists.
    pub fn register(ledger: &mut Ledger, master: &str, code: &str, name: &str) -> Result<()> {
        let normal_balance = AccountService::get(ledger, master)?.normal_balance;
        if code.trim().is_empty() {
            return Err(LedgerError::invalid("auxiliary code is required"));
        }
        match Self::find_mut(ledger, master, code) {
            Some(existing) => existing.name = name.to_string(),
            None => ledger.auxiliary_ledgers.push(AuxiliaryLedger::new(
                master,
                code,
                name,
                normal_balance,
            )),
        }
        ledger.touch();
        Ok(())
    }

    pub fn get<'a>(ledger: &'a Ledger, master: &str, code: &str) -> Result<&'a AuxiliaryLedger> {
        ledger
            .auxiliary_ledgers
            .iter()
            .find(|aux| aux.matches(master, code))
            .ok_or_else(|| not_found(master, code))
    }

    fn find_mut<'a>(
        ledger: &'a mut Ledger,
        master: &str,
        code: &str,
    ) -> Option<&'a mut AuxiliaryLedger> {
        ledger
            .auxiliary_ledgers
            .iter_mut()
            .find(|aux| aux.matches(master, code))
    }

    pub fn exists(ledger: &Ledger, master: &str, code: &str) -> bool {
        Self::get(ledger, master, code).is_ok()
    }

    pub fn list_for<'a>(ledger: &'a Ledger, master: &str) -> Vec<&'a AuxiliaryLedger> {
        ledger
            .auxiliary_ledgers
            .iter()
            .filter(|aux| aux.master_account_code == master)
            .collect()
    }

    pub fn balance(ledger: &Ledger, master: &str, code: &str) -> Result<f64> {
        Ok(Self::get(ledger, master, code)?.balance)
    }

    /// Records one entry; callers drive this only from posted journal lines.
    pub fn post(
        ledger: &mut Ledger,
        master: &str,
        code: &str,
        posting: AuxiliaryPosting<'_>,
    ) -> Result<f64> {
        let aux = Self::find_mut(ledger, master, code).ok_or_else(|| not_found(master, code))?;
        aux.insert(AuxiliaryTransaction {
            date: posting.date,
            amount: posting.amount,
            is_debit: posting.is_debit,
            journal_id: posting.journal_id,
            description: posting.description.to_string(),
            balance_after: 0.0,
        });
        Ok(aux.balance)
    }

    pub fn set_attribute(
        ledger: &mut Ledger,
        master: &str,
        code: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let aux = Self::find_mut(ledger, master, code).ok_or_else(|| not_found(master, code))?;
        aux.attributes.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Replays entries in date order, splitting them at `range.from`.
    pub fn report(
        ledger: &Ledger,
        master: &str,
        code: &str,
        range: DateRange,
    ) -> Result<AuxiliaryReport> {
        let aux = Self::get(ledger, master, code)?;
        let mut entries: Vec<&AuxiliaryTransaction> = aux.transactions.iter().collect();
        entries.sort_by_key(|entry| entry.date);

        let mut opening = 0.0;
        let mut total_debit = 0.0;
        let mut total_credit = 0.0;
        let mut in_range = Vec::new();
        for entry in entries {
            if entry.date < range.from {
                opening += aux.normal_balance.signed(entry.amount, entry.is_debit);
            } else if entry.date <= range.to {
                if entry.is_debit {
                    total_debit += entry.amount;
                } else {
                    total_credit += entry.amount;
                }
                in_range.push(entry.clone());
            }
        }
        let closing = opening + aux.normal_balance.balance(total_debit, total_credit);
        Ok(AuxiliaryReport {
            master_account_code: aux.master_account_code.clone(),
            auxiliary_code: aux.auxiliary_code.clone(),
            name: aux.name.clone(),
            date_from: range.from,
            date_to: range.to,
            opening_balance: opening,
            total_debit,
            total_credit,
            closing_balance: closing,
            transactions: in_range,
        })
    }

    pub fn clear_transactions(ledger: &mut Ledger) {
        for aux in &mut ledger.auxiliary_ledgers {
            aux.clear_transactions();
        }
    }
}

fn not_found(master: &str, code: &str) -> LedgerError {
    LedgerError::AuxiliaryNotFound {
        master: master.to_string(),
        code: code.to_string(),
    }
}
