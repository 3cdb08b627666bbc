//! Chart-of-accounts directory: lookup, validated upserts, and tree traversal.

use std::collections::BTreeMap;

use crate::errors::{LedgerError, Result};
use crate::ledger::{Account, AccountType, Ledger};

/// Optional predicates for [`AccountService::list`].
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub division: Option<String>,
    pub parent_code: Option<String>,
    pub active_only: bool,
    pub postable_only: bool,
}

impl AccountFilter {
    pub fn postable() -> Self {
        Self {
            active_only: true,
            postable_only: true,
            ..Self::default()
        }
    }

    fn matches(&self, account: &Account) -> bool {
        self.account_type
            .map_or(true, |kind| account.account_type == kind)
            && self
                .division
                .as_deref()
                .map_or(true, |division| account.belongs_to_division(division))
            && self
                .parent_code
                .as_deref()
                .map_or(true, |parent| account.parent_code.as_deref() == Some(parent))
            && (!self.active_only || account.is_active)
            && (!self.postable_only || account.is_postable)
    }
}

pub struct AccountService;

impl AccountService {
    pub fn get<'a>(ledger: &'a Ledger, code: &str) -> Result<&'a Account> {
        ledger
            .accounts
            .get(code)
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }

    /// Resolves an account that can receive journal lines.
    pub fn postable<'a>(ledger: &'a Ledger, code: &str) -> Result<&'a Account> {
        let account = Self::get(ledger, code)?;
        if !account.is_postable || !account.is_active {
            return Err(LedgerError::AccountNotFound(format!(
                "{code} (not an active postable account)"
            )));
        }
        Ok(account)
    }

    pub fn list<'a>(ledger: &'a Ledger, filter: &AccountFilter) -> Vec<&'a Account> {
        ledger
            .accounts
            .values()
            .filter(|account| filter.matches(account))
            .collect()
    }

    pub fn upsert(ledger: &mut Ledger, account: Account) -> Result<()> {
        let errors = validate_candidate(&ledger.accounts, &account);
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }
        tracing::debug!(code = %account.code, "account upserted");
        ledger.accounts.insert(account.code.clone(), account);
        ledger.touch();
        Ok(())
    }

    pub fn set_active(ledger: &mut Ledger, code: &str, active: bool) -> Result<()> {
        let account = ledger
            .accounts
            .get_mut(code)
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        account.is_active = active;
        ledger.touch();
        Ok(())
    }

    /// Physically removes an account no journal references and no child hangs from.
    pub fn remove(ledger: &mut Ledger, code: &str) -> Result<Account> {
        Self::get(ledger, code)?;
        if ledger
            .journals
            .iter()
            .any(|journal| journal.references_account(code))
        {
            return Err(LedgerError::State(format!(
                "account {code} is referenced by journals; deactivate it instead"
            )));
        }
        if !Self::children(ledger, code).is_empty() {
            return Err(LedgerError::invalid(format!(
                "account {code} still has child accounts"
            )));
        }
        let removed = ledger
            .accounts
            .remove(code)
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        ledger.touch();
        Ok(removed)
    }

    /// Replaces the whole directory; nothing changes unless every definition is valid.
    /// Accounts referenced by journals must survive the rebuild; deactivate them instead.
    pub fn rebuild_from(ledger: &mut Ledger, definitions: Vec<Account>) -> Result<()> {
        let directory = build_directory(definitions)?;
        let mut missing: Vec<String> = Vec::new();
        for line in ledger.journals.iter().flat_map(|journal| &journal.lines) {
            if !directory.contains_key(&line.account_code) && !missing.contains(&line.account_code) {
                missing.push(line.account_code.clone());
            }
        }
        if !missing.is_empty() {
            return Err(LedgerError::Validation(
                missing
                    .into_iter()
                    .map(|code| {
                        format!("account {code} is referenced by journals and cannot be dropped")
                    })
                    .collect(),
            ));
        }
        ledger.accounts = directory;
        ledger.touch();
        tracing::info!(accounts = ledger.accounts.len(), "account directory rebuilt");
        Ok(())
    }

    pub fn calculate_balance(
        ledger: &Ledger,
        code: &str,
        debit_total: f64,
        credit_total: f64,
    ) -> Result<f64> {
        Ok(Self::get(ledger, code)?.calculate_balance(debit_total, credit_total))
    }

    pub fn is_debit_account(ledger: &Ledger, code: &str) -> Result<bool> {
        Ok(Self::get(ledger, code)?.is_debit_account())
    }

    pub fn is_credit_account(ledger: &Ledger, code: &str) -> Result<bool> {
        Ok(Self::get(ledger, code)?.is_credit_account())
    }

    pub fn belongs_to_division(ledger: &Ledger, code: &str, division: &str) -> Result<bool> {
        Ok(Self::get(ledger, code)?.belongs_to_division(division))
    }

    pub fn children<'a>(ledger: &'a Ledger, code: &str) -> Vec<&'a Account> {
        ledger
            .accounts
            .values()
            .filter(|account| account.parent_code.as_deref() == Some(code))
            .collect()
    }

    /// Parent first, root last.
    pub fn ancestors<'a>(ledger: &'a Ledger, code: &str) -> Vec<&'a Account> {
        let mut chain = Vec::new();
        let mut cursor = ledger
            .accounts
            .get(code)
            .and_then(|account| account.parent_code.as_deref());
        while let Some(parent_code) = cursor {
            let Some(parent) = ledger.accounts.get(parent_code) else {
                break;
            };
            if chain.len() > ledger.accounts.len() {
                break;
            }
            chain.push(parent);
            cursor = parent.parent_code.as_deref();
        }
        chain
    }

    pub fn depth(ledger: &Ledger, code: &str) -> usize {
        Self::ancestors(ledger, code).len()
    }
}

/// Builds a code-keyed directory and validates every entry against the full set.
pub fn build_directory(definitions: Vec<Account>) -> Result<BTreeMap<String, Account>> {
    let mut directory = BTreeMap::new();
    let mut errors = Vec::new();
    for account in definitions {
        if directory.contains_key(&account.code) {
            errors.push(format!("account {} is defined more than once", account.code));
            continue;
        }
        directory.insert(account.code.clone(), account);
    }
    for account in directory.values() {
        errors.extend(validate_candidate(&directory, account));
    }
    if errors.is_empty() {
        Ok(directory)
    } else {
        Err(LedgerError::Validation(errors))
    }
}

fn validate_candidate(directory: &BTreeMap<String, Account>, candidate: &Account) -> Vec<String> {
    let code = candidate.code.trim();
    let mut errors = Vec::new();
    if code.is_empty() {
        errors.push("account code is required".to_string());
        return errors;
    }
    if candidate.name.trim().is_empty() {
        errors.push(format!("account {code}: name is required"));
    }
    if !candidate.has_consistent_sign() {
        errors.push(format!(
            "account {code}: {} accounts carry a {} normal balance, not {}",
            candidate.account_type,
            candidate.account_type.normal_balance(),
            candidate.normal_balance
        ));
    }
    if let Some(parent_code) = candidate.parent_code.as_deref() {
        match directory.get(parent_code) {
            None => errors.push(format!(
                "account {code}: parent {parent_code} does not exist"
            )),
            Some(_) if parent_code == code => {
                errors.push(format!("account {code}: cannot be its own parent"))
            }
            Some(parent) => {
                if parent.is_postable {
                    errors.push(format!(
                        "account {code}: parent {parent_code} is postable and cannot hold children"
                    ));
                }
                if creates_cycle(directory, code, parent_code) {
                    errors.push(format!(
                        "account {code}: parent chain through {parent_code} forms a cycle"
                    ));
                }
            }
        }
    }
    if candidate.is_postable
        && directory
            .values()
            .any(|other| other.code != code && other.parent_code.as_deref() == Some(code))
    {
        errors.push(format!(
            "account {code}: accounts with children cannot be postable"
        ));
    }
    errors
}

fn creates_cycle(directory: &BTreeMap<String, Account>, code: &str, parent_code: &str) -> bool {
    let mut cursor = Some(parent_code);
    let mut steps = 0usize;
    while let Some(current) = cursor {
        if current == code {
            return true;
        }
        steps += 1;
        if steps > directory.len() {
            return true;
        }
        cursor = directory
            .get(current)
            .and_then(|account| account.parent_code.as_deref());
    }
    false
}
