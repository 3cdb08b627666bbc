//! Rule-driven translation of business transactions into journal drafts.

use crate::config::DefaultAccounts;
use crate::core::services::AccountService;
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    Account, JournalGenerationRule, JournalInput, JournalLine, Ledger, PaymentStatus, SidePattern,
    Transaction, TransactionType,
};

pub struct GeneratorService;

impl GeneratorService {
    /// Builds a two-line draft from the highest-priority matching rule.
    pub fn generate_journal(
        ledger: &Ledger,
        defaults: &DefaultAccounts,
        txn: &Transaction,
    ) -> Result<JournalInput> {
        validate_transaction(txn)?;
        let rule = Self::select_rule(ledger, txn)?;
        let debit = resolve_side(ledger, defaults, &rule.pattern.debit, txn, "debit")?;
        let credit = resolve_side(ledger, defaults, &rule.pattern.credit, txn, "credit")?;
        tracing::debug!(
            rule = %rule.id,
            debit = %debit.code,
            credit = %credit.code,
            "journal generated from transaction"
        );
        Ok(build_input(txn, debit, credit, defaults))
    }

    /// Settles an unpaid income or expense through `payment_account`.
    pub fn generate_payment_journal(
        ledger: &Ledger,
        defaults: &DefaultAccounts,
        txn: &Transaction,
        payment_account: &str,
    ) -> Result<JournalInput> {
        validate_transaction(txn)?;
        if txn.status != PaymentStatus::Unpaid {
            return Err(LedgerError::invalid(format!(
                "only unpaid transactions can be settled, got a {} {}",
                txn.status, txn.transaction_type
            )));
        }
        let payment = AccountService::postable(ledger, payment_account)?;
        let (debit, credit) = match txn.transaction_type {
            TransactionType::Income => {
                (payment, AccountService::postable(ledger, &defaults.receivable)?)
            }
            TransactionType::Expense => {
                (AccountService::postable(ledger, &defaults.payable)?, payment)
            }
            TransactionType::Transfer => {
                return Err(LedgerError::invalid(
                    "transfers are settled when they are recorded",
                ))
            }
        };
        Ok(build_input(txn, debit, credit, defaults))
    }

    /// Active rules are kept sorted, so the first match wins.
    pub fn select_rule<'a>(ledger: &'a Ledger, txn: &Transaction) -> Result<&'a JournalGenerationRule> {
        ledger
            .rules
            .iter()
            .find(|rule| rule.applies_to(txn))
            .ok_or_else(|| LedgerError::RuleNotFound(txn.describe()))
    }

    pub fn rules(ledger: &Ledger) -> &[JournalGenerationRule] {
        &ledger.rules
    }

    pub fn add_rule(ledger: &mut Ledger, rule: JournalGenerationRule) -> Result<()> {
        if rule.id.trim().is_empty() {
            return Err(LedgerError::invalid("rule id is required"));
        }
        if ledger.rules.iter().any(|existing| existing.id == rule.id) {
            return Err(LedgerError::invalid(format!(
                "rule {} is already registered",
                rule.id
            )));
        }
        let mut rule = rule;
        rule.sequence = next_sequence(&ledger.rules);
        ledger.rules.push(rule);
        sort_rules(&mut ledger.rules);
        ledger.touch();
        Ok(())
    }

    /// Replaces a rule; it keeps its registration order for tie-breaks.
    pub fn update_rule(ledger: &mut Ledger, rule: JournalGenerationRule) -> Result<()> {
        let slot = ledger
            .rules
            .iter_mut()
            .find(|existing| existing.id == rule.id)
            .ok_or_else(|| LedgerError::RuleNotFound(rule.id.clone()))?;
        let sequence = slot.sequence;
        *slot = JournalGenerationRule { sequence, ..rule };
        sort_rules(&mut ledger.rules);
        ledger.touch();
        Ok(())
    }

    pub fn remove_rule(ledger: &mut Ledger, id: &str) -> Result<JournalGenerationRule> {
        let idx = ledger
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| LedgerError::RuleNotFound(id.to_string()))?;
        let removed = ledger.rules.remove(idx);
        ledger.touch();
        Ok(removed)
    }
}

/// Highest priority first; equal priorities go by registration order.
pub(crate) fn sort_rules(rules: &mut [JournalGenerationRule]) {
    rules.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
}

fn next_sequence(rules: &[JournalGenerationRule]) -> u64 {
    rules.iter().map(|rule| rule.sequence).max().unwrap_or(0) + 1
}

fn validate_transaction(txn: &Transaction) -> Result<()> {
    let mut errors = Vec::new();
    if !txn.amount.is_finite() || txn.amount <= 0.0 {
        errors.push("transaction amount must be positive".to_string());
    }
    if txn.account_code.trim().is_empty() {
        errors.push("transaction account is required".to_string());
    }
    if txn.division_code.trim().is_empty() {
        errors.push("transaction division is required".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(errors))
    }
}

fn resolve_side<'a>(
    ledger: &'a Ledger,
    defaults: &DefaultAccounts,
    pattern: &SidePattern,
    txn: &Transaction,
    side: &str,
) -> Result<&'a Account> {
    let code = if let Some(code) = pattern.account_code.as_deref() {
        code
    } else if pattern.use_transaction_account {
        txn.account_code.as_str()
    } else if let Some(code) = pattern
        .use_payment_account
        .then_some(txn.payment_account_code.as_deref())
        .flatten()
    {
        code
    } else if let Some(named) = pattern.default_account {
        defaults.code(named)
    } else {
        return Err(LedgerError::AccountNotFound(format!(
            "rule pattern resolves no {side} account for {}",
            txn.describe()
        )));
    };
    AccountService::postable(ledger, code)
}

fn build_input(
    txn: &Transaction,
    debit: &Account,
    credit: &Account,
    defaults: &DefaultAccounts,
) -> JournalInput {
    let mut description = format!("{} / {}", debit.name, credit.name);
    if let Some(note) = txn.note.as_deref().filter(|note| !note.trim().is_empty()) {
        description.push_str(" - ");
        description.push_str(note.trim());
    }
    let mut debit_line = JournalLine::debit(debit.code.clone(), txn.amount);
    let mut credit_line = JournalLine::credit(credit.code.clone(), txn.amount);
    if let Some(aux) = txn.auxiliary_code.as_deref() {
        if debit.code == defaults.receivable || debit.code == defaults.payable {
            debit_line = debit_line.with_auxiliary(aux);
        }
        if credit.code == defaults.receivable || credit.code == defaults.payable {
            credit_line = credit_line.with_auxiliary(aux);
        }
    }
    JournalInput::new(txn.date, description, txn.division_code.clone())
        .line(debit_line)
        .line(credit_line)
}
