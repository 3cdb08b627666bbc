use crate::core::seed;
use crate::errors::{LedgerError, Result};
use crate::ledger::{Division, DivisionTransaction, Ledger};

/// Division registry: fund partitions, transfer rules, and running balances.
pub struct DivisionService;

impl DivisionService {
    /// Seeds the fixed division set when the ledger has none yet.
    pub fn initialize(ledger: &mut Ledger) {
        if ledger.divisions.is_empty() {
            ledger.divisions = seed::standard_divisions();
            ledger.touch();
        }
    }

    /// Restores the seeded divisions, dropping limits and recorded transactions.
    pub fn reset(ledger: &mut Ledger) {
        ledger.divisions = seed::standard_divisions();
        ledger.touch();
    }

    pub fn get<'a>(ledger: &'a Ledger, code: &str) -> Result<&'a Division> {
        ledger
            .division(code)
            .ok_or_else(|| LedgerError::DivisionNotFound(code.to_string()))
    }

    fn get_mut<'a>(ledger: &'a mut Ledger, code: &str) -> Result<&'a mut Division> {
        ledger
            .divisions
            .iter_mut()
            .find(|division| division.code == code)
            .ok_or_else(|| LedgerError::DivisionNotFound(code.to_string()))
    }

    pub fn list(ledger: &Ledger) -> &[Division] {
        &ledger.divisions
    }

    /// False for unknown divisions as well as for rejected transfers.
    pub fn can_transfer_to(ledger: &Ledger, from: &str, to: &str, amount: f64) -> bool {
        match (ledger.division(from), ledger.division(to)) {
            (Some(source), Some(_)) => source.can_transfer_to(to, amount),
            _ => false,
        }
    }

    pub fn ensure_transfer(ledger: &Ledger, from: &str, to: &str, amount: f64) -> Result<()> {
        let source = Self::get(ledger, from)?;
        Self::get(ledger, to)?;
        if source.can_transfer_to(to, amount) {
            return Ok(());
        }
        let limit = if source.restricted && from != to {
            None
        } else {
            source.transfer_limits.get(to).copied()
        };
        tracing::warn!(from, to, amount, "division transfer rejected");
        Err(LedgerError::TransferLimitExceeded {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            limit,
        })
    }

    pub fn set_transfer_limit(ledger: &mut Ledger, from: &str, to: &str, max: f64) -> Result<()> {
        if max < 0.0 {
            return Err(LedgerError::invalid("transfer limit cannot be negative"));
        }
        Self::get(ledger, to)?;
        Self::get_mut(ledger, from)?
            .transfer_limits
            .insert(to.to_string(), max);
        ledger.touch();
        Ok(())
    }

    pub fn add_transaction(
        ledger: &mut Ledger,
        code: &str,
        transaction: DivisionTransaction,
    ) -> Result<()> {
        Self::get_mut(ledger, code)?.transactions.push(transaction);
        Ok(())
    }

    pub fn balance(ledger: &Ledger, code: &str) -> Result<f64> {
        Ok(Self::get(ledger, code)?.balance())
    }

    pub fn clear_transactions(ledger: &mut Ledger) {
        for division in &mut ledger.divisions {
            division.transactions.clear();
        }
    }
}
