use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::NormalBalance;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxiliaryTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub is_debit: bool,
    pub journal_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub balance_after: f64,
}

/// Per-entity view into one master account (one unit owner, one vendor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxiliaryLedger {
    pub master_account_code: String,
    pub auxiliary_code: String,
    pub name: String,
    pub normal_balance: NormalBalance,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<AuxiliaryTransaction>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl AuxiliaryLedger {
    pub fn new(
        master_account_code: impl Into<String>,
        auxiliary_code: impl Into<String>,
        name: impl Into<String>,
        normal_balance: NormalBalance,
    ) -> Self {
        Self {
            master_account_code: master_account_code.into(),
            auxiliary_code: auxiliary_code.into(),
            name: name.into(),
            normal_balance,
            balance: 0.0,
            transactions: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn matches(&self, master: &str, code: &str) -> bool {
        self.master_account_code == master && self.auxiliary_code == code
    }

    /// Inserts after every entry dated on or before `entry.date`, then
    /// recomputes the running balances.
    pub fn insert(&mut self, entry: AuxiliaryTransaction) {
        let position = self
            .transactions
            .iter()
            .position(|existing| existing.date > entry.date)
            .unwrap_or(self.transactions.len());
        self.transactions.insert(position, entry);
        self.recompute();
    }

    pub fn recompute(&mut self) {
        let mut running = 0.0;
        for entry in &mut self.transactions {
            running += self.normal_balance.signed(entry.amount, entry.is_debit);
            entry.balance_after = running;
        }
        self.balance = running;
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
        self.balance = 0.0;
    }
}

/// Replay of one auxiliary ledger over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxiliaryReport {
    pub master_account_code: String,
    pub auxiliary_code: String,
    pub name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub opening_balance: f64,
    pub total_debit: f64,
    pub total_credit: f64,
    pub closing_balance: f64,
    pub transactions: Vec<AuxiliaryTransaction>,
}
