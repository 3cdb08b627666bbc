use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountType;

pub const OPERATING_DIVISION: &str = "OPERATING";
pub const RESERVE_DIVISION: &str = "RESERVE";

/// One posted movement recorded against a division's running balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DivisionTransaction {
    pub journal_id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    pub is_debit: bool,
    pub account_type: AccountType,
}

impl DivisionTransaction {
    pub fn signed_amount(&self) -> f64 {
        self.account_type
            .normal_balance()
            .signed(self.amount, self.is_debit)
    }
}

/// Accounting partition (fund) with transfer restrictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Division {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub transfer_limits: BTreeMap<String, f64>,
    #[serde(default)]
    pub transactions: Vec<DivisionTransaction>,
}

impl Division {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            restricted: false,
            transfer_limits: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }

    /// Folds every recorded transaction with the normal-balance sign rule.
    pub fn balance(&self) -> f64 {
        self.transactions
            .iter()
            .map(DivisionTransaction::signed_amount)
            .sum()
    }

    pub fn can_transfer_to(&self, target: &str, amount: f64) -> bool {
        if self.restricted && target != self.code {
            return false;
        }
        match self.transfer_limits.get(target) {
            Some(limit) => amount <= *limit,
            None => true,
        }
    }
}
