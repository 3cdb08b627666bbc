use std::fmt;

use serde::{Deserialize, Serialize};

/// Division tag shared by every fund.
pub const COMMON_DIVISION: &str = "COMMON";

/// Classifies accounts into the five statement groups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[serde(alias = "asset", alias = "Asset")]
    Asset,
    #[serde(alias = "liability", alias = "Liability")]
    Liability,
    #[serde(alias = "equity", alias = "Equity")]
    Equity,
    #[serde(alias = "revenue", alias = "Revenue")]
    Revenue,
    #[serde(alias = "expense", alias = "Expense")]
    Expense,
}

impl AccountType {
    /// Side on which the account type conventionally increases.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalBalance::Credit
            }
        }
    }

    pub fn is_debit_account(self) -> bool {
        self.normal_balance() == NormalBalance::Debit
    }

    pub fn is_credit_account(self) -> bool {
        self.normal_balance() == NormalBalance::Credit
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Some(AccountType::Asset),
            "LIABILITY" => Some(AccountType::Liability),
            "EQUITY" => Some(AccountType::Equity),
            "REVENUE" => Some(AccountType::Revenue),
            "EXPENSE" => Some(AccountType::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Revenue => "REVENUE",
            AccountType::Expense => "EXPENSE",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalBalance {
    #[serde(alias = "debit", alias = "Debit")]
    Debit,
    #[serde(alias = "credit", alias = "Credit")]
    Credit,
}

impl NormalBalance {
    /// Applies the sign rule: the normal side minus the opposite side.
    pub fn balance(self, debit_total: f64, credit_total: f64) -> f64 {
        match self {
            NormalBalance::Debit => debit_total - credit_total,
            NormalBalance::Credit => credit_total - debit_total,
        }
    }

    /// Signed effect of one entry on a balance kept on this side.
    pub fn signed(self, amount: f64, is_debit: bool) -> f64 {
        match (self, is_debit) {
            (NormalBalance::Debit, true) | (NormalBalance::Credit, false) => amount,
            _ => -amount,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Some(NormalBalance::Debit),
            "CREDIT" => Some(NormalBalance::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormalBalance::Debit => "DEBIT",
            NormalBalance::Credit => "CREDIT",
        })
    }
}

/// Chart-of-accounts entry keyed by its stable `code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default = "Account::default_true")]
    pub is_active: bool,
    #[serde(default = "Account::default_true")]
    pub is_postable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Account {
    /// Creates an active, postable account with the conventional normal balance.
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance: account_type.normal_balance(),
            parent_code: None,
            division: None,
            is_active: true,
            is_postable: true,
            description: None,
        }
    }

    /// Creates a non-postable rollup account.
    pub fn group(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            is_postable: false,
            ..Self::new(code, name, account_type)
        }
    }

    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    pub fn is_debit_account(&self) -> bool {
        self.account_type.is_debit_account()
    }

    pub fn is_credit_account(&self) -> bool {
        self.account_type.is_credit_account()
    }

    /// True when the stored normal balance matches the type convention.
    pub fn has_consistent_sign(&self) -> bool {
        self.normal_balance == self.account_type.normal_balance()
    }

    pub fn calculate_balance(&self, debit_total: f64, credit_total: f64) -> f64 {
        self.normal_balance.balance(debit_total, credit_total)
    }

    /// Common (or untagged) accounts are visible to every division.
    pub fn belongs_to_division(&self, division: &str) -> bool {
        match self.division.as_deref() {
            None => true,
            Some(tag) => tag == COMMON_DIVISION || tag == division,
        }
    }

    fn default_true() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_rule_follows_normal_balance() {
        let cash = Account::new("1101", "Cash", AccountType::Asset);
        let revenue = Account::new("5101", "Fee revenue", AccountType::Revenue);
        assert_eq!(cash.calculate_balance(300.0, 100.0), 200.0);
        assert_eq!(revenue.calculate_balance(300.0, 100.0), -200.0);
    }

    #[test]
    fn classifiers_follow_type() {
        assert!(AccountType::Expense.is_debit_account());
        assert!(AccountType::Equity.is_credit_account());
        assert!(!AccountType::Liability.is_debit_account());
    }

    #[test]
    fn common_accounts_visible_everywhere() {
        let shared = Account::new("1101", "Cash", AccountType::Asset).with_division(COMMON_DIVISION);
        let reserve = Account::new("1103", "Reserve deposit", AccountType::Asset).with_division("RESERVE");
        assert!(shared.belongs_to_division("OPERATING"));
        assert!(reserve.belongs_to_division("RESERVE"));
        assert!(!reserve.belongs_to_division("OPERATING"));
    }

    #[test]
    fn deserializes_lowercase_type() {
        let account: Account = serde_json::from_str(
            r#"{"code":"6101","name":"Salaries","account_type":"expense","normal_balance":"debit"}"#,
        )
        .unwrap();
        assert_eq!(account.account_type, AccountType::Expense);
        assert!(account.is_active && account.is_postable);
    }
}
