use serde::{Deserialize, Serialize};

use super::transaction::{PaymentStatus, Transaction, TransactionType};

/// Inclusive amount bounds; either side may be open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AmountRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl AmountRange {
    pub fn contains(&self, amount: f64) -> bool {
        self.min.map_or(true, |min| amount >= min) && self.max.map_or(true, |max| amount <= max)
    }
}

/// Optional predicates; every one that is present must match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RuleCondition {
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub amount_range: Option<AmountRange>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RuleCondition {
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.transaction_type
            .map_or(true, |kind| kind == txn.transaction_type)
            && self.payment_status.map_or(true, |status| status == txn.status)
            && self
                .account_code
                .as_deref()
                .map_or(true, |code| code == txn.account_code)
            && self
                .amount_range
                .map_or(true, |range| range.contains(txn.amount))
            && self.tags.iter().all(|tag| txn.tags.contains(tag))
    }
}

/// Named accounts resolved through configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DefaultAccount {
    Receivable,
    Payable,
    Cash,
    RetainedEarnings,
}

/// How one side of a generated journal picks its account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SidePattern {
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub use_transaction_account: bool,
    #[serde(default)]
    pub use_payment_account: bool,
    #[serde(default)]
    pub default_account: Option<DefaultAccount>,
}

impl SidePattern {
    pub fn fixed(code: impl Into<String>) -> Self {
        Self {
            account_code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn transaction_account() -> Self {
        Self {
            use_transaction_account: true,
            ..Self::default()
        }
    }

    pub fn payment_account() -> Self {
        Self {
            use_payment_account: true,
            ..Self::default()
        }
    }

    pub fn default_account(account: DefaultAccount) -> Self {
        Self {
            default_account: Some(account),
            ..Self::default()
        }
    }

    pub fn or_default(mut self, account: DefaultAccount) -> Self {
        self.default_account = Some(account);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JournalPattern {
    pub debit: SidePattern,
    pub credit: SidePattern,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalGenerationRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub condition: RuleCondition,
    pub pattern: JournalPattern,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "JournalGenerationRule::default_active")]
    pub is_active: bool,
    /// Registration order; breaks ties between equal priorities.
    #[serde(default)]
    pub sequence: u64,
}

impl JournalGenerationRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        condition: RuleCondition,
        pattern: JournalPattern,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition,
            pattern,
            priority,
            is_active: true,
            sequence: 0,
        }
    }

    pub fn applies_to(&self, txn: &Transaction) -> bool {
        self.is_active && self.condition.matches(txn)
    }

    fn default_active() -> bool {
        true
    }
}
