//! Standard chart of accounts, fund divisions, and generation rules.

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::core::services::generator_service::sort_rules;
use crate::ledger::{
    Account, AccountType, DefaultAccount, Division, JournalGenerationRule, JournalPattern, Ledger,
    PaymentStatus, RuleCondition, SidePattern, TransactionType, COMMON_DIVISION,
    OPERATING_DIVISION, RESERVE_DIVISION,
};

static STANDARD_CHART: Lazy<Vec<Account>> = Lazy::new(|| {
    use AccountType::*;
    vec![
        Account::group("1000", "Assets", Asset),
        Account::group("1100", "Cash and deposits", Asset).with_parent("1000"),
        Account::new("1101", "Cash on hand", Asset).with_parent("1100"),
        Account::new("1102", "Operating bank account", Asset)
            .with_parent("1100")
            .with_division(OPERATING_DIVISION),
        Account::new("1103", "Reserve deposit", Asset)
            .with_parent("1100")
            .with_division(RESERVE_DIVISION),
        Account::group("1300", "Receivables", Asset).with_parent("1000"),
        Account::new("1301", "Management fees receivable", Asset).with_parent("1300"),
        Account::group("2000", "Liabilities", Liability),
        Account::group("2100", "Current liabilities", Liability).with_parent("2000"),
        Account::new("2101", "Accounts payable", Liability).with_parent("2100"),
        Account::group("2200", "Long-term liabilities", Liability).with_parent("2000"),
        Account::new("2201", "Reserve fund liability", Liability)
            .with_parent("2200")
            .with_division(RESERVE_DIVISION),
        Account::group("3000", "Equity", Equity),
        Account::new("3101", "Retained earnings", Equity).with_parent("3000"),
        Account::group("5000", "Revenue", Revenue),
        Account::group("5100", "Operating revenue", Revenue).with_parent("5000"),
        Account::new("5101", "Management fee income", Revenue)
            .with_parent("5100")
            .with_division(OPERATING_DIVISION),
        Account::new("5102", "Parking fee income", Revenue)
            .with_parent("5100")
            .with_division(OPERATING_DIVISION),
        Account::new("5103", "Reserve contributions", Revenue)
            .with_parent("5100")
            .with_division(RESERVE_DIVISION),
        Account::group("5200", "Other revenue", Revenue).with_parent("5000"),
        Account::new("5201", "Interest income", Revenue).with_parent("5200"),
        Account::group("6000", "Expenses", Expense),
        Account::group("6100", "Personnel", Expense).with_parent("6000"),
        Account::new("6101", "Salaries", Expense)
            .with_parent("6100")
            .with_division(OPERATING_DIVISION),
        Account::group("6200", "Facilities", Expense).with_parent("6000"),
        Account::new("6201", "Utilities", Expense)
            .with_parent("6200")
            .with_division(OPERATING_DIVISION),
        Account::new("6202", "Cleaning", Expense)
            .with_parent("6200")
            .with_division(OPERATING_DIVISION),
        Account::group("6300", "Long-term repairs", Expense).with_parent("6000"),
        Account::new("6301", "Major repairs", Expense)
            .with_parent("6300")
            .with_division(RESERVE_DIVISION),
    ]
});

pub fn standard_chart() -> Vec<Account> {
    STANDARD_CHART.clone()
}

pub fn standard_divisions() -> Vec<Division> {
    vec![
        Division::new(OPERATING_DIVISION, "Operating fund"),
        Division::new(RESERVE_DIVISION, "Reserve fund").restricted(),
        Division::new(COMMON_DIVISION, "Common"),
    ]
}

/// Accrual and cash rules for income, expense, and transfers.
pub fn standard_rules() -> Vec<JournalGenerationRule> {
    let when = |kind, status| RuleCondition {
        transaction_type: Some(kind),
        payment_status: status,
        ..RuleCondition::default()
    };
    let payment_or_cash = || SidePattern::payment_account().or_default(DefaultAccount::Cash);
    let mut rules = vec![
        JournalGenerationRule::new(
            "income-unpaid",
            "Income on account",
            when(TransactionType::Income, Some(PaymentStatus::Unpaid)),
            JournalPattern {
                debit: SidePattern::default_account(DefaultAccount::Receivable),
                credit: SidePattern::transaction_account(),
            },
            100,
        ),
        JournalGenerationRule::new(
            "income-paid",
            "Income received",
            when(TransactionType::Income, Some(PaymentStatus::Paid)),
            JournalPattern {
                debit: payment_or_cash(),
                credit: SidePattern::transaction_account(),
            },
            100,
        ),
        JournalGenerationRule::new(
            "expense-unpaid",
            "Expense on account",
            when(TransactionType::Expense, Some(PaymentStatus::Unpaid)),
            JournalPattern {
                debit: SidePattern::transaction_account(),
                credit: SidePattern::default_account(DefaultAccount::Payable),
            },
            100,
        ),
        JournalGenerationRule::new(
            "expense-paid",
            "Expense paid",
            when(TransactionType::Expense, Some(PaymentStatus::Paid)),
            JournalPattern {
                debit: SidePattern::transaction_account(),
                credit: payment_or_cash(),
            },
            100,
        ),
        JournalGenerationRule::new(
            "transfer",
            "Transfer between accounts",
            when(TransactionType::Transfer, None),
            JournalPattern {
                debit: SidePattern::transaction_account(),
                credit: payment_or_cash(),
            },
            50,
        ),
    ];
    for (sequence, rule) in (1..).zip(rules.iter_mut()) {
        rule.sequence = sequence;
    }
    sort_rules(&mut rules);
    rules
}

/// A ready-to-use ledger: standard chart, divisions, rules, and the configured sequence.
pub fn standard_ledger(name: &str, config: &Config) -> Ledger {
    let mut ledger = Ledger::new(name);
    ledger.accounts = STANDARD_CHART
        .iter()
        .map(|account| (account.code.clone(), account.clone()))
        .collect();
    ledger.divisions = standard_divisions();
    ledger.rules = standard_rules();
    ledger.sequence = config.journal_sequence();
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::build_directory;

    #[test]
    fn standard_chart_passes_directory_validation() {
        let directory = build_directory(standard_chart()).unwrap();
        let defaults = Config::default().default_accounts;
        for code in [
            &defaults.receivable,
            &defaults.payable,
            &defaults.cash,
            &defaults.retained_earnings,
        ] {
            assert!(directory[code].is_postable, "{code} must be postable");
        }
    }

    #[test]
    fn rules_are_priority_ordered() {
        let rules = standard_rules();
        assert_eq!(rules.len(), 5);
        assert_eq!(rules[0].id, "income-unpaid");
        assert_eq!(rules.last().unwrap().id, "transfer");
    }

    #[test]
    fn ledger_uses_configured_numbering() {
        let config = Config {
            journal_prefix: "GJ".into(),
            journal_number_width: 4,
            ..Config::default()
        };
        let mut ledger = standard_ledger("Seeded", &config);
        assert_eq!(ledger.sequence.allocate(), "GJ0001");
        assert!(ledger.division(RESERVE_DIVISION).unwrap().restricted);
    }
}
