//! Statement computation over posted journals.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::DefaultAccounts;
use crate::core::services::AccountService;
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    amounts_equal, AccountType, BalanceSheet, BalanceSheetDebugRow, DateRange, IncomeStatement,
    JournalInput, JournalLine, Ledger, RollupRow, StatementLine, TrialBalance, TrialBalanceRow,
    BALANCE_TOLERANCE, COMMON_DIVISION,
};

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    debit: f64,
    credit: f64,
}

pub struct ReportService;

impl ReportService {
    /// Per-account totals over posted lines; an unbalanced book is an error.
    pub fn trial_balance(
        ledger: &Ledger,
        range: DateRange,
        division: Option<&str>,
    ) -> Result<TrialBalance> {
        let totals = collect_totals(ledger, range, division);
        let mut rows = Vec::with_capacity(totals.len());
        for (code, sums) in &totals {
            let account = AccountService::get(ledger, code)?;
            rows.push(TrialBalanceRow {
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                account_type: account.account_type,
                normal_balance: account.normal_balance,
                debit_total: sums.debit,
                credit_total: sums.credit,
                balance: account.calculate_balance(sums.debit, sums.credit),
            });
        }
        let total_debit: f64 = rows.iter().map(|row| row.debit_total).sum();
        let total_credit: f64 = rows.iter().map(|row| row.credit_total).sum();
        if !amounts_equal(total_debit, total_credit) {
            tracing::warn!(total_debit, total_credit, "trial balance does not balance");
            return Err(LedgerError::Consistency {
                total_debit,
                total_credit,
            });
        }
        let rollups = rollups(ledger, &rows);
        Ok(TrialBalance {
            range,
            division: division.map(str::to_string),
            rows,
            rollups,
            total_debit,
            total_credit,
            is_balanced: true,
        })
    }

    pub fn income_statement(
        ledger: &Ledger,
        range: DateRange,
        division: Option<&str>,
    ) -> Result<IncomeStatement> {
        let trial = Self::trial_balance(ledger, range, division)?;
        let revenues: Vec<StatementLine> = trial
            .rows_of(AccountType::Revenue)
            .map(StatementLine::from)
            .collect();
        let expenses: Vec<StatementLine> = trial
            .rows_of(AccountType::Expense)
            .map(StatementLine::from)
            .collect();
        let total_revenue = sum_lines(&revenues);
        let total_expense = sum_lines(&expenses);
        Ok(IncomeStatement {
            range,
            division: trial.division,
            revenues,
            expenses,
            total_revenue,
            total_expense,
            net_income: total_revenue - total_expense,
        })
    }

    /// Position as of `as_of`; unclosed revenue and expense fold into equity.
    pub fn balance_sheet(
        ledger: &Ledger,
        as_of: NaiveDate,
        division: Option<&str>,
    ) -> Result<BalanceSheet> {
        let trial = Self::trial_balance(ledger, DateRange::through(as_of), division)?;
        let lines_of = |kind| -> Vec<StatementLine> {
            trial.rows_of(kind).map(StatementLine::from).collect()
        };
        let assets = lines_of(AccountType::Asset);
        let liabilities = lines_of(AccountType::Liability);
        let equity = lines_of(AccountType::Equity);
        let net_income_to_date = sum_lines(&lines_of(AccountType::Revenue))
            - sum_lines(&lines_of(AccountType::Expense));

        let total_assets = sum_lines(&assets);
        let total_liabilities = sum_lines(&liabilities);
        let total_equity = sum_lines(&equity);
        let total_liabilities_and_equity = total_liabilities + total_equity + net_income_to_date;
        let difference = total_assets - total_liabilities_and_equity;
        let is_balanced = difference.abs() < BALANCE_TOLERANCE;
        if !is_balanced {
            tracing::warn!(%as_of, difference, "balance sheet does not balance");
        }
        Ok(BalanceSheet {
            as_of,
            division: trial.division,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            net_income_to_date,
            total_liabilities_and_equity,
            difference,
            is_balanced,
        })
    }

    /// Raw per-account trace; never fails so it can explain a failing sheet.
    pub fn balance_sheet_debug(
        ledger: &Ledger,
        as_of: NaiveDate,
        division: Option<&str>,
    ) -> Vec<BalanceSheetDebugRow> {
        collect_totals(ledger, DateRange::through(as_of), division)
            .into_iter()
            .filter_map(|(code, sums)| {
                let account = ledger.account(&code)?;
                Some(BalanceSheetDebugRow {
                    account_code: code,
                    account_name: account.name.clone(),
                    account_type: account.account_type,
                    normal_balance: account.normal_balance,
                    debit_total: sums.debit,
                    credit_total: sums.credit,
                    calculated: sums.debit - sums.credit,
                    displayed: account.calculate_balance(sums.debit, sums.credit),
                    sign_consistent: account.has_consistent_sign(),
                })
            })
            .collect()
    }

    /// Draft that zeroes revenue and expense into retained earnings.
    ///
    /// Returns `None` when nothing is left to close.
    pub fn closing_journal(
        ledger: &Ledger,
        defaults: &DefaultAccounts,
        as_of: NaiveDate,
        division: Option<&str>,
    ) -> Result<Option<JournalInput>> {
        let retained = AccountService::postable(ledger, &defaults.retained_earnings)?;
        let trial = Self::trial_balance(ledger, DateRange::through(as_of), division)?;
        let mut lines = Vec::new();
        let mut net_income = 0.0;
        for row in &trial.rows {
            if amounts_equal(row.balance, 0.0) {
                continue;
            }
            let close_with_debit = match row.account_type {
                AccountType::Revenue => {
                    net_income += row.balance;
                    row.balance > 0.0
                }
                AccountType::Expense => {
                    net_income -= row.balance;
                    row.balance < 0.0
                }
                _ => continue,
            };
            let amount = row.balance.abs();
            lines.push(if close_with_debit {
                JournalLine::debit(row.account_code.clone(), amount)
            } else {
                JournalLine::credit(row.account_code.clone(), amount)
            });
        }
        if lines.is_empty() {
            return Ok(None);
        }
        if !amounts_equal(net_income, 0.0) {
            lines.push(if net_income > 0.0 {
                JournalLine::credit(retained.code.clone(), net_income)
            } else {
                JournalLine::debit(retained.code.clone(), -net_income)
            });
        }
        let mut input = JournalInput::new(
            as_of,
            format!("Closing entries as of {as_of}"),
            division.unwrap_or(COMMON_DIVISION),
        );
        input.lines = lines;
        Ok(Some(input))
    }

    pub fn account_balance(ledger: &Ledger, code: &str, range: DateRange) -> Result<f64> {
        let account = AccountService::get(ledger, code)?;
        let sums = collect_totals(ledger, range, None)
            .remove(code)
            .unwrap_or_default();
        Ok(account.calculate_balance(sums.debit, sums.credit))
    }
}

fn collect_totals(
    ledger: &Ledger,
    range: DateRange,
    division: Option<&str>,
) -> BTreeMap<String, Totals> {
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    let journals = ledger.posted_journals().filter(|journal| {
        journal.date.map_or(false, |date| range.contains(date))
            && division.map_or(true, |code| journal.division.as_deref() == Some(code))
    });
    for journal in journals {
        for line in &journal.lines {
            let entry = totals.entry(line.account_code.clone()).or_default();
            entry.debit += line.debit_amount;
            entry.credit += line.credit_amount;
        }
    }
    totals
}

fn rollups(ledger: &Ledger, rows: &[TrialBalanceRow]) -> Vec<RollupRow> {
    let mut groups: BTreeMap<String, Totals> = BTreeMap::new();
    for row in rows {
        for ancestor in AccountService::ancestors(ledger, &row.account_code) {
            let entry = groups.entry(ancestor.code.clone()).or_default();
            entry.debit += row.debit_total;
            entry.credit += row.credit_total;
        }
    }
    groups
        .into_iter()
        .filter_map(|(code, sums)| {
            let account = ledger.account(&code)?;
            Some(RollupRow {
                depth: AccountService::depth(ledger, &code),
                account_name: account.name.clone(),
                account_type: account.account_type,
                debit_total: sums.debit,
                credit_total: sums.credit,
                balance: account.calculate_balance(sums.debit, sums.credit),
                account_code: code,
            })
        })
        .collect()
}

fn sum_lines(lines: &[StatementLine]) -> f64 {
    lines.iter().map(|line| line.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::seed;
    use crate::core::services::JournalService;
    use crate::ledger::{OPERATING_DIVISION, RESERVE_DIVISION};
    use chrono::Utc;

    fn day(month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, d).unwrap()
    }

    fn post(ledger: &mut Ledger, date: NaiveDate, division: &str, debit: &str, credit: &str, amount: f64) {
        let input = JournalInput::new(date, format!("{debit}/{credit}"), division)
            .line(JournalLine::debit(debit, amount))
            .line(JournalLine::credit(credit, amount));
        let id = JournalService::create(ledger, input).unwrap();
        JournalService::post(ledger, id, "tester", Utc::now()).unwrap();
    }

    fn book() -> Ledger {
        let mut ledger = seed::standard_ledger("Reports", &Config::default());
        post(&mut ledger, day(1, 10), OPERATING_DIVISION, "1301", "5101", 10_000.0);
        post(&mut ledger, day(1, 20), OPERATING_DIVISION, "1102", "1301", 10_000.0);
        post(&mut ledger, day(2, 5), OPERATING_DIVISION, "6101", "2101", 4_000.0);
        post(&mut ledger, day(2, 6), RESERVE_DIVISION, "1103", "5103", 1_500.0);
        ledger
    }

    #[test]
    fn trial_balance_balances_and_rolls_up() {
        let ledger = book();
        let trial = ReportService::trial_balance(&ledger, DateRange::all(), None).unwrap();
        assert!(trial.is_balanced);
        assert_eq!(trial.total_debit, 25_500.0);
        assert_eq!(trial.row("1301").unwrap().balance, 0.0);
        assert_eq!(trial.row("2101").unwrap().balance, 4_000.0);

        let assets = trial
            .rollups
            .iter()
            .find(|row| row.account_code == "1000")
            .unwrap();
        assert_eq!(assets.depth, 0);
        assert_eq!(assets.balance, 11_500.0);
    }

    #[test]
    fn drafts_and_out_of_range_journals_are_ignored() {
        let mut ledger = book();
        let draft = JournalInput::new(day(1, 15), "draft", OPERATING_DIVISION)
            .line(JournalLine::debit("1101", 99.0))
            .line(JournalLine::credit("5102", 99.0));
        JournalService::create(&mut ledger, draft).unwrap();

        let january = DateRange::new(day(1, 1), day(1, 31)).unwrap();
        let trial = ReportService::trial_balance(&ledger, january, None).unwrap();
        assert!(trial.row("1101").is_none());
        assert!(trial.row("6101").is_none());
        assert_eq!(trial.total_debit, 20_000.0);
    }

    #[test]
    fn corrupted_book_is_a_consistency_error() {
        let mut ledger = book();
        if let Some(journal) = ledger.journals.first_mut() {
            journal.lines[0].debit_amount = 9_000.0;
        }
        let err = ReportService::trial_balance(&ledger, DateRange::all(), None).unwrap_err();
        assert!(matches!(err, LedgerError::Consistency { .. }));
        assert!(!ReportService::balance_sheet_debug(&ledger, day(12, 31), None).is_empty());
    }

    #[test]
    fn income_statement_partitions_by_type() {
        let ledger = book();
        let statement =
            ReportService::income_statement(&ledger, DateRange::all(), Some(OPERATING_DIVISION))
                .unwrap();
        assert_eq!(statement.total_revenue, 10_000.0);
        assert_eq!(statement.total_expense, 4_000.0);
        assert_eq!(statement.net_income, 6_000.0);
        assert_eq!(statement.revenues.len(), 1);
    }

    #[test]
    fn balance_sheet_folds_net_income() {
        let ledger = book();
        let sheet = ReportService::balance_sheet(&ledger, day(12, 31), None).unwrap();
        assert_eq!(sheet.total_assets, 11_500.0);
        assert_eq!(sheet.total_liabilities, 4_000.0);
        assert_eq!(sheet.net_income_to_date, 7_500.0);
        assert!(sheet.is_balanced, "difference {}", sheet.difference);

        let early = ReportService::balance_sheet(&ledger, day(1, 15), None).unwrap();
        assert_eq!(early.total_assets, 10_000.0);
    }

    #[test]
    fn closing_moves_results_into_retained_earnings() {
        let mut ledger = book();
        let defaults = Config::default().default_accounts;
        let input = ReportService::closing_journal(&ledger, &defaults, day(12, 31), None)
            .unwrap()
            .unwrap();
        let id = JournalService::create(&mut ledger, input).unwrap();
        JournalService::post(&mut ledger, id, "tester", Utc::now()).unwrap();

        let sheet = ReportService::balance_sheet(&ledger, day(12, 31), None).unwrap();
        assert_eq!(sheet.net_income_to_date, 0.0);
        assert_eq!(sheet.total_equity, 7_500.0);
        assert!(sheet.is_balanced);
        assert!(ReportService::closing_journal(&ledger, &defaults, day(12, 31), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn debug_rows_explain_signs() {
        let ledger = book();
        let rows = ReportService::balance_sheet_debug(&ledger, day(12, 31), None);
        let payable = rows.iter().find(|row| row.account_code == "2101").unwrap();
        assert_eq!(payable.calculated, -4_000.0);
        assert_eq!(payable.displayed, 4_000.0);
        assert!(payable.sign_consistent);
    }

    #[test]
    fn account_balance_uses_sign_rule() {
        let ledger = book();
        assert_eq!(
            ReportService::account_balance(&ledger, "1102", DateRange::all()).unwrap(),
            10_000.0
        );
        assert_eq!(
            ReportService::account_balance(&ledger, "5101", DateRange::all()).unwrap(),
            10_000.0
        );
    }
}
