//! Flat CSV tables for the chart of accounts and journal lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ImportJournal, ImportLine};
use crate::errors::{LedgerError, Result};
use crate::ledger::{Account, AccountType, Journal, JournalStatus, NormalBalance};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    code: String,
    name: String,
    account_type: String,
    #[serde(default)]
    normal_balance: Option<String>,
    #[serde(default)]
    parent_code: Option<String>,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    is_postable: Option<bool>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalLineRecord {
    journal_number: String,
    date: NaiveDate,
    description: String,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    account_code: String,
    #[serde(default)]
    debit_amount: Option<f64>,
    #[serde(default)]
    credit_amount: Option<f64>,
    #[serde(default)]
    auxiliary_code: Option<String>,
    #[serde(default)]
    service_month: Option<String>,
    #[serde(default)]
    payer_id: Option<String>,
    #[serde(default)]
    line_description: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn accounts_to_csv<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for account in accounts {
        writer.serialize(AccountRecord {
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type.to_string(),
            normal_balance: Some(account.normal_balance.to_string()),
            parent_code: account.parent_code.clone(),
            division: account.division.clone(),
            is_active: Some(account.is_active),
            is_postable: Some(account.is_postable),
            description: account.description.clone(),
        })?;
    }
    into_string(writer)
}

/// Parses an accounts table; a missing normal balance follows the account type.
pub fn accounts_from_csv(data: &str) -> Result<Vec<Account>> {
    let mut reader = ::csv::Reader::from_reader(data.as_bytes());
    let mut accounts = Vec::new();
    let mut errors = Vec::new();
    for (idx, record) in reader.deserialize::<AccountRecord>().enumerate() {
        let record = record?;
        let row = idx + 2;
        let Some(account_type) = AccountType::parse(&record.account_type) else {
            errors.push(format!(
                "row {row}: unknown account type `{}`",
                record.account_type
            ));
            continue;
        };
        let normal_balance = match non_blank(record.normal_balance) {
            None => account_type.normal_balance(),
            Some(raw) => match NormalBalance::parse(&raw) {
                Some(parsed) => parsed,
                None => {
                    errors.push(format!("row {row}: unknown normal balance `{raw}`"));
                    continue;
                }
            },
        };
        accounts.push(Account {
            code: record.code.trim().to_string(),
            name: record.name.trim().to_string(),
            account_type,
            normal_balance,
            parent_code: non_blank(record.parent_code),
            division: non_blank(record.division),
            is_active: record.is_active.unwrap_or(true),
            is_postable: record.is_postable.unwrap_or(true),
            description: non_blank(record.description),
        });
    }
    if errors.is_empty() {
        Ok(accounts)
    } else {
        Err(LedgerError::Validation(errors))
    }
}

/// One row per journal line; undated journals are skipped.
pub fn journals_to_csv<'a>(journals: impl IntoIterator<Item = &'a Journal>) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for journal in journals {
        let Some(date) = journal.date else {
            continue;
        };
        for line in &journal.lines {
            writer.serialize(JournalLineRecord {
                journal_number: journal.journal_number.clone(),
                date,
                description: journal.description.clone(),
                division: journal.division.clone(),
                status: Some(journal.status.to_string()),
                reference: journal.reference.clone(),
                account_code: line.account_code.clone(),
                debit_amount: Some(line.debit_amount),
                credit_amount: Some(line.credit_amount),
                auxiliary_code: line.auxiliary_code.clone(),
                service_month: line.service_month.clone(),
                payer_id: line.payer_id.clone(),
                line_description: line.description.clone(),
            })?;
        }
    }
    into_string(writer)
}

/// Groups consecutive line rows by journal number, in first-seen order.
pub fn journal_rows_from_csv(data: &str) -> Result<Vec<ImportJournal>> {
    let mut reader = ::csv::Reader::from_reader(data.as_bytes());
    let mut journals: Vec<ImportJournal> = Vec::new();
    for record in reader.deserialize::<JournalLineRecord>() {
        let record = record?;
        let line = ImportLine {
            account_code: record.account_code.trim().to_string(),
            debit_amount: record.debit_amount.unwrap_or_default(),
            credit_amount: record.credit_amount.unwrap_or_default(),
            auxiliary_code: non_blank(record.auxiliary_code),
            service_month: non_blank(record.service_month),
            payer_id: non_blank(record.payer_id),
            description: non_blank(record.line_description),
        };
        let number = record.journal_number.trim().to_string();
        let existing = if number.is_empty() {
            // Unnumbered rows join the journal right above them when date and description match.
            journals.last_mut().filter(|journal| {
                journal.number.is_none()
                    && journal.date == record.date
                    && journal.description == record.description
            })
        } else {
            journals
                .iter_mut()
                .find(|journal| journal.number.as_deref() == Some(number.as_str()))
        };
        if let Some(existing) = existing {
            existing.details.push(line);
            continue;
        }
        let status = match non_blank(record.status) {
            None => None,
            Some(raw) => Some(JournalStatus::parse(&raw).ok_or_else(|| {
                LedgerError::invalid(format!("journal {number}: unknown status `{raw}`"))
            })?),
        };
        journals.push(ImportJournal {
            date: record.date,
            description: record.description,
            reference: non_blank(record.reference),
            number: Some(number).filter(|value| !value.is_empty()),
            status,
            division: non_blank(record.division),
            details: vec![line],
        });
    }
    Ok(journals)
}

fn into_string(writer: ::csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| LedgerError::Storage(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| LedgerError::Storage(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{JournalInput, JournalLine};

    #[test]
    fn accounts_table_roundtrips_through_csv() {
        let accounts = vec![
            Account::group("1000", "Assets", AccountType::Asset),
            Account::new("1101", "Cash on hand", AccountType::Asset).with_parent("1000"),
        ];
        let text = accounts_to_csv(&accounts).unwrap();
        assert!(text.starts_with("code,name,accountType,normalBalance,parentCode"));
        let parsed = accounts_from_csv(&text).unwrap();
        assert_eq!(parsed, accounts);
    }

    #[test]
    fn sparse_account_rows_take_defaults() {
        let text = "code,name,accountType\n2101,Accounts payable,liability\n9000,Mystery,widget\n";
        let err = accounts_from_csv(text).unwrap_err();
        assert_eq!(err.messages(), vec!["row 3: unknown account type `widget`".to_string()]);

        let parsed = accounts_from_csv("code,name,accountType\n2101,Accounts payable,liability\n").unwrap();
        assert_eq!(parsed[0].normal_balance, NormalBalance::Credit);
        assert!(parsed[0].is_postable);
    }

    #[test]
    fn journal_lines_group_by_number() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let journal = Journal::create(
            JournalInput::new(date, "June fees", "OPERATING")
                .line(JournalLine::debit("1301", 40.0).with_auxiliary("U-7"))
                .line(JournalLine::credit("5101", 40.0)),
            "JV000009",
        );
        let text = journals_to_csv([&journal]).unwrap();
        let imported = journal_rows_from_csv(&text).unwrap();
        assert_eq!(imported.len(), 1);
        let row = &imported[0];
        assert_eq!(row.number.as_deref(), Some("JV000009"));
        assert_eq!(row.status, Some(JournalStatus::Draft));
        assert_eq!(row.details.len(), 2);
        assert_eq!(row.details[0].auxiliary_code.as_deref(), Some("U-7"));
        assert_eq!(row.details[1].credit_amount, 40.0);
    }

    #[test]
    fn unnumbered_lines_group_by_date_and_description() {
        let text = "journalNumber,date,description,accountCode,debitAmount,creditAmount\n\
            ,2024-07-01,Pool repair,6201,250,\n\
            ,2024-07-01,Pool repair,1102,,250\n\
            ,2024-07-02,Gate fobs,6201,30,\n\
            ,2024-07-02,Gate fobs,1102,,30\n\
            JV000010,2024-07-02,Gate fobs,6201,5,\n\
            JV000010,2024-07-02,Gate fobs,1102,,5\n\
            ,2024-07-02,Gate fobs,6201,8,\n\
            ,2024-07-02,Gate fobs,1102,,8\n";
        let imported = journal_rows_from_csv(text).unwrap();
        let shape: Vec<(Option<&str>, &str, usize)> = imported
            .iter()
            .map(|j| (j.number.as_deref(), j.description.as_str(), j.details.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, "Pool repair", 2),
                (None, "Gate fobs", 2),
                (Some("JV000010"), "Gate fobs", 2),
                (None, "Gate fobs", 2),
            ]
        );
        assert_eq!(imported[1].details[1].credit_amount, 30.0);
    }
}
