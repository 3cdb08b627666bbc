use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::core::seed;
use crate::core::services::journal_service::fund_division;
use crate::core::services::{
    build_directory, AccountFilter, AccountService, AuxiliaryService, DivisionService,
    GeneratorService, JournalFilter, JournalService, ReportService,
};
use crate::errors::{LedgerError, Result};
use crate::interchange::{
    self, ClassificationHint, ExportPayload, ImportJournal, ImportPayload, ImportReport,
    RowTemplate, TabularRow,
};
use crate::ledger::{
    Account, AccountType, AuxiliaryReport, BalanceSheet, BalanceSheetDebugRow, DateRange,
    IncomeStatement, Journal, JournalGenerationRule, JournalInput, JournalLine, JournalPatch,
    JournalStatus, Ledger, Transaction, TrialBalance, UnitOwner, Vendor, CURRENT_SCHEMA_VERSION,
    OPERATING_DIVISION,
};
use crate::storage::StorageBackend;

const META_SOURCE: &str = "source";

/// Options accepted by [`LedgerManager::create_journal`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub auto_post: bool,
    pub meta: BTreeMap<String, String>,
}

impl CreateOptions {
    pub fn posted() -> Self {
        Self {
            auto_post: true,
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Movement of funds between two division-tagged asset accounts.
#[derive(Debug, Clone)]
pub struct DivisionTransfer {
    pub from_division: String,
    pub to_division: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
}

/// Facade that coordinates ledger state, services, and persistence.
pub struct LedgerManager {
    ledger: Ledger,
    config: Config,
    storage: Option<Box<dyn StorageBackend>>,
    current_name: Option<String>,
}

impl LedgerManager {
    /// Starts a ledger with the standard chart, divisions, and rules.
    pub fn new(name: &str, config: Config) -> Self {
        Self::from_ledger(seed::standard_ledger(name, &config), config)
    }

    pub fn from_ledger(mut ledger: Ledger, config: Config) -> Self {
        DivisionService::initialize(&mut ledger);
        Self {
            ledger,
            config,
            storage: None,
            current_name: None,
        }
    }

    pub fn with_storage(mut self, storage: Box<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    fn actor(&self) -> String {
        self.config.default_actor.clone()
    }

    // ---- accounts ----------------------------------------------------------

    pub fn account(&self, code: &str) -> Result<&Account> {
        AccountService::get(&self.ledger, code)
    }

    pub fn accounts(&self, filter: &AccountFilter) -> Vec<&Account> {
        AccountService::list(&self.ledger, filter)
    }

    pub fn upsert_account(&mut self, account: Account) -> Result<()> {
        AccountService::upsert(&mut self.ledger, account)
    }

    pub fn set_account_active(&mut self, code: &str, active: bool) -> Result<()> {
        AccountService::set_active(&mut self.ledger, code, active)
    }

    pub fn remove_account(&mut self, code: &str) -> Result<Account> {
        AccountService::remove(&mut self.ledger, code)
    }

    // ---- journals ----------------------------------------------------------

    pub fn journal(&self, id: Uuid) -> Result<&Journal> {
        JournalService::get(&self.ledger, id)
    }

    pub fn journals(&self, filter: &JournalFilter) -> Vec<&Journal> {
        JournalService::list(&self.ledger, filter)
    }

    /// Creates a draft and optionally posts it; a failed auto-post leaves no draft behind.
    pub fn create_journal(&mut self, input: JournalInput, options: CreateOptions) -> Result<Uuid> {
        let id = JournalService::create(&mut self.ledger, input)?;
        self.finish_create(id, options)
    }

    fn finish_create(&mut self, id: Uuid, options: CreateOptions) -> Result<Uuid> {
        if let Some(journal) = self.ledger.journals.iter_mut().find(|j| j.id == id) {
            journal.meta.extend(options.meta);
        }
        if options.auto_post {
            let actor = self.actor();
            let posted = JournalService::post(&mut self.ledger, id, &actor, Utc::now()).map(|_| ());
            if let Err(err) = posted {
                JournalService::delete(&mut self.ledger, id)?;
                return Err(err);
            }
        }
        Ok(id)
    }

    pub fn post_journal_by_id(&mut self, id: Uuid) -> Result<&Journal> {
        let actor = self.actor();
        JournalService::post(&mut self.ledger, id, &actor, Utc::now())
    }

    pub fn submit_journal(&mut self, id: Uuid) -> Result<&Journal> {
        JournalService::submit(&mut self.ledger, id, Utc::now())
    }

    pub fn approve_journal(&mut self, id: Uuid, approver: &str) -> Result<&Journal> {
        JournalService::approve(&mut self.ledger, id, approver, Utc::now())
    }

    pub fn delete_journal(&mut self, id: Uuid) -> Result<Journal> {
        JournalService::delete(&mut self.ledger, id)
    }

    pub fn update_journal(&mut self, id: Uuid, patch: JournalPatch) -> Result<&Journal> {
        JournalService::update(&mut self.ledger, id, patch)
    }

    pub fn cancel_journal(&mut self, id: Uuid, reason: &str) -> Result<&Journal> {
        JournalService::cancel(&mut self.ledger, id, reason, Utc::now())
    }

    // ---- generation --------------------------------------------------------

    pub fn create_from_transaction(&mut self, txn: &Transaction, auto_post: bool) -> Result<Uuid> {
        let input = GeneratorService::generate_journal(
            &self.ledger,
            &self.config.default_accounts,
            txn,
        )?;
        let options = CreateOptions {
            auto_post,
            ..CreateOptions::default()
        }
        .with_meta(META_SOURCE, "transaction")
        .with_meta("transactionType", txn.transaction_type.to_string());
        self.create_journal(input, options)
    }

    pub fn settle_transaction(
        &mut self,
        txn: &Transaction,
        payment_account: &str,
        auto_post: bool,
    ) -> Result<Uuid> {
        let input = GeneratorService::generate_payment_journal(
            &self.ledger,
            &self.config.default_accounts,
            txn,
            payment_account,
        )?;
        let options = CreateOptions {
            auto_post,
            ..CreateOptions::default()
        }
        .with_meta(META_SOURCE, "settlement");
        self.create_journal(input, options)
    }

    /// Turns a classifier suggestion into a draft only if it passes every posting check.
    pub fn create_from_hint(&mut self, hint: &ClassificationHint) -> Result<Uuid> {
        let mut errors = hint.problems();
        let input = hint.to_input(OPERATING_DIVISION);
        errors.extend(JournalService::check(
            &self.ledger,
            &Journal::create(input.clone(), String::new()),
        ));
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }
        let options = CreateOptions::default()
            .with_meta(META_SOURCE, "classification")
            .with_meta("confidence", format!("{:.2}", hint.confidence));
        self.create_journal(input, options)
    }

    /// Generates one journal per row; nothing is created unless every row generates.
    pub fn create_from_rows(
        &mut self,
        rows: &[TabularRow],
        template: &RowTemplate,
        auto_post: bool,
    ) -> Result<Vec<Uuid>> {
        let mut inputs = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let mut txn = Transaction::new(
                template.transaction_type,
                template.account_code.clone(),
                row.amount,
                template.status,
                template.division_code.clone(),
                row.date,
            )
            .with_note(row.description.clone());
            txn.payment_account_code = template.payment_account_code.clone();
            match GeneratorService::generate_journal(
                &self.ledger,
                &self.config.default_accounts,
                &txn,
            ) {
                Ok(input) => inputs.push(input),
                Err(err) => errors.extend(
                    err.messages()
                        .into_iter()
                        .map(|message| format!("row {}: {message}", idx + 1)),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }

        let mut working = self.ledger.clone();
        let actor = self.actor();
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = JournalService::create(&mut working, input)?;
            if let Some(journal) = working.journals.iter_mut().find(|j| j.id == id) {
                journal.meta.insert(META_SOURCE.into(), "tabular".into());
            }
            if auto_post {
                JournalService::post(&mut working, id, &actor, Utc::now())?;
            }
            ids.push(id);
        }
        self.ledger = working;
        tracing::info!(rows = ids.len(), "journals created from tabular rows");
        Ok(ids)
    }

    /// Posts a fund transfer once both accounts hold the named funds and the registry allows it.
    pub fn transfer_between_divisions(&mut self, transfer: &DivisionTransfer) -> Result<Uuid> {
        let from = AccountService::postable(&self.ledger, &transfer.from_account)?;
        let to = AccountService::postable(&self.ledger, &transfer.to_account)?;
        let errors: Vec<String> = [
            (from, transfer.from_division.as_str()),
            (to, transfer.to_division.as_str()),
        ]
        .into_iter()
        .filter(|(account, division)| {
            holding_division(account, &transfer.from_division) != Some(*division)
        })
        .map(|(account, division)| {
            format!("account {} does not hold {division} funds", account.code)
        })
        .collect();
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }
        DivisionService::ensure_transfer(
            &self.ledger,
            &transfer.from_division,
            &transfer.to_division,
            transfer.amount,
        )?;
        let input = JournalInput::new(
            transfer.date,
            transfer.description.clone(),
            transfer.from_division.clone(),
        )
        .line(JournalLine::debit(transfer.to_account.clone(), transfer.amount))
        .line(JournalLine::credit(transfer.from_account.clone(), transfer.amount));
        let options = CreateOptions::posted()
            .with_meta(META_SOURCE, "transfer")
            .with_meta("toDivision", transfer.to_division.clone());
        self.create_journal(input, options)
    }

    // ---- rules, divisions, master data -------------------------------------

    pub fn add_rule(&mut self, rule: JournalGenerationRule) -> Result<()> {
        GeneratorService::add_rule(&mut self.ledger, rule)
    }

    pub fn update_rule(&mut self, rule: JournalGenerationRule) -> Result<()> {
        GeneratorService::update_rule(&mut self.ledger, rule)
    }

    pub fn remove_rule(&mut self, id: &str) -> Result<JournalGenerationRule> {
        GeneratorService::remove_rule(&mut self.ledger, id)
    }

    pub fn set_transfer_limit(&mut self, from: &str, to: &str, max: f64) -> Result<()> {
        DivisionService::set_transfer_limit(&mut self.ledger, from, to, max)
    }

    pub fn division_balance(&self, code: &str) -> Result<f64> {
        DivisionService::balance(&self.ledger, code)
    }

    /// Records the owner and opens their receivable sub-ledger.
    pub fn register_unit_owner(&mut self, owner: UnitOwner) -> Result<()> {
        let receivable = self.config.default_accounts.receivable.clone();
        register_unit_owner_in(&mut self.ledger, &receivable, owner)
    }

    /// Records the vendor and opens their payable sub-ledger.
    pub fn register_vendor(&mut self, vendor: Vendor) -> Result<()> {
        let payable = self.config.default_accounts.payable.clone();
        register_vendor_in(&mut self.ledger, &payable, vendor)
    }

    pub fn auxiliary_balance(&self, master: &str, code: &str) -> Result<f64> {
        AuxiliaryService::balance(&self.ledger, master, code)
    }

    pub fn auxiliary_report(&self, master: &str, code: &str, range: DateRange) -> Result<AuxiliaryReport> {
        AuxiliaryService::report(&self.ledger, master, code, range)
    }

    // ---- reports -----------------------------------------------------------

    pub fn trial_balance(&self, range: DateRange, division: Option<&str>) -> Result<TrialBalance> {
        ReportService::trial_balance(&self.ledger, range, division)
    }

    pub fn income_statement(&self, range: DateRange, division: Option<&str>) -> Result<IncomeStatement> {
        ReportService::income_statement(&self.ledger, range, division)
    }

    pub fn balance_sheet(&self, as_of: NaiveDate, division: Option<&str>) -> Result<BalanceSheet> {
        ReportService::balance_sheet(&self.ledger, as_of, division)
    }

    pub fn balance_sheet_debug(&self, as_of: NaiveDate, division: Option<&str>) -> Vec<BalanceSheetDebugRow> {
        ReportService::balance_sheet_debug(&self.ledger, as_of, division)
    }

    /// Posts a closing journal; `None` when revenue and expense are already zero.
    pub fn close_period(&mut self, as_of: NaiveDate, division: Option<&str>) -> Result<Option<Uuid>> {
        let Some(input) = ReportService::closing_journal(
            &self.ledger,
            &self.config.default_accounts,
            as_of,
            division,
        )?
        else {
            return Ok(None);
        };
        let options = CreateOptions::posted().with_meta(META_SOURCE, "closing");
        let id = self.create_journal(input, options)?;
        tracing::info!(%as_of, "period closed");
        Ok(Some(id))
    }

    // ---- interchange -------------------------------------------------------

    pub fn import_json_data(&mut self, json: &str) -> Result<ImportReport> {
        let payload: ImportPayload = serde_json::from_str(json)?;
        self.import_payload(payload)
    }

    /// Applies an import to a working copy and swaps it in only when every item succeeds.
    pub fn import_payload(&mut self, payload: ImportPayload) -> Result<ImportReport> {
        let mut working = if payload.clear_existing {
            cleared(&self.ledger)
        } else {
            self.ledger.clone()
        };
        let defaults = self.config.default_accounts.clone();
        let actor = self.actor();
        let mut report = ImportReport::default();
        let mut errors = Vec::new();

        for owner in payload.unit_owners {
            let code = owner.code.clone();
            match register_unit_owner_in(&mut working, &defaults.receivable, owner) {
                Ok(()) => report.unit_owners += 1,
                Err(err) => errors.push(format!("unit owner {code}: {err}")),
            }
        }
        for vendor in payload.vendors {
            let code = vendor.code.clone();
            match register_vendor_in(&mut working, &defaults.payable, vendor) {
                Ok(()) => report.vendors += 1,
                Err(err) => errors.push(format!("vendor {code}: {err}")),
            }
        }
        if let Some(opening) = payload.opening_balances {
            let input = opening.to_input(OPERATING_DIVISION);
            let posted = JournalService::create(&mut working, input).and_then(|id| {
                JournalService::post(&mut working, id, &actor, Utc::now())
                    .map(|journal| journal.journal_number.clone())
            });
            match posted {
                Ok(number) => {
                    report.opening_balance_journal = Some(number);
                    report.journals_posted += 1;
                }
                Err(err) => errors.push(format!("opening balances: {err}")),
            }
        }
        for (idx, journal) in payload.journals.iter().enumerate() {
            match import_journal(&mut working, journal, &actor) {
                Ok(posted) => {
                    report.journals_created += 1;
                    if posted {
                        report.journals_posted += 1;
                    }
                }
                Err(err) => {
                    let label = journal
                        .number
                        .clone()
                        .unwrap_or_else(|| format!("#{}", idx + 1));
                    errors.push(format!("journal {label}: {err}"));
                }
            }
        }

        if !errors.is_empty() {
            tracing::warn!(errors = errors.len(), "import rejected");
            return Err(LedgerError::Validation(errors));
        }
        self.ledger = working;
        tracing::info!(
            journals = report.journals_created,
            posted = report.journals_posted,
            "import applied"
        );
        Ok(report)
    }

    /// Snapshot for export; a trial balance that cannot be built is logged and left out.
    pub fn export_data(&self) -> ExportPayload {
        let trial_balance = match ReportService::trial_balance(&self.ledger, DateRange::all(), None)
        {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::warn!(error = %err, "export written without trial balance");
                None
            }
        };
        ExportPayload {
            export_date: Utc::now(),
            journals: self.ledger.journals.clone(),
            unit_owners: self.ledger.unit_owners.clone(),
            vendors: self.ledger.vendors.clone(),
            trial_balance,
            divisions: self.ledger.divisions.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_data())?)
    }

    pub fn export_accounts_csv(&self) -> Result<String> {
        interchange::csv::accounts_to_csv(self.ledger.accounts.values())
    }

    /// Merges the table into the chart; imported rows replace same-code accounts.
    pub fn import_accounts_csv(&mut self, data: &str) -> Result<usize> {
        let imported = interchange::csv::accounts_from_csv(data)?;
        let count = imported.len();
        let mut merged = self.ledger.accounts.clone();
        for account in imported {
            merged.insert(account.code.clone(), account);
        }
        AccountService::rebuild_from(&mut self.ledger, merged.into_values().collect())?;
        Ok(count)
    }

    pub fn export_journals_csv(&self) -> Result<String> {
        interchange::csv::journals_to_csv(JournalService::list(&self.ledger, &JournalFilter::default()))
    }

    pub fn import_journals_csv(&mut self, data: &str) -> Result<ImportReport> {
        let journals = interchange::csv::journal_rows_from_csv(data)?;
        self.import_payload(ImportPayload {
            journals,
            ..ImportPayload::default()
        })
    }

    // ---- snapshots and storage ---------------------------------------------

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.ledger)?)
    }

    /// Replaces the ledger with a snapshot after checking it is internally consistent.
    pub fn restore(&mut self, data: &str) -> Result<()> {
        let ledger: Ledger = serde_json::from_str(data)?;
        self.replace_ledger(ledger)
    }

    fn replace_ledger(&mut self, mut ledger: Ledger) -> Result<()> {
        if ledger.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(LedgerError::Storage(format!(
                "ledger schema v{} is newer than supported v{}",
                ledger.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        build_directory(ledger.accounts.values().cloned().collect())?;
        ReportService::trial_balance(&ledger, DateRange::all(), None)?;
        for journal in &ledger.journals {
            ledger.sequence.observe(&journal.journal_number);
        }
        DivisionService::initialize(&mut ledger);
        tracing::info!(
            ledger = %ledger.name,
            journals = ledger.journal_count(),
            "ledger restored"
        );
        self.ledger = ledger;
        Ok(())
    }

    fn storage(&self) -> Result<&dyn StorageBackend> {
        self.storage
            .as_deref()
            .ok_or_else(|| LedgerError::Storage("no storage backend configured".into()))
    }

    pub fn save(&mut self) -> Result<()> {
        let name = self
            .current_name
            .clone()
            .ok_or_else(|| LedgerError::Storage("current ledger is unnamed".into()))?;
        self.storage()?.save(&self.ledger, &name)
    }

    pub fn save_as(&mut self, name: &str) -> Result<()> {
        self.storage()?.save(&self.ledger, name)?;
        self.current_name = Some(name.to_string());
        Ok(())
    }

    pub fn load(&mut self, name: &str) -> Result<()> {
        let ledger = self.storage()?.load(name)?;
        self.replace_ledger(ledger)?;
        self.current_name = Some(name.to_string());
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> Result<String> {
        let name = self
            .current_name
            .as_deref()
            .ok_or_else(|| LedgerError::Storage("current ledger is unnamed".into()))?;
        self.storage()?.backup(&self.ledger, name, note)
    }

    pub fn list_backups(&self) -> Result<Vec<String>> {
        match self.current_name.as_deref() {
            Some(name) => self.storage()?.list_backups(name),
            None => Ok(Vec::new()),
        }
    }

    pub fn restore_backup(&mut self, backup_name: &str) -> Result<()> {
        let name = self
            .current_name
            .clone()
            .ok_or_else(|| LedgerError::Storage("current ledger is unnamed".into()))?;
        let ledger = self.storage()?.restore(&name, backup_name)?;
        self.replace_ledger(ledger)
    }
}

/// Division whose position a posted line on `account` moves.
fn holding_division<'a>(account: &'a Account, journal_division: &'a str) -> Option<&'a str> {
    if account.account_type != AccountType::Asset {
        return None;
    }
    fund_division(account.division.as_deref(), Some(journal_division))
}

/// Same chart, rules, and numbering; no journals, balances, or master data.
fn cleared(ledger: &Ledger) -> Ledger {
    let mut fresh = ledger.clone();
    fresh.journals.clear();
    fresh.auxiliary_ledgers.clear();
    fresh.unit_owners.clear();
    fresh.vendors.clear();
    DivisionService::clear_transactions(&mut fresh);
    fresh.touch();
    fresh
}

fn register_unit_owner_in(ledger: &mut Ledger, receivable: &str, owner: UnitOwner) -> Result<()> {
    if owner.code.trim().is_empty() || owner.name.trim().is_empty() {
        return Err(LedgerError::invalid("unit owner code and name are required"));
    }
    AuxiliaryService::register(ledger, receivable, &owner.code, &owner.name)?;
    match ledger.unit_owners.iter_mut().find(|o| o.code == owner.code) {
        Some(existing) => *existing = owner,
        None => ledger.unit_owners.push(owner),
    }
    Ok(())
}

fn register_vendor_in(ledger: &mut Ledger, payable: &str, vendor: Vendor) -> Result<()> {
    if vendor.code.trim().is_empty() || vendor.name.trim().is_empty() {
        return Err(LedgerError::invalid("vendor code and name are required"));
    }
    AuxiliaryService::register(ledger, payable, &vendor.code, &vendor.name)?;
    match ledger.vendors.iter_mut().find(|v| v.code == vendor.code) {
        Some(existing) => *existing = vendor,
        None => ledger.vendors.push(vendor),
    }
    Ok(())
}

/// Returns whether the journal ended up posted.
fn import_journal(ledger: &mut Ledger, journal: &ImportJournal, actor: &str) -> Result<bool> {
    let input = journal.to_input(OPERATING_DIVISION);
    let id = match journal.number.as_deref() {
        Some(number) => JournalService::create_with_number(ledger, input, number)?,
        None => JournalService::create(ledger, input)?,
    };
    if let Some(created) = ledger.journals.iter_mut().find(|j| j.id == id) {
        created.meta.insert(META_SOURCE.into(), "import".into());
    }
    match journal.status.unwrap_or_default() {
        JournalStatus::Draft => Ok(false),
        JournalStatus::Posted => {
            JournalService::post(ledger, id, actor, Utc::now())?;
            Ok(true)
        }
        JournalStatus::Cancelled => {
            JournalService::cancel(ledger, id, "cancelled before import", Utc::now())?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PaymentStatus, RESERVE_DIVISION};

    fn manager() -> LedgerManager {
        LedgerManager::new("Facade", Config::default())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    #[test]
    fn failed_auto_post_leaves_no_draft() {
        let mut manager = manager();
        let input = JournalInput::new(day(1), "unbalanced", OPERATING_DIVISION)
            .line(JournalLine::debit("1101", 10.0))
            .line(JournalLine::credit("5101", 9.0));
        assert!(manager.create_journal(input, CreateOptions::posted()).is_err());
        assert_eq!(manager.ledger().journal_count(), 0);
    }

    #[test]
    fn meta_is_attached_to_created_journals() {
        let mut manager = manager();
        let input = JournalInput::new(day(2), "fees", OPERATING_DIVISION)
            .line(JournalLine::debit("1101", 10.0))
            .line(JournalLine::credit("5101", 10.0));
        let id = manager
            .create_journal(input, CreateOptions::default().with_meta("batch", "42"))
            .unwrap();
        assert_eq!(manager.journal(id).unwrap().meta.get("batch").map(String::as_str), Some("42"));
    }

    #[test]
    fn reserve_transfer_out_is_rejected_before_journaling() {
        let mut manager = manager();
        let transfer = DivisionTransfer {
            from_division: RESERVE_DIVISION.into(),
            to_division: OPERATING_DIVISION.into(),
            from_account: "1103".into(),
            to_account: "1102".into(),
            amount: 100.0,
            date: day(3),
            description: "borrow from reserve".into(),
        };
        assert!(matches!(
            manager.transfer_between_divisions(&transfer),
            Err(LedgerError::TransferLimitExceeded { .. })
        ));
        assert_eq!(manager.ledger().journal_count(), 0);
    }

    #[test]
    fn operating_can_fund_reserve() {
        let mut manager = manager();
        let transfer = DivisionTransfer {
            from_division: OPERATING_DIVISION.into(),
            to_division: RESERVE_DIVISION.into(),
            from_account: "1102".into(),
            to_account: "1103".into(),
            amount: 2_500.0,
            date: day(4),
            description: "monthly reserve contribution".into(),
        };
        manager.transfer_between_divisions(&transfer).unwrap();
        assert_eq!(manager.division_balance(RESERVE_DIVISION).unwrap(), 2_500.0);
        assert_eq!(manager.division_balance(OPERATING_DIVISION).unwrap(), -2_500.0);
    }

    #[test]
    fn transfer_accounts_must_hold_the_named_funds() {
        let mut manager = manager();
        let interest = JournalInput::new(day(3), "reserve interest", RESERVE_DIVISION)
            .line(JournalLine::debit("1103", 1_000.0))
            .line(JournalLine::credit("5103", 1_000.0));
        manager.create_journal(interest, CreateOptions::posted()).unwrap();

        let mislabelled = DivisionTransfer {
            from_division: OPERATING_DIVISION.into(),
            to_division: RESERVE_DIVISION.into(),
            from_account: "1103".into(),
            to_account: "1102".into(),
            amount: 1_000.0,
            date: day(4),
            description: "mislabelled transfer".into(),
        };
        let err = manager.transfer_between_divisions(&mislabelled).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "account 1103 does not hold OPERATING funds".to_string(),
                "account 1102 does not hold RESERVE funds".to_string(),
            ]
        );
        assert_eq!(manager.division_balance(RESERVE_DIVISION).unwrap(), 1_000.0);
        assert_eq!(manager.division_balance(OPERATING_DIVISION).unwrap(), 0.0);
        assert_eq!(manager.ledger().journal_count(), 1);
    }

    #[test]
    fn export_omits_trial_balance_of_unbalanced_book() {
        let mut manager = manager();
        let input = JournalInput::new(day(5), "dues", OPERATING_DIVISION)
            .line(JournalLine::debit("1102", 300.0))
            .line(JournalLine::credit("5101", 300.0));
        manager.create_journal(input, CreateOptions::posted()).unwrap();
        assert!(manager.export_data().trial_balance.is_some());

        manager.ledger.journals[0].lines[0].debit_amount = 310.0;
        let payload = manager.export_data();
        assert!(payload.trial_balance.is_none());
        assert_eq!(payload.journals.len(), 1);
    }

    #[test]
    fn rows_are_all_or_nothing() {
        let mut manager = manager();
        let template = RowTemplate {
            transaction_type: crate::ledger::TransactionType::Income,
            account_code: "5102".into(),
            status: PaymentStatus::Paid,
            payment_account_code: Some("1102".into()),
            division_code: OPERATING_DIVISION.into(),
        };
        let rows = vec![
            TabularRow {
                date: day(5),
                description: "Parking A-1".into(),
                amount: 40.0,
            },
            TabularRow {
                date: day(6),
                description: "Parking refund".into(),
                amount: -40.0,
            },
        ];
        let err = manager.create_from_rows(&rows, &template, true).unwrap_err();
        assert!(err.messages()[0].starts_with("row 2:"), "{err}");
        assert_eq!(manager.ledger().journal_count(), 0);

        let ids = manager.create_from_rows(&rows[..1], &template, true).unwrap();
        assert_eq!(ids.len(), 1);
        assert!(manager.journal(ids[0]).unwrap().is_posted());
    }

    #[test]
    fn hint_must_pass_posting_checks() {
        let mut manager = manager();
        let mut hint = ClassificationHint {
            description: "Water bill".into(),
            date: day(7),
            amount: 80.0,
            debit_account: "6201".into(),
            credit_account: "6200".into(),
            confidence: 0.9,
            division: None,
        };
        let err = manager.create_from_hint(&hint).unwrap_err();
        assert!(err.to_string().contains("group account"), "{err}");

        hint.credit_account = "2101".into();
        let id = manager.create_from_hint(&hint).unwrap();
        let journal = manager.journal(id).unwrap();
        assert!(journal.is_draft());
        assert_eq!(journal.meta.get("confidence").map(String::as_str), Some("0.90"));
    }

    #[test]
    fn storage_operations_need_a_backend() {
        let mut manager = manager();
        assert!(matches!(manager.save_as("x"), Err(LedgerError::Storage(_))));
        assert!(matches!(manager.save(), Err(LedgerError::Storage(_))));
        assert!(manager.list_backups().unwrap().is_empty());
    }
}
