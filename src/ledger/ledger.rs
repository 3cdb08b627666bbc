use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account, auxiliary::AuxiliaryLedger, division::Division, journal::Journal,
    journal::JournalSequence, rule::JournalGenerationRule,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Unit-owner master data; each owner gets a receivable sub-ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnitOwner {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Vendor master data; each vendor gets a payable sub-ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_number: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Serializable aggregate holding every piece of ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    /// Chart of accounts keyed by code; the tree lives in `parent_code`.
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub auxiliary_ledgers: Vec<AuxiliaryLedger>,
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub sequence: JournalSequence,
    #[serde(default)]
    pub rules: Vec<JournalGenerationRule>,
    #[serde(default)]
    pub unit_owners: Vec<UnitOwner>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    /// Creates an empty ledger; see [`crate::core::seed`] for the standard chart.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            accounts: BTreeMap::new(),
            divisions: Vec::new(),
            auxiliary_ledgers: Vec::new(),
            journals: Vec::new(),
            sequence: JournalSequence::default(),
            rules: Vec::new(),
            unit_owners: Vec::new(),
            vendors: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn account(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn division(&self, code: &str) -> Option<&Division> {
        self.divisions.iter().find(|division| division.code == code)
    }

    pub fn journal(&self, id: Uuid) -> Option<&Journal> {
        self.journals.iter().find(|journal| journal.id == id)
    }

    pub fn journal_by_number(&self, number: &str) -> Option<&Journal> {
        self.journals
            .iter()
            .find(|journal| journal.journal_number == number)
    }

    pub fn posted_journals(&self) -> impl Iterator<Item = &Journal> {
        self.journals.iter().filter(|journal| journal.is_posted())
    }

    pub fn journal_count(&self) -> usize {
        self.journals.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
