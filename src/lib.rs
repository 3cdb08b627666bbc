#![doc(test(attr(deny(warnings))))]

//! Fund Ledger is a double-entry bookkeeping core for fund-partitioned
//! organizations: journals with a draft/post/cancel lifecycle, rule-driven
//! journal generation, divisions with transfer limits, auxiliary sub-ledgers,
//! and balance-checked financial reports.

pub mod config;
pub mod core;
pub mod errors;
pub mod interchange;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use crate::core::{CreateOptions, DivisionTransfer, LedgerManager};
pub use errors::{LedgerError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Fund ledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
