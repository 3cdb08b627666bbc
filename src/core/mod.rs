//! Orchestration layer: stateless services, seed data, and the ledger facade.

pub mod ledger_manager;
pub mod seed;
pub mod services;
pub mod utils;

pub use ledger_manager::{CreateOptions, DivisionTransfer, LedgerManager};
