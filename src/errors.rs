use thiserror::Error;
use uuid::Uuid;

/// Error type that captures ledger, reporting, and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Illegal state transition: {0}")]
    State(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Division not found: {0}")]
    DivisionNotFound(String),
    #[error("Journal not found: {0}")]
    JournalNotFound(Uuid),
    #[error("Auxiliary ledger not found: {master}/{code}")]
    AuxiliaryNotFound { master: String, code: String },
    #[error("No journal generation rule matches {0}")]
    RuleNotFound(String),
    #[error("Transfer of {amount:.2} from {from} to {to} is not permitted{}", limit_suffix(.limit))]
    TransferLimitExceeded {
        from: String,
        to: String,
        amount: f64,
        limit: Option<f64>,
    },
    #[error("Ledger consistency failure: total debit {total_debit:.2} != total credit {total_credit:.2}")]
    Consistency { total_debit: f64, total_credit: f64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Builds a validation error from a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        LedgerError::Validation(vec![message.into()])
    }

    /// Returns true for the unknown account/division/journal/auxiliary family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_)
                | LedgerError::DivisionNotFound(_)
                | LedgerError::JournalNotFound(_)
                | LedgerError::AuxiliaryNotFound { .. }
        )
    }

    /// Itemized messages suitable for rendering next to the offending fields.
    pub fn messages(&self) -> Vec<String> {
        match self {
            LedgerError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

fn limit_suffix(limit: &Option<f64>) -> String {
    match limit {
        Some(max) => format!(" (limit {max:.2})"),
        None => " (restricted division)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_joins_items() {
        let err = LedgerError::Validation(vec!["date is required".into(), "unbalanced".into()]);
        assert_eq!(
            err.to_string(),
            "Validation failed: date is required; unbalanced"
        );
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn transfer_error_mentions_limit() {
        let err = LedgerError::TransferLimitExceeded {
            from: "OPERATING".into(),
            to: "RESERVE".into(),
            amount: 500.0,
            limit: Some(100.0),
        };
        assert!(err.to_string().contains("limit 100.00"));
    }

    #[test]
    fn not_found_family() {
        assert!(LedgerError::AccountNotFound("9999".into()).is_not_found());
        assert!(!LedgerError::State("posted".into()).is_not_found());
    }
}
