use database::DbError;
use events::EventError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The event payload is malformed or of an unknown type. The event stays
    /// unposted; correction or dead-lettering is the caller's responsibility.
    #[error("Event failed validation: {0}")]
    Validation(#[from] EventError),

    #[error("Invalid amount for {context}: {amount}")]
    InvalidAmount { context: String, amount: Decimal },

    /// Debits and credits disagree after mapping. This is a mapping-rule bug,
    /// not a data problem; the posting is aborted and must alert.
    #[error("Imbalanced posting: debits {debits} != credits {credits}")]
    ImbalancedPosting { debits: Decimal, credits: Decimal },

    #[error("Account code {0} is missing from the chart of accounts for merchant {1}")]
    MissingAccount(String, Uuid),

    #[error(transparent)]
    Db(#[from] DbError),
}
