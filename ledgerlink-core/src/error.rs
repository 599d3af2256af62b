//! Pipeline error taxonomy. Per-transaction errors never abort a batch; they
//! are accumulated against the record's index and reported alongside the
//! transformed output.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// None of the amount candidate fields carried a usable non-zero value.
    #[error("no usable amount found among amount/debit/credit/negated fields")]
    InvalidAmount,

    /// A remote account lookup failed (transport or API error). Aborts
    /// resolution for the current descriptor only.
    #[error("account lookup failed: {0}")]
    Resolution(String),

    /// The ledger rejected the submitted transaction.
    #[error("ledger rejected transaction: {0}")]
    Submission(String),
}
