//! ledgerlink-import: the remote-lookup half of the normalization pipeline.
//! Account role resolution against the ledger API, transaction assembly
//! (sign-driven swaps and contradiction repair), and the batch runner.

pub mod accounts;
pub mod lookup;
pub mod pipeline;
pub mod resolver;

pub use accounts::assemble_accounts;
pub use lookup::{AccountLookup, LedgerAccount, LedgerClient, LookupError, SearchField, StubLookup};
pub use pipeline::{BatchOutcome, Pipeline, PipelineConfig, RecordOutcome};
pub use resolver::AccountResolver;
