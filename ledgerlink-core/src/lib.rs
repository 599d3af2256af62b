//! ledgerlink-core: data model and the pure stages of the transaction
//! normalization pipeline (amount precedence, tag merging, type inference,
//! final amount/account normalizers).

pub mod amount;
pub mod empty_accounts;
pub mod error;
pub mod model;
pub mod positive_amount;
pub mod tags;
pub mod typing;

pub use amount::{ResolvedAmount, resolve_amount};
pub use empty_accounts::{NO_NAME, fill_empty_accounts};
pub use error::PipelineError;
pub use model::{
    AccountDescriptor, AccountType, Direction, PseudoTransaction, TransactionGroupRecord,
    TransactionType,
};
pub use positive_amount::force_positive_amounts;
pub use tags::merge_tags;
pub use typing::{AccountPairTable, default_pair_table, determine_type};
