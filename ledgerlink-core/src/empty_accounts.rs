//! Last-resort account filler. The ledger refuses a withdrawal without a
//! destination and a deposit without a source, so residually blank sides get
//! a literal placeholder name. Runs last, after all resolution attempts.

use log::debug;

use crate::model::{TransactionGroupRecord, TransactionType};

/// Placeholder for accounts that stayed blank through the whole pipeline.
pub const NO_NAME: &str = "(no name)";

/// Fill a withdrawal's blank destination or a deposit's blank source with
/// the [`NO_NAME`] placeholder. A side with any identifying field (id, name,
/// IBAN, or number) is left untouched.
pub fn fill_empty_accounts(mut tx: TransactionGroupRecord) -> TransactionGroupRecord {
    match tx.transaction_type {
        TransactionType::Withdrawal if tx.destination_is_blank() => {
            debug!("withdrawal destination is blank, using placeholder name");
            tx.destination_name = Some(NO_NAME.to_string());
        }
        TransactionType::Deposit if tx.source_is_blank() => {
            debug!("deposit source is blank, using placeholder name");
            tx.source_name = Some(NO_NAME.to_string());
        }
        _ => {}
    }
    tx
}
