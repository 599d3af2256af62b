//! Final amount normalizer: the ledger API requires non-negative amounts,
//! with direction expressed purely through the transaction type. Must run
//! after account assembly, which still needs the sign.

use rust_decimal::Decimal;

use crate::model::TransactionGroupRecord;

/// Force `amount` (and `foreign_amount`, when present) to be non-negative
/// decimal strings. A missing or unparseable amount becomes `"0"`.
/// Idempotent: applying twice equals applying once.
pub fn force_positive_amounts(mut tx: TransactionGroupRecord) -> TransactionGroupRecord {
    tx.amount = positive_string(&tx.amount);
    tx.foreign_amount = tx.foreign_amount.as_deref().map(positive_string);
    tx
}

fn positive_string(raw: &str) -> String {
    raw.trim()
        .parse::<Decimal>()
        .map(|d| d.abs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
