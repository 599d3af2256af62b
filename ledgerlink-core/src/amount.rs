//! Amount resolution: picks the authoritative amount field among the four
//! candidates, applies the sign modifier, and guesses a provisional
//! transaction type from the resulting sign.
//!
//! All arithmetic and zero checks are exact decimal operations. `"0.00"`,
//! `"0"` and `"-0"` are all treated as absent, which keeps the candidate
//! precedence correct for exports that pad unused columns with zeros.

use log::debug;
use rust_decimal::Decimal;

use crate::error::PipelineError;
use crate::model::{PseudoTransaction, TransactionType};

/// Output of the amount stage. The raw candidate fields and the modifier are
/// consumed here and never appear in the final record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAmount {
    /// Signed amount: the selected candidate times the modifier.
    pub amount: Decimal,
    /// Signed foreign amount, if the row carried one.
    pub foreign_amount: Option<Decimal>,
    /// Sign-derived guess: negative = withdrawal, positive = deposit.
    pub provisional_type: Option<TransactionType>,
}

/// Select the authoritative amount for a raw row.
///
/// Candidates are tried in strict precedence order: `amount`, `amount_debit`,
/// `amount_credit`, `amount_negated`. The first one that parses to a non-zero
/// decimal wins. A row where none qualifies, or where the product with the
/// modifier is zero, is flagged as `InvalidAmount`.
pub fn resolve_amount(tx: &PseudoTransaction) -> Result<ResolvedAmount, PipelineError> {
    let modifier = tx
        .amount_modifier
        .as_deref()
        .and_then(parse_decimal)
        .unwrap_or(Decimal::ONE);

    let Some((field, raw)) = select_candidate(tx) else {
        return Err(PipelineError::InvalidAmount);
    };
    let amount = raw * modifier;
    if amount.is_zero() {
        // A zero modifier can zero out an otherwise valid candidate.
        return Err(PipelineError::InvalidAmount);
    }
    debug!("amount: selected field \"{field}\", signed value {amount}");

    let foreign_amount = tx
        .foreign_amount
        .as_deref()
        .and_then(parse_decimal)
        .map(|f| f * modifier);

    let provisional_type = if amount < Decimal::ZERO {
        Some(TransactionType::Withdrawal)
    } else {
        Some(TransactionType::Deposit)
    };

    Ok(ResolvedAmount {
        amount,
        foreign_amount,
        provisional_type,
    })
}

/// First candidate field whose value is present and decimal-nonzero.
fn select_candidate(tx: &PseudoTransaction) -> Option<(&'static str, Decimal)> {
    let candidates = [
        ("amount", &tx.amount),
        ("amount_debit", &tx.amount_debit),
        ("amount_credit", &tx.amount_credit),
        ("amount_negated", &tx.amount_negated),
    ];
    for (field, value) in candidates {
        let Some(raw) = value.as_deref() else {
            continue;
        };
        match parse_decimal(raw) {
            Some(parsed) if !parsed.is_zero() => return Some((field, parsed)),
            _ => continue,
        }
    }
    None
}

/// Decimal parse for money columns: trims whitespace, drops a leading `+`,
/// and strips commas only when they form strict thousands grouping
/// ("1,234.56"). Any other comma use is rejected rather than guessed at;
/// "-12,50" could be comma-decimal notation and must surface as an invalid
/// amount, not parse as minus twelve hundred and fifty.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches('+');
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains(',') {
        if !is_comma_grouped(cleaned) {
            return None;
        }
        return cleaned.replace(',', "").parse::<Decimal>().ok();
    }
    cleaned.parse::<Decimal>().ok()
}

/// True when every comma in a dot-decimal number sits on a thousands
/// boundary: 1 to 3 leading digits, then groups of exactly 3.
fn is_comma_grouped(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let integer_part = unsigned.split('.').next().unwrap_or("");
    let mut groups = integer_part.split(',');
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut grouped = false;
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        grouped = true;
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> PseudoTransaction {
        PseudoTransaction::default()
    }

    #[test]
    fn test_amount_wins_over_debit() {
        let mut tx = row();
        tx.amount = Some("-12.34".to_string());
        tx.amount_debit = Some("99.99".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-12.34));
        assert_eq!(resolved.provisional_type, Some(TransactionType::Withdrawal));
    }

    #[test]
    fn test_zero_amount_falls_through_to_debit() {
        let mut tx = row();
        tx.amount = Some("0.00".to_string());
        tx.amount_debit = Some("-5.00".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-5.00));
    }

    #[test]
    fn test_zero_equivalence_is_decimal_exact() {
        for zero in ["0", "0.00", "-0", "0.000000"] {
            let mut tx = row();
            tx.amount = Some(zero.to_string());
            tx.amount_credit = Some("7.50".to_string());
            let resolved = resolve_amount(&tx).unwrap();
            assert_eq!(resolved.amount, dec!(7.50), "zero variant {zero:?}");
        }
    }

    #[test]
    fn test_no_candidate_is_invalid_amount() {
        let mut tx = row();
        tx.amount = Some("".to_string());
        tx.amount_negated = Some("0".to_string());
        assert_eq!(resolve_amount(&tx), Err(PipelineError::InvalidAmount));
    }

    #[test]
    fn test_modifier_flips_sign() {
        let mut tx = row();
        tx.amount_negated = Some("25.00".to_string());
        tx.amount_modifier = Some("-1".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-25.00));
        assert_eq!(resolved.provisional_type, Some(TransactionType::Withdrawal));
    }

    #[test]
    fn test_zero_modifier_is_invalid_amount() {
        let mut tx = row();
        tx.amount = Some("10.00".to_string());
        tx.amount_modifier = Some("0".to_string());
        assert_eq!(resolve_amount(&tx), Err(PipelineError::InvalidAmount));
    }

    #[test]
    fn test_foreign_amount_gets_same_modifier() {
        let mut tx = row();
        tx.amount = Some("100.00".to_string());
        tx.foreign_amount = Some("110.50".to_string());
        tx.amount_modifier = Some("-1".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-100.00));
        assert_eq!(resolved.foreign_amount, Some(dec!(-110.50)));
    }

    #[test]
    fn test_exact_precision_no_drift() {
        let mut tx = row();
        tx.amount = Some("0.10".to_string());
        tx.amount_modifier = Some("3".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(0.30));
    }

    #[test]
    fn test_thousands_separator_and_plus_sign() {
        let mut tx = row();
        tx.amount = Some("+1,234.56".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(1234.56));
        assert_eq!(resolved.provisional_type, Some(TransactionType::Deposit));
    }

    #[test]
    fn test_comma_decimal_notation_is_not_misread() {
        // "-12,50" is European comma-decimal; stripping the comma would
        // inflate the amount a hundredfold. It must fail instead.
        let mut tx = row();
        tx.amount = Some("-12,50".to_string());
        assert_eq!(resolve_amount(&tx), Err(PipelineError::InvalidAmount));
    }

    #[test]
    fn test_mixed_european_notation_is_not_misread() {
        let mut tx = row();
        tx.amount = Some("1.234,56".to_string());
        assert_eq!(resolve_amount(&tx), Err(PipelineError::InvalidAmount));
    }

    #[test]
    fn test_malformed_grouping_falls_through_to_next_candidate() {
        let mut tx = row();
        tx.amount = Some("12,3,4".to_string());
        tx.amount_debit = Some("-8.00".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-8.00));
    }

    #[test]
    fn test_multi_group_thousands_still_parse() {
        let mut tx = row();
        tx.amount = Some("-1,234,567.89".to_string());
        let resolved = resolve_amount(&tx).unwrap();
        assert_eq!(resolved.amount, dec!(-1234567.89));
    }
}
