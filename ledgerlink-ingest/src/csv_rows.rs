//! CSV adapter: applies a [`ColumnMapping`] to each row and produces raw
//! [`PseudoTransaction`] records for the pipeline. Dates are re-emitted in
//! ISO form; tag columns are split here (comma and whitespace variants), so
//! the downstream tag merger only deduplicates.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

use ledgerlink_core::model::PseudoTransaction;

use crate::mapping::{ColumnMapping, ColumnRole};

/// Parse CSV input into raw transaction records using the given mapping.
pub fn parse_csv<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Vec<PseudoTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(mapping.has_headers)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("reading CSV line {}", line + 1))?;
        records.push(map_row(&row, mapping, line + 1));
    }
    Ok(records)
}

fn map_row(row: &csv::StringRecord, mapping: &ColumnMapping, line: usize) -> PseudoTransaction {
    let mut tx = PseudoTransaction::default();
    for (role, value) in mapping.roles.iter().zip(row.iter()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        apply_role(&mut tx, *role, value, &mapping.date_format, line);
    }
    tx
}

fn apply_role(
    tx: &mut PseudoTransaction,
    role: ColumnRole,
    value: &str,
    date_format: &str,
    line: usize,
) {
    match role {
        ColumnRole::Ignore => {}
        ColumnRole::Date => match NaiveDate::parse_from_str(value, date_format) {
            Ok(date) => tx.date = Some(date.format("%Y-%m-%d").to_string()),
            Err(_) => {
                warn!("line {line}: unparseable date {value:?}, keeping raw value");
                tx.date = Some(value.to_string());
            }
        },
        ColumnRole::Description => tx.description = Some(value.to_string()),
        ColumnRole::Currency => tx.currency_code = Some(value.to_string()),
        ColumnRole::ForeignCurrency => tx.foreign_currency_code = Some(value.to_string()),
        ColumnRole::Amount => tx.amount = Some(value.to_string()),
        ColumnRole::AmountDebit => tx.amount_debit = Some(value.to_string()),
        ColumnRole::AmountCredit => tx.amount_credit = Some(value.to_string()),
        ColumnRole::AmountNegated => tx.amount_negated = Some(value.to_string()),
        ColumnRole::AmountModifier => tx.amount_modifier = Some(value.to_string()),
        ColumnRole::ForeignAmount => tx.foreign_amount = Some(value.to_string()),
        ColumnRole::Type => tx.transaction_type = Some(value.to_string()),
        ColumnRole::SourceId => tx.source_id = parse_id(value, "source id", line),
        ColumnRole::SourceName => tx.source_name = Some(value.to_string()),
        ColumnRole::SourceIban => tx.source_iban = Some(checked_iban(value, line)),
        ColumnRole::SourceNumber => tx.source_number = Some(value.to_string()),
        ColumnRole::SourceBic => tx.source_bic = Some(value.to_string()),
        ColumnRole::DestinationId => tx.destination_id = parse_id(value, "destination id", line),
        ColumnRole::DestinationName => tx.destination_name = Some(value.to_string()),
        ColumnRole::DestinationIban => tx.destination_iban = Some(checked_iban(value, line)),
        ColumnRole::DestinationNumber => tx.destination_number = Some(value.to_string()),
        ColumnRole::DestinationBic => tx.destination_bic = Some(value.to_string()),
        ColumnRole::OpposingName => tx.original_opposing_name = Some(value.to_string()),
        ColumnRole::OpposingIban => tx.original_opposing_iban = Some(value.to_string()),
        ColumnRole::OpposingNumber => tx.original_opposing_number = Some(value.to_string()),
        ColumnRole::TagsComma => tx.tags_comma = split_tags(value, ','),
        ColumnRole::TagsSpace => tx.tags_space = split_tags_whitespace(value),
    }
}

fn parse_id(value: &str, what: &str, line: usize) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            warn!("line {line}: {what} {value:?} is not a positive integer, dropping it");
            None
        }
    }
}

/// Split a tag column on a separator, trimming and dropping empty parts.
fn split_tags(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_tags_whitespace(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn iban_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}\d{2}[A-Za-z0-9]{1,30}$").unwrap())
}

/// IBAN shape check. A malformed value is kept (the resolver simply won't
/// match on it), normalized to uppercase without inner spaces.
fn checked_iban(value: &str, line: usize) -> String {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if !iban_shape().is_match(&compact) {
        warn!("line {line}: value {value:?} does not look like an IBAN");
    }
    compact
}
