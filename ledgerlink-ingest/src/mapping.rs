//! Column-role mapping: which pipeline field each CSV column feeds.

use serde::{Deserialize, Serialize};

/// Role of one CSV column. `Ignore` columns are skipped entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnRole {
    Ignore,
    Date,
    Description,
    Currency,
    ForeignCurrency,
    Amount,
    AmountDebit,
    AmountCredit,
    AmountNegated,
    AmountModifier,
    ForeignAmount,
    Type,
    SourceId,
    SourceName,
    SourceIban,
    SourceNumber,
    SourceBic,
    DestinationId,
    DestinationName,
    DestinationIban,
    DestinationNumber,
    DestinationBic,
    OpposingName,
    OpposingIban,
    OpposingNumber,
    TagsComma,
    TagsSpace,
}

/// Mapping from column positions to roles, plus the date layout of the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnMapping {
    /// One role per column, in file order. Extra columns beyond the list
    /// are ignored.
    pub roles: Vec<ColumnRole>,
    /// chrono format string for `Date` columns, e.g. `%Y-%m-%d`.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Whether the file's first row is a header row.
    #[serde(default)]
    pub has_headers: bool,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl ColumnMapping {
    pub fn new(roles: Vec<ColumnRole>) -> Self {
        ColumnMapping {
            roles,
            date_format: default_date_format(),
            has_headers: false,
        }
    }
}
