//! Value objects shared across the pipeline: the raw imported row, account
//! descriptors, and the normalized transaction ready for submission.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger transaction type. `Unknown` never leaves the pipeline; every
/// transaction exits as withdrawal, deposit, or transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "deposit" => Ok(TransactionType::Deposit),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(()),
        }
    }
}

/// Ledger account classification, as confirmed by the remote ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Expense,
    Revenue,
    Loan,
    Debt,
    Mortgage,
    Liabilities,
    Cash,
    Unknown,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Expense => "expense",
            AccountType::Revenue => "revenue",
            AccountType::Loan => "loan",
            AccountType::Debt => "debt",
            AccountType::Mortgage => "mortgage",
            AccountType::Liabilities => "liabilities",
            AccountType::Cash => "cash",
            AccountType::Unknown => "unknown",
        }
    }

    /// Account kinds the resolver may match by name. Expense and revenue
    /// accounts are left for the ledger to resolve or create.
    pub fn matchable_by_name(&self) -> bool {
        matches!(
            self,
            AccountType::Asset | AccountType::Loan | AccountType::Debt | AccountType::Mortgage
        )
    }
}

impl FromStr for AccountType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" => Ok(AccountType::Asset),
            "expense" => Ok(AccountType::Expense),
            "revenue" => Ok(AccountType::Revenue),
            "loan" => Ok(AccountType::Loan),
            "debt" => Ok(AccountType::Debt),
            "mortgage" => Ok(AccountType::Mortgage),
            "liabilities" => Ok(AccountType::Liabilities),
            "cash" => Ok(AccountType::Cash),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the transaction an account descriptor belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Source,
    Destination,
}

/// A raw, not-yet-resolved transaction row as handed over by an upstream
/// format adapter (CSV mapping, CAMT field extraction, bank API).
///
/// Absent and empty-string values mean the same thing everywhere: the field
/// carries no data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PseudoTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub currency_code: Option<String>,
    pub foreign_currency_code: Option<String>,

    /// Provisional transaction type supplied by the adapter, if any.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,

    // Amount candidates, in precedence order. Exactly one is expected to
    // carry the authoritative signed value.
    pub amount: Option<String>,
    pub amount_debit: Option<String>,
    pub amount_credit: Option<String>,
    pub amount_negated: Option<String>,
    /// Multiplier applied to the selected amount ("1" when absent).
    pub amount_modifier: Option<String>,
    pub foreign_amount: Option<String>,

    pub source_id: Option<u64>,
    pub source_name: Option<String>,
    pub source_iban: Option<String>,
    pub source_number: Option<String>,
    pub source_bic: Option<String>,

    pub destination_id: Option<u64>,
    pub destination_name: Option<String>,
    pub destination_iban: Option<String>,
    pub destination_number: Option<String>,
    pub destination_bic: Option<String>,

    /// Counterparty data exactly as the bank supplied it, kept aside so the
    /// assembler can fall back to it when a resolved account is distrusted.
    #[serde(rename = "original-opposing-name")]
    pub original_opposing_name: Option<String>,
    #[serde(rename = "original-opposing-iban")]
    pub original_opposing_iban: Option<String>,
    #[serde(rename = "original-opposing-number")]
    pub original_opposing_number: Option<String>,

    /// Tag lists already split upstream (comma-separated column and
    /// space-separated column respectively).
    pub tags_comma: Vec<String>,
    pub tags_space: Vec<String>,
}

impl PseudoTransaction {
    /// Descriptor for the source side of this row.
    pub fn source_descriptor(&self) -> AccountDescriptor {
        AccountDescriptor {
            id: self.source_id,
            name: self.source_name.clone(),
            iban: self.source_iban.clone(),
            number: self.source_number.clone(),
            bic: self.source_bic.clone(),
            account_type: None,
            direction: Direction::Source,
        }
    }

    /// Descriptor for the destination side of this row.
    pub fn destination_descriptor(&self) -> AccountDescriptor {
        AccountDescriptor {
            id: self.destination_id,
            name: self.destination_name.clone(),
            iban: self.destination_iban.clone(),
            number: self.destination_number.clone(),
            bic: self.destination_bic.clone(),
            account_type: None,
            direction: Direction::Destination,
        }
    }

    /// Provisional type as declared by the adapter, if parseable.
    pub fn declared_type(&self) -> Option<TransactionType> {
        self.transaction_type.as_deref().and_then(|s| s.parse().ok())
    }
}

/// A partial account identification, refined in place as resolution
/// proceeds. `account_type` is only set once the ledger has confirmed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDescriptor {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub iban: Option<String>,
    pub number: Option<String>,
    pub bic: Option<String>,
    pub account_type: Option<AccountType>,
    pub direction: Direction,
}

impl AccountDescriptor {
    pub fn empty(direction: Direction) -> Self {
        AccountDescriptor {
            id: None,
            name: None,
            iban: None,
            number: None,
            bic: None,
            account_type: None,
            direction,
        }
    }

    /// True when no identifying field carries data.
    pub fn is_blank(&self) -> bool {
        self.id.is_none()
            && !has_text(&self.name)
            && !has_text(&self.iban)
            && !has_text(&self.number)
    }

    /// Returns the same descriptor assigned to the other side.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// True when an optional field holds a non-empty string.
pub(crate) fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// The normalized output record, shaped like the ledger's
/// transaction-creation payload.
///
/// Exit invariants: `amount` is a non-negative decimal string, `tags` has no
/// duplicates, a withdrawal's destination and a deposit's source each carry
/// at least one identifying field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionGroupRecord {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_currency_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_number: Option<String>,

    pub tags: Vec<String>,
}

impl TransactionGroupRecord {
    /// True when the destination carries no identifying field.
    pub fn destination_is_blank(&self) -> bool {
        self.destination_id.is_none()
            && !has_text(&self.destination_name)
            && !has_text(&self.destination_iban)
            && !has_text(&self.destination_number)
    }

    /// True when the source carries no identifying field.
    pub fn source_is_blank(&self) -> bool {
        self.source_id.is_none()
            && !has_text(&self.source_name)
            && !has_text(&self.source_iban)
            && !has_text(&self.source_number)
    }
}
