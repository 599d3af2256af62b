//! Transaction type inference from the resolved source and destination
//! account types. A pure function over an injected account-pair table, so
//! the decision logic is testable without any configuration machinery.

use log::debug;
use std::collections::HashMap;

use crate::model::{AccountType, TransactionType};

/// Maps a (source type, destination type) pair to a transaction type.
pub type AccountPairTable = HashMap<(AccountType, AccountType), TransactionType>;

/// The standard pair table. Consulted only after the hard-wired rules in
/// [`determine_type`]; pairs without an entry fall back to withdrawal.
pub fn default_pair_table() -> AccountPairTable {
    use AccountType::*;
    use TransactionType::*;

    let mut table = AccountPairTable::new();
    table.insert((Asset, Asset), Transfer);
    table.insert((Asset, Expense), Withdrawal);
    table.insert((Asset, Cash), Withdrawal);
    table.insert((Asset, Loan), Withdrawal);
    table.insert((Asset, Debt), Withdrawal);
    table.insert((Asset, Mortgage), Withdrawal);
    table.insert((Asset, Liabilities), Withdrawal);

    table.insert((Cash, Asset), Deposit);
    table.insert((Cash, Expense), Withdrawal);

    table.insert((Loan, Asset), Deposit);
    table.insert((Debt, Asset), Deposit);
    table.insert((Mortgage, Asset), Deposit);
    table.insert((Liabilities, Asset), Deposit);

    table.insert((Loan, Expense), Withdrawal);
    table.insert((Debt, Expense), Withdrawal);
    table.insert((Mortgage, Expense), Withdrawal);

    // Like-for-like liability movements are transfers.
    table.insert((Loan, Loan), Transfer);
    table.insert((Debt, Debt), Transfer);
    table.insert((Mortgage, Mortgage), Transfer);

    table.insert((Revenue, Asset), Deposit);
    table.insert((Revenue, Loan), Deposit);
    table.insert((Revenue, Debt), Deposit);
    table.insert((Revenue, Mortgage), Deposit);

    table
}

/// Infer the transaction type for a resolved account pair.
///
/// Rules, in order: both unknown means withdrawal; a revenue source always
/// deposits; an asset source with an unknown destination withdraws; an
/// unknown source into an asset deposits; otherwise the pair table decides,
/// defaulting to withdrawal when no entry exists.
pub fn determine_type(
    source: Option<AccountType>,
    destination: Option<AccountType>,
    table: &AccountPairTable,
) -> TransactionType {
    match (source, destination) {
        (None, None) => TransactionType::Withdrawal,
        (Some(AccountType::Revenue), _) => TransactionType::Deposit,
        (Some(AccountType::Asset), None) => TransactionType::Withdrawal,
        (None, Some(AccountType::Asset)) => TransactionType::Deposit,
        (src, dst) => lookup_pair(src, dst, table),
    }
}

fn lookup_pair(
    source: Option<AccountType>,
    destination: Option<AccountType>,
    table: &AccountPairTable,
) -> TransactionType {
    if let (Some(src), Some(dst)) = (source, destination) {
        if let Some(inferred) = table.get(&(src, dst)) {
            return *inferred;
        }
    }
    debug!(
        "no account-pair entry for ({}, {}), falling back to withdrawal",
        source.map_or("null", |t| t.as_str()),
        destination.map_or("null", |t| t.as_str()),
    );
    TransactionType::Withdrawal
}
