//! Transaction assembly: resolves both account roles, infers the transaction
//! type, and applies the sign-driven corrections for rows where the bank's
//! polarity disagrees with the inferred account roles, including the
//! "out of cheese" repair of impossible type/account combinations.

use log::{debug, warn};
use rust_decimal::Decimal;

use ledgerlink_core::error::PipelineError;
use ledgerlink_core::model::{
    AccountDescriptor, AccountType, Direction, PseudoTransaction, TransactionGroupRecord,
    TransactionType,
};
use ledgerlink_core::typing::determine_type;

use crate::lookup::AccountLookup;
use crate::pipeline::PipelineConfig;
use crate::resolver::AccountResolver;

/// Resolve the accounts of one raw row and assemble the normalized record.
///
/// `amount` is the signed amount from the amount stage (`None` when that
/// stage failed; the record is still assembled best-effort). The returned
/// amount string keeps its sign; the positive-amount normalizer runs later.
pub async fn assemble_accounts<C: AccountLookup>(
    lookup: &C,
    config: &PipelineConfig,
    tx: &PseudoTransaction,
    amount: Option<Decimal>,
    foreign_amount: Option<Decimal>,
    provisional_type: Option<TransactionType>,
    tags: Vec<String>,
    default_account: Option<&AccountDescriptor>,
) -> Result<TransactionGroupRecord, PipelineError> {
    let resolver = AccountResolver::new(lookup);
    let provisional = tx.declared_type().or(provisional_type);

    // The source side may fall back to the configured default account; the
    // destination side never does.
    let mut source = resolver
        .resolve(&tx.source_descriptor(), provisional, default_account)
        .await?;
    let mut destination = resolver
        .resolve(&tx.destination_descriptor(), provisional, None)
        .await?;

    let mut transaction_type =
        determine_type(source.account_type, destination.account_type, &config.pair_table);

    let positive = amount.is_some_and(|a| a > Decimal::ZERO);
    let negative = amount.is_some_and(|a| a < Decimal::ZERO);

    // A positive amount on a nominal withdrawal means the row was recorded
    // with reversed polarity: the money actually flowed the other way.
    if transaction_type == TransactionType::Withdrawal && positive {
        debug!("positive amount on a withdrawal, swapping source and destination");
        swap_sides(&mut source, &mut destination);
        transaction_type =
            determine_type(source.account_type, destination.account_type, &config.pair_table);
    }

    // Transfers are symmetric: a positive amount just means the sides were
    // listed the other way around. No re-inference needed.
    if transaction_type == TransactionType::Transfer && positive {
        debug!("positive amount on a transfer, swapping sides without re-inferring");
        swap_sides(&mut source, &mut destination);
    }

    // A deposit funded by a non-revenue account that the resolver confirmed
    // is a wrong match; trust the bank's original counterparty data instead.
    if transaction_type == TransactionType::Deposit && positive {
        if let Some(source_type) = source.account_type {
            if source_type != AccountType::Revenue {
                warn!(
                    "deposit source resolved to a {} account, overriding with original counterparty data",
                    source_type
                );
                source = opposing_fallback(tx, &source);
            }
        }
    }

    // A negative amount on a transfer keeps the sides exactly as resolved.
    if transaction_type == TransactionType::Transfer && negative {
        source.direction = Direction::Source;
        destination.direction = Direction::Destination;
    }

    // Out-of-cheese correction A: a withdrawal cannot pay into a revenue
    // account. Drop the matched id and let the ledger re-arbitrate by name.
    if transaction_type == TransactionType::Withdrawal
        && destination.account_type == Some(AccountType::Revenue)
    {
        warn!("withdrawal into a revenue account, demoting destination to name/IBAN only");
        destination.id = None;
        destination.number = None;
        destination.bic = None;
    }

    // Out-of-cheese correction B: a deposit cannot be funded by an expense
    // account. Same demotion on the source side.
    if transaction_type == TransactionType::Deposit
        && source.account_type == Some(AccountType::Expense)
    {
        warn!("deposit from an expense account, demoting source to name/IBAN only");
        source.id = None;
        source.number = None;
        source.bic = None;
    }

    // A confirmed numeric id supersedes all other identifying fields; the
    // ledger treats conflicting id+name/iban data as an error.
    if source.id.is_some() {
        source.name = None;
        source.iban = None;
        source.number = None;
    }
    if destination.id.is_some() {
        destination.name = None;
        destination.iban = None;
        destination.number = None;
    }

    Ok(TransactionGroupRecord {
        transaction_type,
        date: tx.date.clone(),
        description: tx.description.clone(),
        amount: amount.map(|a| a.to_string()).unwrap_or_default(),
        foreign_amount: foreign_amount.map(|a| a.to_string()),
        currency_code: tx
            .currency_code
            .clone()
            .or_else(|| Some(config.default_currency.clone())),
        foreign_currency_code: tx.foreign_currency_code.clone(),
        source_id: source.id,
        source_name: source.name,
        source_iban: source.iban,
        source_number: source.number,
        destination_id: destination.id,
        destination_name: destination.name,
        destination_iban: destination.iban,
        destination_number: destination.number,
        tags,
    })
}

fn swap_sides(source: &mut AccountDescriptor, destination: &mut AccountDescriptor) {
    std::mem::swap(source, destination);
    source.direction = Direction::Source;
    destination.direction = Direction::Destination;
}

/// Source built from the bank's original counterparty fields, falling back
/// to the identifying data of the current funding side. The fallback must
/// come from the post-swap descriptor, not the raw row's source columns:
/// after a polarity swap the funding side originated in the destination
/// columns. Never carries a resolved id.
fn opposing_fallback(tx: &PseudoTransaction, current: &AccountDescriptor) -> AccountDescriptor {
    AccountDescriptor {
        id: None,
        name: or_text(&tx.original_opposing_name, &current.name),
        iban: or_text(&tx.original_opposing_iban, &current.iban),
        number: or_text(&tx.original_opposing_number, &current.number),
        bic: None,
        account_type: None,
        direction: Direction::Source,
    }
}

fn or_text(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    preferred
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            fallback
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}
