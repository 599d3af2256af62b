//! Batch runner: drives every raw row through the stage sequence (amount,
//! tags, accounts, positive-amount, empty-account fill), with per-row error
//! accumulation and optional bounded concurrency.
//!
//! Rows are independent of each other, so the only ordering guarantee is
//! that the report is keyed and sorted by input index.

use futures_util::StreamExt;
use futures_util::stream;
use log::debug;

use ledgerlink_core::amount::resolve_amount;
use ledgerlink_core::empty_accounts::fill_empty_accounts;
use ledgerlink_core::error::PipelineError;
use ledgerlink_core::model::{AccountDescriptor, PseudoTransaction, TransactionGroupRecord};
use ledgerlink_core::positive_amount::force_positive_amounts;
use ledgerlink_core::tags::merge_tags;
use ledgerlink_core::typing::{AccountPairTable, default_pair_table};

use crate::accounts::assemble_accounts;
use crate::lookup::AccountLookup;

/// Pipeline-wide settings. The pair table and the currency fallback are
/// configuration, not hard-coded behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub pair_table: AccountPairTable,
    pub default_currency: String,
    /// Number of rows resolved concurrently. 1 reproduces strictly
    /// sequential processing.
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            pair_table: default_pair_table(),
            default_currency: "EUR".to_string(),
            concurrency: 1,
        }
    }
}

/// Outcome for a single input row. `transaction` is `None` only when
/// account resolution failed; an invalid amount still yields a best-effort
/// record (the ledger is the final arbiter).
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub index: usize,
    pub transaction: Option<TransactionGroupRecord>,
    pub errors: Vec<PipelineError>,
}

/// All outcomes of one batch, ordered by input index.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchOutcome {
    /// Successfully normalized transactions with their input indexes.
    pub fn transactions(&self) -> impl Iterator<Item = (usize, &TransactionGroupRecord)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.transaction.as_ref().map(|t| (o.index, t)))
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.errors.len()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

pub struct Pipeline<'a, C: AccountLookup> {
    lookup: &'a C,
    config: PipelineConfig,
    default_account: Option<AccountDescriptor>,
}

impl<'a, C: AccountLookup> Pipeline<'a, C> {
    pub fn new(lookup: &'a C, config: PipelineConfig) -> Self {
        Pipeline {
            lookup,
            config,
            default_account: None,
        }
    }

    /// Account used for a row's source when the row identifies none.
    pub fn with_default_account(mut self, account: Option<AccountDescriptor>) -> Self {
        self.default_account = account;
        self
    }

    /// Process a batch. Row failures never abort the batch; each failure is
    /// recorded against its row's index.
    pub async fn run(&self, records: Vec<PseudoTransaction>) -> BatchOutcome {
        let concurrency = self.config.concurrency.max(1);
        debug!(
            "processing {} records with concurrency {concurrency}",
            records.len()
        );
        let mut outcomes: Vec<RecordOutcome> = stream::iter(
            records
                .into_iter()
                .enumerate()
                .map(|(index, tx)| async move { self.process_one(index, tx).await }),
        )
        .buffer_unordered(concurrency)
        .collect()
        .await;
        outcomes.sort_by_key(|o| o.index);
        BatchOutcome { outcomes }
    }

    /// The stage sequence for one row. Stages are strictly sequential within
    /// a row; each consumes the previous stage's output.
    async fn process_one(&self, index: usize, tx: PseudoTransaction) -> RecordOutcome {
        let mut errors = Vec::new();

        let resolved_amount = match resolve_amount(&tx) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let (amount, foreign_amount, provisional_type) = match &resolved_amount {
            Some(r) => (Some(r.amount), r.foreign_amount, r.provisional_type),
            None => (None, None, None),
        };

        let tags = merge_tags(&tx.tags_comma, &tx.tags_space);

        let assembled = assemble_accounts(
            self.lookup,
            &self.config,
            &tx,
            amount,
            foreign_amount,
            provisional_type,
            tags,
            self.default_account.as_ref(),
        )
        .await;

        let transaction = match assembled {
            Ok(record) => {
                let record = force_positive_amounts(record);
                let record = fill_empty_accounts(record);
                Some(record)
            }
            Err(e) => {
                errors.push(e);
                None
            }
        };

        RecordOutcome {
            index,
            transaction,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlink_core::model::{AccountType, TransactionType};

    use crate::lookup::{LedgerAccount, StubLookup};

    fn asset(id: u64, name: &str) -> LedgerAccount {
        LedgerAccount {
            id,
            name: name.to_string(),
            account_type: AccountType::Asset,
            iban: None,
            number: None,
            bic: None,
        }
    }

    fn row(amount: &str, source_id: Option<u64>, destination_name: Option<&str>) -> PseudoTransaction {
        let mut tx = PseudoTransaction::default();
        tx.amount = Some(amount.to_string());
        tx.source_id = source_id;
        tx.destination_name = destination_name.map(|s| s.to_string());
        tx
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order_under_concurrency() {
        let stub = StubLookup::new(vec![asset(1, "Checking")]);
        let config = PipelineConfig {
            concurrency: 8,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(&stub, config);
        let records = (0..20)
            .map(|i| row(&format!("-{}.00", i + 1), Some(1), Some("Shop")))
            .collect();
        let outcome = pipeline.run(records).await;

        assert_eq!(outcome.outcomes.len(), 20);
        for (i, o) in outcome.outcomes.iter().enumerate() {
            assert_eq!(o.index, i);
            let tx = o.transaction.as_ref().unwrap();
            assert_eq!(tx.amount, format!("{}.00", i + 1));
        }
    }

    #[tokio::test]
    async fn test_invalid_amount_still_emits_best_effort_record() {
        let stub = StubLookup::new(vec![asset(1, "Checking")]);
        let pipeline = Pipeline::new(&stub, PipelineConfig::default());
        let outcome = pipeline.run(vec![row("0.00", Some(1), Some("Shop"))]).await;

        let o = &outcome.outcomes[0];
        assert_eq!(o.errors, vec![PipelineError::InvalidAmount]);
        let tx = o.transaction.as_ref().expect("best-effort record emitted");
        assert_eq!(tx.amount, "0");
        assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
    }

    #[tokio::test]
    async fn test_one_row_failure_does_not_abort_the_batch() {
        let stub = StubLookup::new(vec![asset(1, "Checking")]);
        let pipeline = Pipeline::new(&stub, PipelineConfig::default());
        let outcome = pipeline
            .run(vec![
                row("", Some(1), Some("Shop")),
                row("-10.00", Some(1), Some("Shop")),
            ])
            .await;

        assert!(outcome.has_errors());
        assert_eq!(outcome.error_count(), 1);
        assert!(outcome.outcomes[1].errors.is_empty());
        assert_eq!(outcome.transactions().count(), 2);
    }

    #[tokio::test]
    async fn test_default_account_fills_blank_source() {
        let stub = StubLookup::new(vec![asset(3, "Main")]);
        let default = AccountDescriptor {
            id: Some(3),
            name: Some("Main".to_string()),
            iban: None,
            number: None,
            bic: None,
            account_type: Some(AccountType::Asset),
            direction: ledgerlink_core::model::Direction::Source,
        };
        let pipeline =
            Pipeline::new(&stub, PipelineConfig::default()).with_default_account(Some(default));
        let outcome = pipeline.run(vec![row("-9.99", None, Some("Shop"))]).await;

        let tx = outcome.outcomes[0].transaction.as_ref().unwrap();
        assert_eq!(tx.source_id, Some(3));
        assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
    }
}
