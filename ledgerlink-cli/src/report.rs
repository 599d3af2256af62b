//! Per-line report rendering for a processed batch.

use ledgerlink_import::BatchOutcome;

pub fn print_report(outcome: &BatchOutcome) {
    for record in &outcome.outcomes {
        let line = record.index + 1;
        match &record.transaction {
            Some(tx) => {
                let source = tx
                    .source_name
                    .clone()
                    .or(tx.source_iban.clone())
                    .or(tx.source_id.map(|id| format!("#{id}")))
                    .unwrap_or_else(|| "-".to_string());
                let destination = tx
                    .destination_name
                    .clone()
                    .or(tx.destination_iban.clone())
                    .or(tx.destination_id.map(|id| format!("#{id}")))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "line {line}: {} {} {} | {source} -> {destination}",
                    tx.transaction_type,
                    tx.amount,
                    tx.currency_code.as_deref().unwrap_or(""),
                );
            }
            None => println!("line {line}: no transaction produced"),
        }
        for error in &record.errors {
            println!("line {line}: error: {error}");
        }
    }
    println!(
        "{} of {} lines normalized, {} errors",
        outcome.transactions().count(),
        outcome.outcomes.len(),
        outcome.error_count()
    );
}
