use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

use ledgerlink_core::model::{AccountDescriptor, Direction, PseudoTransaction};
use ledgerlink_import::{
    AccountLookup, LedgerClient, Pipeline, PipelineConfig, SearchField,
};
use ledgerlink_ingest::{ColumnMapping, parse_csv};

mod config;
mod report;

#[derive(Parser, Debug)]
#[command(name = "ledgerlink", version, about = "Normalize bank exports into ledger transactions")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "ledgerlink.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize raw records and submit them to the ledger
    Import {
        /// Input file: JSON array of raw records, or CSV with --mapping
        #[arg(long)]
        file: PathBuf,

        /// Column-role mapping (JSON); switches the input format to CSV
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Run the pipeline and print the report without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply a column mapping to a CSV and print the raw records as JSON
    Convert {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        mapping: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Command::Import {
            file,
            mapping,
            dry_run,
        } => run_import(&config, file, mapping, dry_run).await,
        Command::Convert { file, mapping } => run_convert(file, mapping),
    }
}

fn read_records(file: &PathBuf, mapping: Option<&PathBuf>) -> Result<Vec<PseudoTransaction>> {
    match mapping {
        Some(mapping_path) => {
            let raw = std::fs::read_to_string(mapping_path)
                .with_context(|| format!("reading mapping {}", mapping_path.display()))?;
            let mapping: ColumnMapping =
                serde_json::from_str(&raw).context("parsing column mapping")?;
            let input = File::open(file)
                .with_context(|| format!("opening input {}", file.display()))?;
            parse_csv(input, &mapping)
        }
        None => {
            let input = File::open(file)
                .with_context(|| format!("opening input {}", file.display()))?;
            serde_json::from_reader(input).context("parsing raw records JSON")
        }
    }
}

async fn run_import(
    config: &config::Config,
    file: PathBuf,
    mapping: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let records = read_records(&file, mapping.as_ref())?;
    if records.is_empty() {
        bail!("no records found in {}", file.display());
    }

    let client = LedgerClient::new(&config.ledger.base_url, &config.ledger.access_token);
    let default_account = match config.import.default_account_id {
        Some(id) => fetch_default_account(&client, id).await?,
        None => None,
    };

    let pipeline_config = PipelineConfig {
        default_currency: config.import.default_currency.clone(),
        concurrency: config.import.concurrency,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(&client, pipeline_config).with_default_account(default_account);
    let outcome = pipeline.run(records).await;
    report::print_report(&outcome);

    if dry_run {
        for (_, tx) in outcome.transactions() {
            println!("{}", serde_json::to_string_pretty(tx)?);
        }
        return Ok(());
    }

    let mut submitted = 0usize;
    let mut rejected = 0usize;
    for (index, tx) in outcome.transactions() {
        match client.create_transaction(tx).await {
            Ok(()) => submitted += 1,
            Err(e) => {
                rejected += 1;
                eprintln!("line {}: {e}", index + 1);
            }
        }
    }
    println!("submitted {submitted}, rejected {rejected}");
    Ok(())
}

async fn fetch_default_account(
    client: &LedgerClient,
    id: u64,
) -> Result<Option<AccountDescriptor>> {
    let accounts = client
        .search(SearchField::Id, &id.to_string())
        .await
        .with_context(|| format!("looking up default account {id}"))?;
    let Some(account) = accounts.into_iter().next() else {
        bail!("default account {id} does not exist in the ledger");
    };
    Ok(Some(AccountDescriptor {
        id: Some(account.id),
        name: Some(account.name),
        iban: account.iban,
        number: account.number,
        bic: account.bic,
        account_type: Some(account.account_type),
        direction: Direction::Source,
    }))
}

fn run_convert(file: PathBuf, mapping: PathBuf) -> Result<()> {
    let records = read_records(&file, Some(&mapping))?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
