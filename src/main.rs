use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibenrich::config::{find_config_file, load_config, Config};
use bibenrich::sources::CrossRefOptions;
use bibenrich::{bib, enrich_collection, CrossRefSource, EnrichOptions};

/// Enrich BibTeX entries with DOIs fetched from the CrossRef API
#[derive(Parser, Debug)]
#[command(name = "bibenrich")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Enrich BibTeX entries with DOIs from CrossRef", long_about = None)]
struct Cli {
    /// BibTeX input file
    input: PathBuf,

    /// Output file (default: overwrite the input file)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// E-mail address for the faster CrossRef polite pool
    #[arg(long, short, value_name = "ADDR")]
    email: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Bib)]
    format: OutputFormat,

    /// Fields to include in TSV output, comma-separated; the pseudo-fields
    /// `key` and `type` select the citation key and entry type
    #[arg(long, short = 't', value_name = "F,F,...", value_delimiter = ',')]
    tsv_fields: Vec<String>,

    /// Only handle entries whose keys are listed in this file (one per line)
    #[arg(long, short, value_name = "FILE")]
    keys: Option<PathBuf>,

    /// Re-fetch and replace DOIs on entries that already carry one
    #[arg(long)]
    overwrite_doi: bool,

    /// Candidates requested per lookup
    #[arg(long, value_name = "N")]
    rows: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

/// Output format for the enriched bibliography
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// BibTeX (round-trips the input)
    Bib,
    /// Tab-separated values of selected fields
    Tsv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bibenrich={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Command-line flags win over config file values
    if cli.email.is_some() {
        config.mailto = cli.email.clone();
    }
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    if cli.format == OutputFormat::Tsv {
        if cli.tsv_fields.is_empty() {
            bail!("format 'tsv' requires --tsv-fields");
        }
        if cli.output.is_none() {
            bail!("format 'tsv' requires --output (refusing to overwrite the BibTeX input)");
        }
    }

    // Read BibTeX; malformed or missing input aborts before any lookup
    let mut records = bib::read(&cli.input)?;
    tracing::info!("read {} entries from {}", records.len(), cli.input.display());

    // Optional key filter
    if let Some(keys_path) = &cli.keys {
        let keys = bib::read_key_list(keys_path)?;
        tracing::info!("read {} keys from {}", keys.len(), keys_path.display());

        let missing = bib::missing_keys(&records, &keys);
        if !missing.is_empty() {
            tracing::warn!("{} keys not found in input: {}", missing.len(), missing.join(", "));
        }

        bib::retain_keys(&mut records, &keys);
        tracing::info!("{} entries remaining after key filtering", records.len());
    }

    let source = CrossRefSource::new(CrossRefOptions {
        mailto: config.mailto.clone(),
        rows: config.rows,
        timeout: Duration::from_secs(config.timeout_secs),
        retry: config.retry.to_retry_config(),
    })?;

    let options = EnrichOptions {
        overwrite_doi: cli.overwrite_doi,
    };
    let report = enrich_collection(&source, &mut records, options).await;

    let output = cli.output.clone().unwrap_or_else(|| cli.input.clone());
    match cli.format {
        OutputFormat::Bib => {
            bib::write(&output, &records)?;
        }
        OutputFormat::Tsv => {
            bib::write_tsv_file(&output, &records, &cli.tsv_fields)?;
        }
    }
    tracing::info!("wrote {} entries to {}", records.len(), output.display());

    if !cli.quiet {
        println!(
            "enriched {} of {} entries ({} already had a DOI, {} without title, {} unmatched, {} failed lookups)",
            report.enriched,
            report.total,
            report.skipped_existing,
            report.skipped_untitled,
            report.unmatched,
            report.failed
        );
    }

    Ok(())
}
