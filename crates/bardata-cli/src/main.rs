use std::path::PathBuf;

use anyhow::{Context, Result};
use bardata_core::clean::{VolumePolicy, clean};
use bardata_core::interval::Interval;
use bardata_core::store::BarStore;
use bardata_providers::provider::BarProvider;
use bardata_providers::yahoo::YahooProvider;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "bardata",
    about = "Download and clean historical OHLCV bar data"
)]
struct Cli {
    /// Root directory for data storage (default: current directory)
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw bars for one symbol, clean them, persist both tables
    Fetch {
        /// Ticker symbol
        #[arg(short, long)]
        symbol: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD, defaults to yesterday)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Bar interval: 1m, 5m, 15m, 1h, 1d
        #[arg(long, default_value = "1m")]
        interval: Interval,

        /// Keep zero-volume bars instead of dropping them
        #[arg(long)]
        keep_zero_volume: bool,
    },

    /// Show which cleaned datasets exist in the store
    Status {
        /// Filter by symbol (shows all if omitted)
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

async fn cmd_fetch(
    store: &BarStore,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
    policy: VolumePolicy,
) -> Result<()> {
    store
        .ensure_dirs()
        .context("failed to create storage directories")?;

    let provider = YahooProvider::new();
    info!("{symbol}: fetching {start} to {end} at {interval} from {}", provider.name());

    let raw = provider
        .fetch_bars(symbol, start, end, interval)
        .await
        .with_context(|| format!("failed to fetch {symbol} from {start} to {end}"))?;

    store
        .write_raw(symbol, start, end, interval, &raw)
        .with_context(|| format!("failed to write raw data for {symbol}"))?;
    info!(
        "{symbol}: wrote {} raw row(s) to {}",
        raw.len(),
        store.raw_path(symbol, start, end, interval).display()
    );

    let bars = clean(&raw, policy);
    store
        .write_cleaned(symbol, start, end, interval, &bars)
        .with_context(|| format!("failed to write cleaned data for {symbol}"))?;
    info!(
        "{symbol}: wrote {} cleaned bar(s) to {} ({} row(s) dropped)",
        bars.len(),
        store.processed_path(symbol, start, end, interval).display(),
        raw.len() - bars.len()
    );

    Ok(())
}

fn cmd_status(store: &BarStore, symbol: Option<&str>) -> Result<()> {
    let names = store
        .list_cleaned(symbol)
        .context("failed to list cleaned datasets")?;

    if names.is_empty() {
        println!("No cleaned data in store.");
        return Ok(());
    }

    for name in &names {
        println!("{name}");
    }
    println!("{} dataset(s).", names.len());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let store = BarStore::new(&cli.data_dir);

    match &cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            interval,
            keep_zero_volume,
        } => {
            let end_date = end
                .unwrap_or_else(|| (chrono::Utc::now() - chrono::Duration::days(1)).date_naive());
            let policy = if *keep_zero_volume {
                VolumePolicy::KeepZeroVolume
            } else {
                VolumePolicy::DropZeroVolume
            };
            let symbol = symbol.to_uppercase();
            cmd_fetch(&store, &symbol, *start, end_date, *interval, policy).await?;
        }
        Commands::Status { symbol } => {
            cmd_status(&store, symbol.as_deref())?;
        }
    }

    Ok(())
}
