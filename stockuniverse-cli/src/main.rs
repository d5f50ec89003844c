//! Stock Universe CLI: refresh, universe, describe and snapshot commands.
//!
//! Commands:
//! - `refresh`: pull the index and/or listing lists into the reference store
//! - `stocks` / `etfs` / `key-etfs`: print a universe, one symbol per line
//! - `describe`: merged profile(s) as JSON
//! - `latest`: recent daily history, gap-filtered, optionally snapshotted
//! - `snapshot show`: print one field of a written snapshot
//! - `collections`: list the reference store's collections
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use stockuniverse_core::config::{Settings, DEFAULT_SETTINGS_PATH};
use stockuniverse_core::data::{
    get_latest, CircuitBreaker, Field, LatestOptions, YahooProvider, MAX_WINDOW_DAYS,
};
use stockuniverse_core::reference::{
    refresh_all, refresh_index, refresh_listing, ConstituentsCsv, DataPackageListing, RefreshReport,
};
use stockuniverse_core::snapshot::SnapshotWriter;
use stockuniverse_core::store::{FileStore, ReferenceStore};
use stockuniverse_core::{key_etfs, UniverseResolver};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stockuniverse",
    about = "Stock universe: reference symbol lists and recent daily history"
)]
struct Cli {
    /// Settings document.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RefreshTarget {
    Index,
    Listing,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the upstream symbol lists and replace their collections.
    Refresh {
        #[arg(value_enum, default_value = "all")]
        target: RefreshTarget,
    },
    /// Print the non-ETF universe.
    Stocks,
    /// Print the ETF universe.
    Etfs,
    /// Print the curated key ETF basket.
    KeyEtfs,
    /// Print merged profiles as JSON. Unknown symbols print as `{}`.
    Describe {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Fetch recent daily history and drop symbols with gaps.
    Latest {
        /// Symbols to fetch.
        symbols: Vec<String>,

        /// Fetch the whole non-ETF universe instead of explicit symbols.
        #[arg(long, default_value_t = false, conflicts_with = "symbols")]
        universe: bool,

        /// Window length in days. Defaults to the settings value.
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_WINDOW_DAYS))]
        days: Option<i64>,

        /// Write the snapshot under the dailies directory.
        #[arg(long, default_value_t = false)]
        write: bool,

        /// Snapshot artifact prefix. Defaults to the settings value.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Snapshot inspection.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
    /// List the reference store's collections.
    Collections,
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Print one field of a snapshot as a table.
    Show {
        #[arg(long)]
        prefix: String,

        /// Field name, e.g. "Adj Close" or "Volume".
        #[arg(long, default_value = "Close")]
        field: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Settings and the reference store they point at.
fn open(settings_path: &Path) -> Result<(Settings, FileStore)> {
    let settings = Settings::load(settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    let store = FileStore::new(settings.store_location());
    info!(store = %settings.store_endpoint(), root = %store.root().display(), "reference store");
    Ok((settings, store))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::KeyEtfs => {
            print_lines(&key_etfs());
            Ok(())
        }
        Commands::Refresh { target } => {
            let (settings, store) = open(&cli.settings)?;
            run_refresh(&settings, &store, target)
        }
        Commands::Stocks => {
            let (_, store) = open(&cli.settings)?;
            print_lines(&UniverseResolver::new(&store).non_etf_universe()?);
            Ok(())
        }
        Commands::Etfs => {
            let (_, store) = open(&cli.settings)?;
            print_lines(&UniverseResolver::new(&store).etf_universe()?);
            Ok(())
        }
        Commands::Describe { symbols } => {
            let (_, store) = open(&cli.settings)?;
            run_describe(&store, &symbols)
        }
        Commands::Latest {
            symbols,
            universe,
            days,
            write,
            prefix,
        } => {
            let (settings, store) = open(&cli.settings)?;
            let mut options = LatestOptions::from_settings(&settings);
            options.write = write;
            if let Some(days) = days {
                options.window_days = days;
            }
            if let Some(prefix) = prefix {
                options.prefix = prefix;
            }
            run_latest(&settings, &store, symbols, universe, &options)
        }
        Commands::Snapshot { action } => match action {
            SnapshotAction::Show { prefix, field } => {
                let (settings, _) = open(&cli.settings)?;
                run_snapshot_show(&settings, &prefix, &field)
            }
        },
        Commands::Collections => {
            let (_, store) = open(&cli.settings)?;
            print_lines(&store.collection_names()?);
            Ok(())
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn run_refresh(settings: &Settings, store: &dyn ReferenceStore, target: RefreshTarget) -> Result<()> {
    let timeout = Duration::from_secs(settings.providers.http_timeout_secs);
    let index = || ConstituentsCsv::new(&settings.providers.index_url, timeout);
    let listing = || {
        DataPackageListing::new(
            &settings.providers.listing_package_url,
            &settings.providers.listing_resource,
            timeout,
        )
    };

    match target {
        RefreshTarget::Index => {
            let records = refresh_index(&index()?, store)?;
            println!("index: {} members", records.len());
        }
        RefreshTarget::Listing => {
            let records = refresh_listing(&listing()?, store)?;
            println!("listing: {} rows", records.len());
        }
        RefreshTarget::All => {
            let report = refresh_all(&index()?, &listing()?, store);
            let (lines, failed) = summarize_refresh(&report);
            print_lines(&lines);
            if !report.is_ok() {
                bail!("refresh failed: {}", failed.join("; "));
            }
        }
    }
    Ok(())
}

/// Output lines for the refreshed lists and messages for the failed ones.
fn summarize_refresh(report: &RefreshReport) -> (Vec<String>, Vec<String>) {
    let mut lines = Vec::new();
    let mut failed = Vec::new();
    match &report.index {
        Ok(n) => lines.push(format!("index: {n} members")),
        Err(e) => failed.push(format!("index: {e}")),
    }
    match &report.listing {
        Ok(n) => lines.push(format!("listing: {n} rows")),
        Err(e) => failed.push(format!("listing: {e}")),
    }
    (lines, failed)
}

fn run_describe(store: &dyn ReferenceStore, symbols: &[String]) -> Result<()> {
    let resolver = UniverseResolver::new(store);
    let json = if let [symbol] = symbols {
        serde_json::to_string_pretty(&resolver.describe(symbol)?)?
    } else {
        serde_json::to_string_pretty(&resolver.describe_all(symbols)?)?
    };
    println!("{json}");
    Ok(())
}

fn run_latest(
    settings: &Settings,
    store: &dyn ReferenceStore,
    symbols: Vec<String>,
    universe: bool,
    options: &LatestOptions,
) -> Result<()> {
    let symbols = if universe {
        UniverseResolver::new(store).non_etf_universe()?
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!("no symbols given; pass symbols or --universe");
    }

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(
        circuit_breaker,
        Duration::from_secs(settings.providers.http_timeout_secs),
    )?;
    let today = chrono::Local::now().date_naive();

    let (latest, manifest) = get_latest(settings, &provider, symbols.as_slice(), options, today)?;

    println!("Window: {} to {}", latest.start, latest.end);
    println!("Rows: {}", latest.table.dates().len());
    println!("Kept: {}", latest.symbols().len());
    if !latest.dropped().is_empty() {
        println!("Dropped: {}", latest.dropped().join(" "));
    }

    if let Some(close) = latest.table.field(Field::Close.name()) {
        if let Some(last) = close.dates.last() {
            println!();
            println!("{:<8} {:>12}   ({last})", "Symbol", "Close");
            println!("{}", "-".repeat(22));
            for (symbol, column) in close.symbols.iter().zip(&close.columns) {
                if let Some(v) = column.last() {
                    println!("{symbol:<8} {v:>12.2}");
                }
            }
        }
    }

    if let Some(manifest) = manifest {
        println!();
        println!(
            "Snapshot written to {} ({} fields, hash {})",
            settings.dailies_dir.display(),
            manifest.fields.len(),
            &manifest.data_hash[..12.min(manifest.data_hash.len())]
        );
    }
    Ok(())
}

fn run_snapshot_show(settings: &Settings, prefix: &str, field: &str) -> Result<()> {
    let writer = SnapshotWriter::new(&settings.dailies_dir);
    let table = writer.read_field(prefix, field)?;

    if let Ok(manifest) = writer.read_manifest(prefix) {
        println!(
            "Snapshot '{}' written {} ({} rows, {} symbols)",
            manifest.prefix,
            manifest.written_at.format("%Y-%m-%d %H:%M:%S"),
            manifest.rows,
            manifest.symbols.len()
        );
    }
    println!("Field: {field}");
    println!();

    print!("{:<12}", "date");
    for symbol in &table.symbols {
        print!(" {symbol:>12}");
    }
    println!();
    for (row, date) in table.dates.iter().enumerate() {
        print!("{:<12}", date.to_string());
        for column in &table.columns {
            print!(" {:>12.2}", column[row]);
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockuniverse_core::data::DataError;
    use stockuniverse_core::Error;

    #[test]
    fn key_etfs_needs_no_settings() {
        let cli = Cli::try_parse_from([
            "stockuniverse",
            "--settings",
            "/nonexistent/settings.toml",
            "key-etfs",
        ])
        .unwrap();
        assert!(run(cli).is_ok());
    }

    #[test]
    fn other_commands_load_settings() {
        let cli =
            Cli::try_parse_from(["stockuniverse", "--settings", "/nonexistent/settings.toml", "stocks"])
                .unwrap();
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").contains("loading settings"));
    }

    #[test]
    fn days_outside_window_bound_is_refused() {
        for days in ["-1", "36501"] {
            let parsed = Cli::try_parse_from(["stockuniverse", "latest", "AAA", "--days", days]);
            assert!(parsed.is_err(), "days {days}");
        }
        assert!(Cli::try_parse_from(["stockuniverse", "latest", "AAA", "--days", "36500"]).is_ok());
    }

    #[test]
    fn partial_refresh_reports_each_side() {
        let report = RefreshReport {
            index: Ok(503),
            listing: Err(Error::Upstream(DataError::Other("listing down".into()))),
        };
        let (lines, failed) = summarize_refresh(&report);
        assert!(!report.is_ok());
        assert_eq!(lines, vec!["index: 503 members"]);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].starts_with("listing: "));
        assert!(failed[0].contains("listing down"));
    }
}
