//! The "get latest" flow: fetch a recent window for a symbol list, clean it
//! with the all-or-nothing gap filter, and optionally persist it as a
//! snapshot.

use super::align::align_symbols;
use super::provider::{DataError, DataProvider, RawBar};
use super::wide::WideTable;
use crate::config::Settings;
use crate::error::Error;
use crate::snapshot::{SnapshotManifest, SnapshotWriter};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use tracing::{info, warn};

/// Longest accepted history window, in days.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Cleaned history for a window.
#[derive(Debug, Clone)]
pub struct LatestHistory {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub table: WideTable,
}

impl LatestHistory {
    /// Symbols that survived the gap filter.
    pub fn symbols(&self) -> Vec<&str> {
        self.table.symbols()
    }

    /// Symbols removed for gaps or because the provider had no data.
    pub fn dropped(&self) -> &[String] {
        self.table.dropped()
    }
}

#[derive(Debug, Clone)]
pub struct LatestOptions {
    pub window_days: i64,
    pub write: bool,
    pub prefix: String,
}

impl LatestOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            window_days: settings.providers.history_window_days,
            write: false,
            prefix: settings.providers.snapshot_prefix.clone(),
        }
    }
}

impl Default for LatestOptions {
    fn default() -> Self {
        Self {
            window_days: 33,
            write: false,
            prefix: "universe".to_string(),
        }
    }
}

/// Fetch `[today - window_days, today]` for `symbols` and drop every symbol
/// with a missing observation.
///
/// Symbols are upper-cased and deduplicated, keeping first-seen order. A
/// symbol the provider does not know is dropped; any other provider failure
/// aborts the whole fetch. A window outside `0..=MAX_WINDOW_DAYS` is rejected
/// before any request is made.
pub fn fetch_latest<S: AsRef<str>>(
    provider: &dyn DataProvider,
    symbols: &[S],
    window_days: i64,
    today: NaiveDate,
) -> Result<LatestHistory, DataError> {
    let start = window_start(today, window_days)?;
    let end = today;

    let mut seen = HashSet::new();
    let wanted: Vec<String> = symbols
        .iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();

    info!(
        provider = provider.name(),
        symbols = wanted.len(),
        %start,
        %end,
        "fetching latest history"
    );

    let mut fetched: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(wanted.len());
    let mut unknown = Vec::new();

    for (i, symbol) in wanted.iter().enumerate() {
        if !provider.is_available() {
            return Err(DataError::CircuitBreakerTripped);
        }
        match provider.fetch(symbol, start, end) {
            Ok(result) if result.bars.is_empty() => unknown.push(symbol.clone()),
            Ok(result) => fetched.push((symbol.clone(), result.bars)),
            Err(DataError::SymbolNotFound { .. }) => {
                warn!(symbol = %symbol, "no history for symbol");
                unknown.push(symbol.clone());
            }
            Err(e) => return Err(e),
        }
        if (i + 1) % 50 == 0 {
            info!(done = i + 1, total = wanted.len(), "history fetch progress");
        }
    }

    let aligned = align_symbols(fetched);
    let mut table = WideTable::from_aligned(&aligned);
    table.drop_gapped_symbols();
    table.record_dropped(unknown);

    info!(
        kept = table.symbols().len(),
        dropped = table.dropped().len(),
        rows = table.dates().len(),
        "latest history ready"
    );

    Ok(LatestHistory { start, end, table })
}

fn window_start(today: NaiveDate, window_days: i64) -> Result<NaiveDate, DataError> {
    let invalid = || DataError::InvalidWindow {
        days: window_days,
        max: MAX_WINDOW_DAYS,
    };
    if !(0..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(invalid());
    }
    Duration::try_days(window_days)
        .and_then(|d| today.checked_sub_signed(d))
        .ok_or_else(invalid)
}

/// [`fetch_latest`], then write the snapshot under the dailies directory when
/// `options.write` is set.
pub fn get_latest<S: AsRef<str>>(
    settings: &Settings,
    provider: &dyn DataProvider,
    symbols: &[S],
    options: &LatestOptions,
    today: NaiveDate,
) -> Result<(LatestHistory, Option<SnapshotManifest>), Error> {
    let latest = fetch_latest(provider, symbols, options.window_days, today)?;
    if !options.write {
        return Ok((latest, None));
    }

    let writer = SnapshotWriter::new(&settings.dailies_dir);
    let manifest = writer.write(&latest.table, &options.prefix)?;
    Ok((latest, Some(manifest)))
}
