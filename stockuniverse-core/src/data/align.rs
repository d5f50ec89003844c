//! Multi-symbol time alignment.
//!
//! Given bars for several symbols, lay them on the union of their dates.
//! A symbol with no bar on a date gets `None` there; nothing is forward-filled.

use super::provider::RawBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Bars for several symbols on a common timeline.
#[derive(Debug)]
pub struct AlignedData {
    /// The common date axis, ascending.
    pub dates: Vec<NaiveDate>,
    /// Symbols in input order.
    pub symbols: Vec<String>,
    /// Per symbol, one slot per entry of `dates`.
    pub bars: HashMap<String, Vec<Option<RawBar>>>,
}

/// Align symbols on the union of their dates, keeping the input symbol order.
pub fn align_symbols(symbol_bars: Vec<(String, Vec<RawBar>)>) -> AlignedData {
    let dates: Vec<NaiveDate> = symbol_bars
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut symbols = Vec::with_capacity(symbol_bars.len());
    let mut aligned = HashMap::with_capacity(symbol_bars.len());

    for (symbol, bars) in symbol_bars {
        let mut by_date: HashMap<NaiveDate, RawBar> =
            bars.into_iter().map(|b| (b.date, b)).collect();
        let slots = dates.iter().map(|d| by_date.remove(d)).collect();
        symbols.push(symbol.clone());
        aligned.insert(symbol, slots);
    }

    AlignedData {
        dates,
        symbols,
        bars: aligned,
    }
}
