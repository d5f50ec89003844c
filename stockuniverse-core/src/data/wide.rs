//! Wide multi-field, multi-symbol table.
//!
//! Outer key: field name (`"Adj Close"`, `"Volume"`, ...). Each field is a
//! date × symbol matrix stored column-major; missing observations are `NaN`.
//! All fields of one table share the same date axis.

use super::align::AlignedData;
use super::provider::RawBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

/// A column whose length disagrees with its table's date axis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {symbol} has {got} values for {expected} dates")]
pub struct ColumnLengthError {
    pub symbol: String,
    pub got: usize,
    pub expected: usize,
}

/// The price/volume fields a history fetch produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AdjClose,
    Close,
    High,
    Low,
    Open,
    Volume,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::AdjClose,
        Field::Close,
        Field::High,
        Field::Low,
        Field::Open,
        Field::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::AdjClose => "Adj Close",
            Field::Close => "Close",
            Field::High => "High",
            Field::Low => "Low",
            Field::Open => "Open",
            Field::Volume => "Volume",
        }
    }

    fn value(self, bar: &RawBar) -> f64 {
        match self {
            Field::AdjClose => bar.adj_close,
            Field::Close => bar.close,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Open => bar.open,
            Field::Volume => bar.volume,
        }
    }
}

/// One field: a date × symbol matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    /// One column per symbol, each `dates.len()` long.
    pub columns: Vec<Vec<f64>>,
}

impl FieldTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            symbols: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Append a symbol column. The column must be exactly `dates.len()` long.
    pub fn push_column(
        &mut self,
        symbol: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ColumnLengthError> {
        let symbol = symbol.into();
        if values.len() != self.dates.len() {
            return Err(ColumnLengthError {
                symbol,
                got: values.len(),
                expected: self.dates.len(),
            });
        }
        self.symbols.push(symbol);
        self.columns.push(values);
        Ok(())
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    fn gapped_symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .zip(&self.columns)
            .filter(|(_, col)| col.iter().any(|v| v.is_nan()))
            .map(|(s, _)| s.as_str())
    }

    fn retain_symbols(&mut self, keep: impl Fn(&str) -> bool) {
        let (symbols, columns): (Vec<String>, Vec<Vec<f64>>) = std::mem::take(&mut self.symbols)
            .into_iter()
            .zip(std::mem::take(&mut self.columns))
            .filter(|(s, _)| keep(s.as_str()))
            .unzip();
        self.symbols = symbols;
        self.columns = columns;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    fields: BTreeMap<String, FieldTable>,
    dropped: Vec<String>,
}

impl WideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every [`Field`] from aligned bars; absent bars become `NaN`.
    pub fn from_aligned(aligned: &AlignedData) -> Self {
        let mut table = Self::new();
        for field in Field::ALL {
            let mut ft = FieldTable::new(aligned.dates.clone());
            for symbol in &aligned.symbols {
                let values = aligned
                    .bars
                    .get(symbol)
                    .map(|slots| {
                        slots
                            .iter()
                            .map(|slot| slot.as_ref().map_or(f64::NAN, |b| field.value(b)))
                            .collect()
                    })
                    .unwrap_or_else(|| vec![f64::NAN; aligned.dates.len()]);
                // Aligned slots are one per date.
                ft.symbols.push(symbol.clone());
                ft.columns.push(values);
            }
            table.insert_field(field.name(), ft);
        }
        table
    }

    pub fn insert_field(&mut self, name: impl Into<String>, table: FieldTable) {
        self.fields.insert(name.into(), table);
    }

    pub fn field(&self, name: &str) -> Option<&FieldTable> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldTable)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|k| k.as_str()).collect()
    }

    /// Symbols present in at least one field, in first-seen order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.fields
            .values()
            .flat_map(|ft| ft.symbols.iter().map(|s| s.as_str()))
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// The shared date axis (empty for a table without fields).
    pub fn dates(&self) -> &[NaiveDate] {
        self.fields
            .values()
            .next()
            .map(|ft| ft.dates.as_slice())
            .unwrap_or(&[])
    }

    /// Symbols removed so far by [`drop_gapped_symbols`](Self::drop_gapped_symbols)
    /// or [`record_dropped`](Self::record_dropped), sorted.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Note symbols that never made it into the table (e.g. unknown upstream).
    pub fn record_dropped(&mut self, symbols: impl IntoIterator<Item = String>) {
        self.dropped.extend(symbols);
        self.dropped.sort();
        self.dropped.dedup();
    }

    /// Remove, from every field, each symbol with any missing observation in
    /// any field. Returns the symbols removed by this call, sorted.
    pub fn drop_gapped_symbols(&mut self) -> Vec<String> {
        let gapped: BTreeSet<String> = self
            .fields
            .values()
            .flat_map(|ft| ft.gapped_symbols().map(String::from))
            .collect();

        if gapped.is_empty() {
            return Vec::new();
        }

        for ft in self.fields.values_mut() {
            ft.retain_symbols(|s| !gapped.contains(s));
        }

        let removed: Vec<String> = gapped.into_iter().collect();
        info!(count = removed.len(), symbols = ?removed, "dropped symbols with gaps");
        self.record_dropped(removed.clone());
        removed
    }
}
