//! Snapshot cache writer.
//!
//! Layout: `{dir}/{prefix}_{field}.parquet`, one file per field of a wide
//! table, plus `{dir}/{prefix}_manifest.json`.
//!
//! - Field names become artifact names by lower-casing and joining words with
//!   underscores (`"Adj Close"` -> `adj_close`).
//! - Each artifact and the manifest is written to `.tmp` and renamed into
//!   place, replacing any previous file of the same name.
//! - Fields are written one after another with no transaction across them; an
//!   interrupted write leaves a partial snapshot.
//! - Each Parquet file has a `date` column followed by one `Float64` column
//!   per symbol.

use crate::data::wide::{FieldTable, WideTable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const DATE_COLUMN: &str = "date";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("no snapshot artifact at {}", .0.display())]
    NotFound(PathBuf),

    #[error("manifest error: {0}")]
    Manifest(String),
}

/// Sidecar describing the last snapshot written under a prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub prefix: String,
    pub fields: Vec<String>,
    pub artifacts: Vec<String>,
    pub symbols: Vec<String>,
    pub dropped: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub rows: usize,
    pub data_hash: String,
    pub written_at: chrono::NaiveDateTime,
}

/// `{prefix}_{field words, lower-cased, underscore-joined}`.
pub fn artifact_stem(prefix: &str, field: &str) -> String {
    let field = field
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("{prefix}_{field}")
}

/// Writes and reads per-field snapshot artifacts under one directory.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, prefix: &str, field: &str) -> PathBuf {
        self.dir
            .join(format!("{}.parquet", artifact_stem(prefix, field)))
    }

    fn manifest_path(&self, prefix: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_manifest.json"))
    }

    /// Persist every field of `table`.
    pub fn write(&self, table: &WideTable, prefix: &str) -> Result<SnapshotManifest, SnapshotError> {
        let names = table.field_names();
        self.write_fields(table, &names, prefix)
    }

    /// Persist the requested fields of `table`; requested fields the table
    /// does not carry are skipped.
    pub fn write_fields(
        &self,
        table: &WideTable,
        fields: &[&str],
        prefix: &str,
    ) -> Result<SnapshotManifest, SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|e| SnapshotError::Io {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;

        let mut hasher = blake3::Hasher::new();
        let mut written = Vec::new();
        let mut artifacts = Vec::new();

        for &name in fields {
            let Some(ft) = table.field(name) else {
                warn!(field = name, "field not present in table, skipping");
                continue;
            };

            let path = self.artifact_path(prefix, name);
            info!(path = %path.display(), symbols = ft.symbols.len(), rows = ft.dates.len(), "writing snapshot field");
            write_field(ft, &path)?;

            hash_field(&mut hasher, name, ft);
            written.push(name.to_string());
            artifacts.push(
                path.file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }

        let dates = table.dates();
        let manifest = SnapshotManifest {
            prefix: prefix.to_string(),
            fields: written,
            artifacts,
            symbols: table.symbols().into_iter().map(String::from).collect(),
            dropped: table.dropped().to_vec(),
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
            rows: dates.len(),
            data_hash: hasher.finalize().to_hex().to_string(),
            written_at: chrono::Local::now().naive_local(),
        };

        let body = serde_json::to_string_pretty(&manifest)
            .map_err(|e| SnapshotError::Manifest(format!("encode: {e}")))?;
        write_atomic(&self.manifest_path(prefix), body.as_bytes())?;

        Ok(manifest)
    }

    /// Read back one field artifact.
    pub fn read_field(&self, prefix: &str, field: &str) -> Result<FieldTable, SnapshotError> {
        let path = self.artifact_path(prefix, field);
        if !path.is_file() {
            return Err(SnapshotError::NotFound(path));
        }
        read_field(&path)
    }

    pub fn read_manifest(&self, prefix: &str) -> Result<SnapshotManifest, SnapshotError> {
        let path = self.manifest_path(prefix);
        if !path.is_file() {
            return Err(SnapshotError::NotFound(path));
        }
        let content = fs::read_to_string(&path).map_err(|e| SnapshotError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SnapshotError::Manifest(format!("decode: {e}")))
    }
}

fn hash_field(hasher: &mut blake3::Hasher, name: &str, ft: &FieldTable) {
    hasher.update(name.as_bytes());
    for date in &ft.dates {
        hasher.update(date.to_string().as_bytes());
    }
    for (symbol, column) in ft.symbols.iter().zip(&ft.columns) {
        hasher.update(symbol.as_bytes());
        for v in column {
            hasher.update(&v.to_le_bytes());
        }
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn field_to_dataframe(ft: &FieldTable) -> Result<DataFrame, SnapshotError> {
    let days: Vec<i32> = ft
        .dates
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(ft.symbols.len() + 1);
    columns.push(
        Column::new(DATE_COLUMN.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| SnapshotError::Parquet(format!("date cast: {e}")))?,
    );
    for (symbol, values) in ft.symbols.iter().zip(&ft.columns) {
        columns.push(Column::new(symbol.as_str().into(), values.clone()));
    }

    DataFrame::new(columns).map_err(|e| SnapshotError::Parquet(format!("dataframe creation: {e}")))
}

fn write_field(ft: &FieldTable, path: &Path) -> Result<(), SnapshotError> {
    let mut df = field_to_dataframe(ft)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path).map_err(|e| SnapshotError::Io {
        path: tmp_path.clone(),
        reason: e.to_string(),
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| SnapshotError::Parquet(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        SnapshotError::Io {
            path: path.to_path_buf(),
            reason: format!("atomic rename failed: {e}"),
        }
    })
}

/// Write `body` to `{path}.tmp` and rename it over `path`.
fn write_atomic(path: &Path, body: &[u8]) -> Result<(), SnapshotError> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, body).map_err(|e| SnapshotError::Io {
        path: tmp_path.clone(),
        reason: e.to_string(),
    })?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        SnapshotError::Io {
            path: path.to_path_buf(),
            reason: format!("atomic rename failed: {e}"),
        }
    })
}

fn read_field(path: &Path) -> Result<FieldTable, SnapshotError> {
    let file = fs::File::open(path).map_err(|e| SnapshotError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| SnapshotError::Parquet(format!("read: {e}")))?;

    let date_col = df
        .column(DATE_COLUMN)
        .map_err(|e| SnapshotError::Parquet(format!("missing date column: {e}")))?;
    let date_ca = date_col
        .date()
        .map_err(|e| SnapshotError::Parquet(format!("date column type: {e}")))?;

    let mut dates = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| SnapshotError::Parquet(format!("null date at row {i}")))?;
        dates.push(epoch() + chrono::Duration::days(days as i64));
    }

    let mut table = FieldTable::new(dates);
    for name in df.get_column_names() {
        if name.as_str() == DATE_COLUMN {
            continue;
        }
        let ca = df
            .column(name.as_str())
            .and_then(|c| c.f64())
            .map_err(|e| SnapshotError::Parquet(format!("column {name}: {e}")))?;
        let values = ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        table
            .push_column(name.as_str(), values)
            .map_err(|e| SnapshotError::Parquet(e.to_string()))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn close_table() -> FieldTable {
        let mut ft = FieldTable::new(vec![d(1), d(2), d(3)]);
        ft.push_column("AAA", vec![1.0, 1.5, 2.0]).unwrap();
        ft.push_column("BBB", vec![10.0, 10.5, 11.0]).unwrap();
        ft
    }

    #[test]
    fn artifact_names_are_lower_snake() {
        assert_eq!(artifact_stem("universe", "Adj Close"), "universe_adj_close");
        assert_eq!(artifact_stem("sp", "Volume"), "sp_volume");
        assert_eq!(artifact_stem("sp", "adj_close"), "sp_adj_close");
    }

    #[test]
    fn field_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path());
        let mut table = WideTable::new();
        table.insert_field("Close", close_table());

        writer.write(&table, "test").unwrap();
        let back = writer.read_field("test", "Close").unwrap();

        assert_eq!(back, close_table());
        assert!(tmp.path().join("test_close.parquet").is_file());
        assert!(!tmp.path().join("test_close.parquet.tmp").exists());
    }

    #[test]
    fn unknown_fields_are_skipped_and_manifest_written() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path());
        let mut table = WideTable::new();
        table.insert_field("Close", close_table());

        let manifest = writer
            .write_fields(&table, &["Close", "Open"], "partial")
            .unwrap();

        assert_eq!(manifest.fields, vec!["Close"]);
        assert_eq!(manifest.artifacts, vec!["partial_close.parquet"]);
        assert_eq!(manifest.symbols, vec!["AAA", "BBB"]);
        assert_eq!(manifest.first_date, Some(d(1)));
        assert_eq!(manifest.rows, 3);
        assert!(!tmp.path().join("partial_open.parquet").exists());
        assert_eq!(writer.read_manifest("partial").unwrap(), manifest);
    }

    #[test]
    fn rewrite_overwrites_previous_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path());

        let mut first = WideTable::new();
        first.insert_field("Close", close_table());
        writer.write(&first, "daily").unwrap();

        let mut second_ft = FieldTable::new(vec![d(9)]);
        second_ft.push_column("CCC", vec![42.0]).unwrap();
        let mut second = WideTable::new();
        second.insert_field("Close", second_ft.clone());
        writer.write(&second, "daily").unwrap();

        assert_eq!(writer.read_field("daily", "Close").unwrap(), second_ft);
    }

    #[test]
    fn manifest_is_replaced_without_leftover_tmp() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path());

        let mut first = WideTable::new();
        first.insert_field("Close", close_table());
        writer.write(&first, "daily").unwrap();

        let mut second_ft = FieldTable::new(vec![d(9)]);
        second_ft.push_column("CCC", vec![42.0]).unwrap();
        let mut second = WideTable::new();
        second.insert_field("Close", second_ft);
        let manifest = writer.write(&second, "daily").unwrap();

        assert_eq!(writer.read_manifest("daily").unwrap(), manifest);
        assert_eq!(manifest.symbols, vec!["CCC"]);
        assert!(tmp.path().join("daily_manifest.json").is_file());
        assert!(!tmp.path().join("daily_manifest.json.tmp").exists());
    }

    #[test]
    fn missing_artifact_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path());
        assert!(matches!(
            writer.read_field("nothing", "Close"),
            Err(SnapshotError::NotFound(_))
        ));
    }
}
