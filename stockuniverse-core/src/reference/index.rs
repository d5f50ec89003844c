//! Index-membership provider: the S&P 500 constituents CSV.

use super::{clean, get_text, http_client, IndexSource};
use crate::data::provider::DataError;
use crate::domain::SymbolRecord;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ConstituentRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Security")]
    security: String,
    #[serde(rename = "GICS Sector")]
    sector: String,
    #[serde(rename = "GICS Sub-Industry")]
    sub_industry: String,
    #[serde(rename = "Headquarters Location")]
    headquarters: String,
    #[serde(rename = "Date added", default)]
    date_added: Option<String>,
    #[serde(rename = "CIK", default)]
    cik: Option<String>,
    #[serde(rename = "Founded", default)]
    founded: Option<String>,
}

impl From<ConstituentRow> for SymbolRecord {
    fn from(row: ConstituentRow) -> Self {
        Self {
            symbol: row.symbol.trim().to_string(),
            security_name: row.security.trim().to_string(),
            sector: row.sector.trim().to_string(),
            sub_industry: row.sub_industry.trim().to_string(),
            headquarters: row.headquarters.trim().to_string(),
            date_first_added: clean(row.date_added),
            cik: clean(row.cik),
            founded: clean(row.founded),
        }
    }
}

/// Parse a constituents CSV. Rows with an empty symbol are skipped.
pub fn parse_constituents(reader: impl Read) -> Result<Vec<SymbolRecord>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (line, row) in rdr.deserialize::<ConstituentRow>().enumerate() {
        let row = row.map_err(|e| DataError::Csv {
            source_name: "constituents".into(),
            reason: format!("row {}: {e}", line + 1),
        })?;
        let record = SymbolRecord::from(row);
        if !record.symbol.is_empty() {
            records.push(record);
        }
    }
    Ok(records)
}

/// Constituents CSV served over HTTP.
pub struct ConstituentsCsv {
    client: reqwest::blocking::Client,
    url: String,
}

impl ConstituentsCsv {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }
}

impl IndexSource for ConstituentsCsv {
    fn name(&self) -> &str {
        "sp500_constituents"
    }

    fn fetch(&self) -> Result<Vec<SymbolRecord>, DataError> {
        info!(url = %self.url, "downloading index constituents");
        let body = get_text(&self.client, &self.url)?;
        parse_constituents(body.as_bytes())
    }
}
