//! Exchange-listing provider: a data package of NYSE "other listings".
//!
//! The package descriptor lists several resources. The listing table is picked
//! by its declared name; when no resource carries that name, the first tabular
//! resource whose schema declares the `NASDAQ Symbol` field is used instead.
//! Position in the resource list is never relied on.

use super::{clean, get_text, http_client, ListingSource};
use crate::data::provider::DataError;
use crate::domain::ListingRecord;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use tracing::{info, warn};

/// Column that identifies the listing table's schema.
const SYMBOL_FIELD: &str = "NASDAQ Symbol";

#[derive(Debug, Clone, Deserialize)]
pub struct DataPackage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<PackageResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub schema: Option<ResourceSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSchema {
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaField {
    pub name: String,
}

impl PackageResource {
    pub fn is_tabular(&self) -> bool {
        self.schema.is_some() || self.format.as_deref() == Some("csv")
    }

    fn declares_field(&self, field: &str) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|s| s.fields.iter().any(|f| f.name == field))
    }
}

impl DataPackage {
    /// The listing resource: by name, else by schema.
    pub fn listing_resource(&self, name: &str) -> Option<&PackageResource> {
        self.resources
            .iter()
            .find(|r| r.name.as_deref() == Some(name))
            .or_else(|| {
                self.resources
                    .iter()
                    .find(|r| r.is_tabular() && r.declares_field(SYMBOL_FIELD))
            })
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "ACT Symbol", default)]
    act_symbol: Option<String>,
    #[serde(rename = "Company Name", default)]
    company_name: Option<String>,
    #[serde(rename = "Security Name")]
    security_name: String,
    #[serde(rename = "Exchange")]
    exchange: String,
    #[serde(rename = "CQS Symbol", default)]
    cqs_symbol: Option<String>,
    #[serde(rename = "ETF")]
    etf: String,
    #[serde(rename = "Round Lot Size", default)]
    round_lot_size: Option<String>,
    #[serde(rename = "Test Issue", default)]
    test_issue: Option<String>,
    #[serde(rename = "NASDAQ Symbol")]
    nasdaq_symbol: String,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "Y" | "y" => Some(true),
        "N" | "n" => Some(false),
        _ => None,
    }
}

/// Round lot sizes are published as decimals ("100.0"). Only whole values that
/// fit a `u32` are kept.
fn parse_round_lot(symbol: &str, value: Option<&str>) -> Option<u32> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let lot = value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(v));
    if lot.is_none() {
        warn!(symbol, value, "ignoring unreadable round lot size");
    }
    lot.map(|v| v as u32)
}

/// Parse the listing CSV. Rows without a symbol or with an unreadable ETF flag
/// are skipped; an unreadable round lot size is dropped from its row.
pub fn parse_listing(reader: impl Read) -> Result<Vec<ListingRecord>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (line, row) in rdr.deserialize::<ListingRow>().enumerate() {
        let row = row.map_err(|e| DataError::Csv {
            source_name: "listing".into(),
            reason: format!("row {}: {e}", line + 1),
        })?;

        let symbol = row.nasdaq_symbol.trim().to_string();
        if symbol.is_empty() {
            continue;
        }
        let Some(is_etf) = parse_flag(&row.etf) else {
            warn!(symbol = %symbol, flag = %row.etf, "unreadable ETF flag, skipping row");
            continue;
        };
        let round_lot_size = parse_round_lot(&symbol, row.round_lot_size.as_deref());

        records.push(ListingRecord {
            exchange_symbol: symbol,
            security_name: row.security_name.trim().to_string(),
            exchange_id: row.exchange.trim().to_string(),
            is_etf,
            act_symbol: clean(row.act_symbol),
            company_name: clean(row.company_name),
            cqs_symbol: clean(row.cqs_symbol),
            round_lot_size,
            test_issue: row.test_issue.as_deref().and_then(parse_flag),
        });
    }

    Ok(records)
}

/// Resolve a resource path against the package descriptor URL.
fn resolve_path(package_url: &str, path: &str) -> Result<String, DataError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }
    let base = reqwest::Url::parse(package_url)
        .map_err(|e| DataError::Other(format!("package url {package_url}: {e}")))?;
    base.join(path)
        .map(|u| u.to_string())
        .map_err(|e| DataError::Other(format!("resource path {path}: {e}")))
}

/// Listing table pulled from a data package over HTTP.
pub struct DataPackageListing {
    client: reqwest::blocking::Client,
    package_url: String,
    resource: String,
}

impl DataPackageListing {
    pub fn new(
        package_url: impl Into<String>,
        resource: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: http_client(timeout)?,
            package_url: package_url.into(),
            resource: resource.into(),
        })
    }
}

impl ListingSource for DataPackageListing {
    fn name(&self) -> &str {
        "nyse_other_listings"
    }

    fn fetch(&self) -> Result<Vec<ListingRecord>, DataError> {
        info!(url = %self.package_url, "downloading listing data package");
        let descriptor = get_text(&self.client, &self.package_url)?;
        let package: DataPackage = serde_json::from_str(&descriptor)
            .map_err(|e| DataError::ResponseFormatChanged(format!("data package: {e}")))?;

        let resource = package
            .listing_resource(&self.resource)
            .ok_or_else(|| DataError::ResourceNotFound(self.resource.clone()))?;
        let path = resource
            .path
            .as_deref()
            .ok_or_else(|| DataError::ResponseFormatChanged("listing resource has no path".into()))?;
        let url = resolve_path(&self.package_url, path)?;

        info!(resource = ?resource.name, %url, "downloading listing table");
        let body = get_text(&self.client, &url)?;
        parse_listing(body.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE: &str = r#"{
        "name": "nyse-other-listings",
        "resources": [
            {"name": "validation_report", "path": "validation_report.json", "format": "json"},
            {"name": "nyse-listed_csv", "path": "data/nyse-listed.csv", "format": "csv",
             "schema": {"fields": [{"name": "ACT Symbol"}, {"name": "Company Name"}]}},
            {"name": "other-listed_csv", "path": "data/other-listed.csv", "format": "csv",
             "schema": {"fields": [{"name": "ACT Symbol"}, {"name": "NASDAQ Symbol"}]}}
        ]
    }"#;

    const LISTING: &str = "\
ACT Symbol,Company Name,Security Name,Exchange,CQS Symbol,ETF,Round Lot Size,Test Issue,NASDAQ Symbol
A,Agilent Technologies,Agilent Technologies Inc. Common Stock,N,A,N,100.0,N,A
BRK.B,Berkshire Hathaway,Berkshire Hathaway Inc. Class B,N,BRK.B,N,100.0,N,BRK-B
SPY,SPDR S&P 500,SPDR S&P 500 ETF Trust,P,SPY,Y,100.0,N,SPY
ODD,Odd Corp,Odd Corp Stock,N,ODD,?,100.0,N,ODD
";

    #[test]
    fn resource_is_selected_by_name_not_position() {
        let package: DataPackage = serde_json::from_str(PACKAGE).unwrap();
        let res = package.listing_resource("other-listed_csv").unwrap();
        assert_eq!(res.path.as_deref(), Some("data/other-listed.csv"));

        // Reordering the resources does not change the selection.
        let mut reordered = package.clone();
        reordered.resources.reverse();
        let res = reordered.listing_resource("other-listed_csv").unwrap();
        assert_eq!(res.path.as_deref(), Some("data/other-listed.csv"));
    }

    #[test]
    fn unknown_name_falls_back_to_schema() {
        let package: DataPackage = serde_json::from_str(PACKAGE).unwrap();
        let res = package.listing_resource("renamed_csv").unwrap();
        assert_eq!(res.name.as_deref(), Some("other-listed_csv"));
    }

    #[test]
    fn parses_listing_rows() {
        let records = parse_listing(LISTING.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].exchange_symbol, "BRK-B");
        assert!(records[1].is_special_class());
        assert!(records[2].is_etf);
        assert_eq!(records[0].round_lot_size, Some(100));
        assert_eq!(records[0].test_issue, Some(false));
    }

    #[test]
    fn relative_paths_resolve_against_package() {
        let url = resolve_path(
            "https://datahub.io/core/nyse-other-listings/datapackage.json",
            "data/other-listed.csv",
        )
        .unwrap();
        assert_eq!(url, "https://datahub.io/core/nyse-other-listings/data/other-listed.csv");
        assert_eq!(resolve_path("https://x/p.json", "https://y/z.csv").unwrap(), "https://y/z.csv");
    }

    #[test]
    fn round_lot_must_be_whole() {
        assert_eq!(parse_round_lot("A", Some("100.0")), Some(100));
        assert_eq!(parse_round_lot("A", Some(" 1 ")), Some(1));
        assert_eq!(parse_round_lot("A", Some("")), None);
        assert_eq!(parse_round_lot("A", None), None);
        for bad in ["12.5", "-1", "abc", "1e12", "NaN"] {
            assert_eq!(parse_round_lot("A", Some(bad)), None, "value {bad}");
        }
    }

    #[test]
    fn unreadable_round_lot_keeps_row() {
        let csv = "\
ACT Symbol,Company Name,Security Name,Exchange,CQS Symbol,ETF,Round Lot Size,Test Issue,NASDAQ Symbol
FRAC,Fraction Inc,Fraction Inc Stock,N,FRAC,N,12.5,N,FRAC
TEXT,Text Inc,Text Inc Stock,N,TEXT,N,lots,N,TEXT
";
        let records = parse_listing(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.round_lot_size.is_none()));
        assert_eq!(records[1].exchange_symbol, "TEXT");
    }
}
