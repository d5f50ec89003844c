//! Upstream symbol-list providers and the refresh jobs that load them into
//! the reference store.

pub mod index;
pub mod listing;
pub mod refresh;

pub use index::ConstituentsCsv;
pub use listing::{DataPackage, DataPackageListing, PackageResource};
pub use refresh::{refresh_all, refresh_index, refresh_listing, RefreshReport};

use crate::data::provider::DataError;
use crate::domain::{ListingRecord, SymbolRecord};
use std::time::Duration;

/// Source of the index-membership list.
pub trait IndexSource {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<Vec<SymbolRecord>, DataError>;
}

/// Source of the exchange-listing list.
pub trait ListingSource {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<Vec<ListingRecord>, DataError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, DataError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("stockuniverse/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::Other(format!("http client: {e}")))
}

/// GET `url` and return the body, mapping transport and status failures.
pub(crate) fn get_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, DataError> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited {
            retry_after_secs: 60,
        });
    }
    if !status.is_success() {
        return Err(DataError::Other(format!("HTTP {status} for {url}")));
    }

    resp.text()
        .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))
}

/// Trim stray whitespace and line breaks; empty becomes `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
