//! Refresh jobs: pull an upstream list and replace its collection wholesale.
//!
//! A fetch failure or an empty list aborts before anything is written, so a
//! bad upstream day never wipes out the last good table.

use super::{IndexSource, ListingSource};
use crate::data::provider::DataError;
use crate::domain::{ListingRecord, SymbolRecord};
use crate::error::Error;
use crate::store::{replace_typed, ReferenceStore, INDEX_COLLECTION, LISTING_COLLECTION};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of [`refresh_all`]: each list is refreshed independently.
#[derive(Debug)]
pub struct RefreshReport {
    pub index: Result<usize, Error>,
    pub listing: Result<usize, Error>,
}

impl RefreshReport {
    pub fn is_ok(&self) -> bool {
        self.index.is_ok() && self.listing.is_ok()
    }
}

fn store_records<T: Serialize>(
    store: &dyn ReferenceStore,
    source: &str,
    collection: &str,
    records: &[T],
) -> Result<usize, Error> {
    if records.is_empty() {
        warn!(source, collection, "upstream returned no rows, keeping existing collection");
        return Err(DataError::ResponseFormatChanged(format!("{source} returned no rows")).into());
    }
    let written = replace_typed(store, collection, records)?;
    info!(source, collection, rows = written, "collection replaced");
    Ok(written)
}

/// Refresh the index-membership collection.
pub fn refresh_index(
    source: &dyn IndexSource,
    store: &dyn ReferenceStore,
) -> Result<Vec<SymbolRecord>, Error> {
    info!(source = source.name(), "refreshing index members");
    let records = source.fetch()?;
    store_records(store, source.name(), INDEX_COLLECTION, &records)?;
    Ok(records)
}

/// Refresh the exchange-listing collection.
pub fn refresh_listing(
    source: &dyn ListingSource,
    store: &dyn ReferenceStore,
) -> Result<Vec<ListingRecord>, Error> {
    info!(source = source.name(), "refreshing exchange listing");
    let records = source.fetch()?;
    store_records(store, source.name(), LISTING_COLLECTION, &records)?;
    Ok(records)
}

/// Refresh both lists. A failure on one side does not stop the other.
pub fn refresh_all(
    index: &dyn IndexSource,
    listing: &dyn ListingSource,
    store: &dyn ReferenceStore,
) -> RefreshReport {
    let report = RefreshReport {
        index: refresh_index(index, store).map(|r| r.len()),
        listing: refresh_listing(listing, store).map(|r| r.len()),
    };
    if let Err(e) = &report.index {
        warn!(error = %e, "index refresh failed");
    }
    if let Err(e) = &report.listing {
        warn!(error = %e, "listing refresh failed");
    }
    report
}
