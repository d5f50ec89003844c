//! Universe resolver.
//!
//! Reconciles the index-membership table and the exchange-listing table into
//! the deduplicated universe, the ETF subset, and merged per-symbol profiles.
//! The rules live on [`ReferenceTables`], which is pure; [`UniverseResolver`]
//! loads the tables from the store on every call, so a query always sees the
//! last refresh.

use crate::domain::{ListingRecord, SymbolProfile, SymbolRecord};
use crate::store::{self, ReferenceStore, StoreError};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Both reference tables, as read from the store.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub index: Vec<SymbolRecord>,
    pub listing: Vec<ListingRecord>,
}

impl ReferenceTables {
    pub fn new(index: Vec<SymbolRecord>, listing: Vec<ListingRecord>) -> Self {
        Self { index, listing }
    }

    /// Non-ETF listing symbols without a class separator, unioned with every
    /// index symbol. Sorted and deduplicated.
    pub fn non_etf_universe(&self) -> Vec<String> {
        let listed = self
            .listing
            .iter()
            .filter(|rec| !rec.is_etf && !rec.is_special_class())
            .map(|rec| rec.exchange_symbol.as_str());
        let members = self.index.iter().map(|rec| rec.symbol.as_str());

        listed
            .chain(members)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Listing symbols flagged as ETFs, in listing order.
    pub fn etf_universe(&self) -> Vec<String> {
        self.listing
            .iter()
            .filter(|rec| rec.is_etf)
            .map(|rec| rec.exchange_symbol.clone())
            .collect()
    }

    /// Merged profile for one symbol; the not-found marker when neither
    /// source knows it. The query is upper-cased, source keys are not.
    pub fn describe(&self, symbol: &str) -> SymbolProfile {
        let wanted = symbol.trim().to_uppercase();
        let listing = self.listing.iter().find(|rec| rec.exchange_symbol == wanted);
        let index = self.index.iter().find(|rec| rec.symbol == wanted);
        SymbolProfile::merge(listing, index)
    }

    /// Profiles for a batch, in input order, with a not-found marker in place
    /// of every unknown symbol.
    pub fn describe_all<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<SymbolProfile> {
        let mut listing: HashMap<&str, &ListingRecord> = HashMap::new();
        for rec in &self.listing {
            listing.entry(rec.exchange_symbol.as_str()).or_insert(rec);
        }
        let mut index: HashMap<&str, &SymbolRecord> = HashMap::new();
        for rec in &self.index {
            index.entry(rec.symbol.as_str()).or_insert(rec);
        }

        symbols
            .iter()
            .map(|symbol| {
                let wanted = symbol.as_ref().trim().to_uppercase();
                SymbolProfile::merge(
                    listing.get(wanted.as_str()).copied(),
                    index.get(wanted.as_str()).copied(),
                )
            })
            .collect()
    }
}

/// Answers universe and describe queries against a reference store.
pub struct UniverseResolver<'a> {
    store: &'a dyn ReferenceStore,
}

impl<'a> UniverseResolver<'a> {
    pub fn new(store: &'a dyn ReferenceStore) -> Self {
        Self { store }
    }

    /// Load both tables; fails if either collection is unavailable.
    pub fn tables(&self) -> Result<ReferenceTables, StoreError> {
        let listing = store::load_listing(self.store)?;
        let index = store::load_index_members(self.store)?;
        debug!(
            listing = listing.len(),
            index = index.len(),
            "loaded reference tables"
        );
        Ok(ReferenceTables::new(index, listing))
    }

    pub fn non_etf_universe(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.tables()?.non_etf_universe())
    }

    pub fn etf_universe(&self) -> Result<Vec<String>, StoreError> {
        let listing = store::load_listing(self.store)?;
        Ok(ReferenceTables::new(Vec::new(), listing).etf_universe())
    }

    pub fn describe(&self, symbol: &str) -> Result<SymbolProfile, StoreError> {
        Ok(self.tables()?.describe(symbol))
    }

    pub fn describe_all<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Vec<SymbolProfile>, StoreError> {
        Ok(self.tables()?.describe_all(symbols))
    }
}
