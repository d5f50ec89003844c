//! Reference store adapter.
//!
//! The two raw symbol lists live in a document store as named collections.
//! A refresh replaces a collection wholesale; readers do a full scan. The
//! [`ReferenceStore`] trait abstracts the backend so the resolver can run
//! against the file-backed store in production and the in-memory store in
//! tests.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::domain::{ListingRecord, SymbolRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Collection holding index members.
pub const INDEX_COLLECTION: &str = "sp500";
/// Collection holding the exchange listing.
pub const LISTING_COLLECTION: &str = "nyse";
/// Row identifier the store stamps on every document.
pub const ROW_ID: &str = "_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{name}' cannot be found in the reference store")]
    CollectionMissing { name: String },

    #[error("reference store unavailable: {0}")]
    Unavailable(String),

    #[error("collection '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
}

/// A document store holding named collections of JSON documents.
pub trait ReferenceStore: Send + Sync {
    /// Names of the collections currently present.
    fn collection_names(&self) -> Result<Vec<String>, StoreError>;

    /// Full scan of one collection, in insertion order.
    fn read_collection(&self, name: &str) -> Result<Vec<Value>, StoreError>;

    /// Drop `name` and insert `documents` in its place. Returns the number of
    /// documents written.
    fn replace_collection(&self, name: &str, documents: Vec<Value>) -> Result<usize, StoreError>;
}

/// Stamp sequential row identifiers onto documents about to be inserted.
pub(crate) fn with_row_ids(documents: Vec<Value>) -> Vec<Value> {
    documents
        .into_iter()
        .enumerate()
        .map(|(i, doc)| match doc {
            Value::Object(mut map) => {
                map.insert(ROW_ID.to_string(), Value::from(i as u64));
                Value::Object(map)
            }
            other => other,
        })
        .collect()
}

/// Read a collection and decode every document as `T`.
pub fn read_typed<T: DeserializeOwned>(
    store: &dyn ReferenceStore,
    name: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .read_collection(name)?
        .into_iter()
        .enumerate()
        .map(|(row, doc)| {
            serde_json::from_value(doc).map_err(|e| StoreError::Corrupt {
                name: name.to_string(),
                reason: format!("row {row}: {e}"),
            })
        })
        .collect()
}

/// Encode `records` and replace collection `name` with them.
pub fn replace_typed<T: Serialize>(
    store: &dyn ReferenceStore,
    name: &str,
    records: &[T],
) -> Result<usize, StoreError> {
    let documents = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            reason: format!("encode: {e}"),
        })?;
    store.replace_collection(name, documents)
}

/// The index-membership table.
pub fn load_index_members(store: &dyn ReferenceStore) -> Result<Vec<SymbolRecord>, StoreError> {
    read_typed(store, INDEX_COLLECTION)
}

/// The exchange-listing table.
pub fn load_listing(store: &dyn ReferenceStore) -> Result<Vec<ListingRecord>, StoreError> {
    read_typed(store, LISTING_COLLECTION)
}
