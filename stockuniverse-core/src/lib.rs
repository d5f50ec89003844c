//! Stock Universe Core: reference symbol lists, universe resolution, and
//! recent daily history.
//!
//! This crate contains:
//! - Settings loading and validation
//! - Reference record shapes and the merged symbol profile
//! - The reference store (file-backed and in-memory)
//! - Upstream symbol-list providers and refresh jobs
//! - Universe resolution and symbol description
//! - History fetching, alignment, and the gap filter
//! - Per-field Parquet snapshots with a manifest

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod reference;
pub mod snapshot;
pub mod store;
pub mod universe;

pub use config::Settings;
pub use error::{Error, ErrorKind, Result};
pub use universe::{key_etfs, UniverseResolver};
