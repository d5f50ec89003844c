//! Domain types: the two reference record shapes and the merged profile.

pub mod profile;
pub mod records;

pub use profile::SymbolProfile;
pub use records::{ListingRecord, SymbolRecord, CLASS_SEPARATOR};
