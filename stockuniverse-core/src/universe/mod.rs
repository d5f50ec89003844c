//! Universe resolution over the reference store.

pub mod basket;
pub mod resolver;

pub use basket::key_etfs;
pub use resolver::{ReferenceTables, UniverseResolver};
