//! Crate-level error: every module error, classified by kind.

use crate::config::ConfigError;
use crate::data::provider::DataError;
use crate::snapshot::SnapshotError;
use crate::store::StoreError;
use thiserror::Error;

/// Coarse classification of failures, for callers that branch on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings missing, unreadable, or incomplete.
    ConfigInvalid,
    /// Reference store unreachable or a collection missing.
    SourceUnavailable,
    /// An upstream provider call failed.
    UpstreamFetchFailed,
    /// A history lookup for an unknown symbol.
    SymbolNotFound,
    /// A snapshot artifact could not be written or read.
    SnapshotFailed,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] DataError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::ConfigInvalid,
            Error::Store(_) => ErrorKind::SourceUnavailable,
            Error::Upstream(DataError::SymbolNotFound { .. }) => ErrorKind::SymbolNotFound,
            Error::Upstream(DataError::InvalidWindow { .. }) => ErrorKind::ConfigInvalid,
            Error::Upstream(_) => ErrorKind::UpstreamFetchFailed,
            Error::Snapshot(_) => ErrorKind::SnapshotFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
