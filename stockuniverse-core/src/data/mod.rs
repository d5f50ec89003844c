//! History fetching, alignment and the wide table.

pub mod align;
pub mod circuit_breaker;
pub mod latest;
pub mod provider;
pub mod wide;
pub mod yahoo;

pub use align::{align_symbols, AlignedData};
pub use circuit_breaker::CircuitBreaker;
pub use latest::{fetch_latest, get_latest, LatestHistory, LatestOptions, MAX_WINDOW_DAYS};
pub use provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use wide::{ColumnLengthError, Field, FieldTable, WideTable};
pub use yahoo::YahooProvider;
