//! Settings document loading and directory bootstrapping.
//!
//! Settings live in a TOML file (default `settings/settings.toml`). The file is
//! first parsed into an all-optional raw document, then validated into the
//! immutable [`Settings`] value that components receive at construction.
//!
//! Directory options are resolved against the working directory and created
//! when absent. The reference-store keys are required; a document missing any
//! of them is rejected with the key named.

use crate::data::latest::MAX_WINDOW_DAYS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default location of the settings document.
pub const DEFAULT_SETTINGS_PATH: &str = "settings/settings.toml";

const DEFAULT_DS_LOCATION: &str = "./DS";
const DEFAULT_TA_LOCATION: &str = "./models";
const DEFAULT_UNIVERSE_LOCATION: &str = "./universe";
const DEFAULT_DAILIES_LOCATION: &str = "./dailies";

/// Reference-store keys every settings document must carry.
pub const REQUIRED_KEYS: [&str; 5] = [
    "mongo_server",
    "mongo_port",
    "mongo_username",
    "mongo_password",
    "mongo_db_universe",
];

pub const DEFAULT_INDEX_URL: &str =
    "https://datahub.io/core/s-and-p-500-companies/r/constituents.csv";
pub const DEFAULT_LISTING_PACKAGE_URL: &str =
    "https://datahub.io/core/nyse-other-listings/datapackage.json";
pub const DEFAULT_LISTING_RESOURCE: &str = "other-listed_csv";

/// Configuration failures. Every variant means "no usable settings".
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read settings file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("cannot parse settings file: {0}")]
    Malformed(String),

    #[error("cannot find entry '{0}' in settings file")]
    MissingKey(&'static str),

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("cannot create directory {}: {reason}", .path.display())]
    CreateDir { path: PathBuf, reason: String },
}

/// Settings document as written on disk; everything optional until validated.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    ds_location: Option<String>,
    ta_location: Option<String>,
    universe_location: Option<String>,
    dailies_location: Option<String>,
    mongo_server: Option<String>,
    mongo_port: Option<u16>,
    mongo_username: Option<String>,
    mongo_password: Option<String>,
    mongo_db_universe: Option<String>,
    #[serde(default)]
    providers: ProviderSettings,
}

/// Connection parameters of the reference document store.
///
/// The keys are required and validated, but the shipped [`FileStore`] makes no
/// connection with them: they are reserved for a networked
/// [`ReferenceStore`] and otherwise only appear, password redacted, in
/// [`Settings::store_endpoint`].
///
/// [`FileStore`]: crate::store::FileStore
/// [`ReferenceStore`]: crate::store::ReferenceStore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Upstream provider options, all defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub index_url: String,
    pub listing_package_url: String,
    pub listing_resource: String,
    pub http_timeout_secs: u64,
    pub history_window_days: i64,
    pub snapshot_prefix: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            listing_package_url: DEFAULT_LISTING_PACKAGE_URL.to_string(),
            listing_resource: DEFAULT_LISTING_RESOURCE.to_string(),
            http_timeout_secs: 30,
            history_window_days: 33,
            snapshot_prefix: "universe".to_string(),
        }
    }
}

/// Validated, immutable settings. Directory fields are absolute and exist.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ds_dir: PathBuf,
    pub ta_dir: PathBuf,
    pub universe_dir: PathBuf,
    pub dailies_dir: PathBuf,
    pub store: StoreSettings,
    pub providers: ProviderSettings,
}

impl Settings {
    /// Load settings from a TOML file, resolving directories against the
    /// current working directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = std::env::current_dir().map_err(|e| ConfigError::Unreadable {
            path: PathBuf::from("."),
            reason: format!("working directory: {e}"),
        })?;
        Self::load_with_base(path, &base)
    }

    /// Load settings from a TOML file, resolving relative directories against `base`.
    pub fn load_with_base(path: impl AsRef<Path>, base: &Path) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content, base)
    }

    /// Parse and validate a settings document.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawSettings =
            toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        // Required keys are checked before any directory is touched.
        let store = StoreSettings {
            server: raw.mongo_server.ok_or(ConfigError::MissingKey(REQUIRED_KEYS[0]))?,
            port: raw.mongo_port.ok_or(ConfigError::MissingKey(REQUIRED_KEYS[1]))?,
            username: raw.mongo_username.ok_or(ConfigError::MissingKey(REQUIRED_KEYS[2]))?,
            password: raw.mongo_password.ok_or(ConfigError::MissingKey(REQUIRED_KEYS[3]))?,
            database: raw
                .mongo_db_universe
                .ok_or(ConfigError::MissingKey(REQUIRED_KEYS[4]))?,
        };

        let window = raw.providers.history_window_days;
        if !(0..=MAX_WINDOW_DAYS).contains(&window) {
            return Err(ConfigError::InvalidValue {
                key: "providers.history_window_days",
                reason: format!("{window} is outside 0..={MAX_WINDOW_DAYS}"),
            });
        }

        Ok(Self {
            ds_dir: ensure_dir(base, raw.ds_location.as_deref(), DEFAULT_DS_LOCATION)?,
            ta_dir: ensure_dir(base, raw.ta_location.as_deref(), DEFAULT_TA_LOCATION)?,
            universe_dir: ensure_dir(
                base,
                raw.universe_location.as_deref(),
                DEFAULT_UNIVERSE_LOCATION,
            )?,
            dailies_dir: ensure_dir(
                base,
                raw.dailies_location.as_deref(),
                DEFAULT_DAILIES_LOCATION,
            )?,
            store,
            providers: raw.providers,
        })
    }

    /// Root of the file-backed reference store: `{universe_dir}/{database}`.
    pub fn store_location(&self) -> PathBuf {
        self.universe_dir.join(&self.store.database)
    }

    /// Store endpoint for diagnostics, with the password redacted.
    pub fn store_endpoint(&self) -> String {
        format!(
            "{}:***@{}:{}/{}",
            self.store.username, self.store.server, self.store.port, self.store.database
        )
    }
}

/// Resolve a configured directory against `base` and create it if absent.
fn ensure_dir(base: &Path, configured: Option<&str>, default: &str) -> Result<PathBuf, ConfigError> {
    let dir = base.join(configured.unwrap_or(default));
    if !dir.is_dir() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(dir)
}
