// crates/context-trust-server/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: TOML configuration for the trust server.
// Purpose: Load, parse, and validate the full server configuration tree.
// Dependencies: context-trust-monitor, context-trust-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! One TOML file configures the whole server: bind address and scheduler
//! secret, the backing store (in-memory or `SQLite`), the on-chain stake
//! oracle, and the health prober. Loading enforces a size cap and UTF-8
//! before parsing; validation walks the tree once so a bad file fails at
//! startup instead of on the first request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use context_trust_monitor::DEFAULT_BATCH_SIZE;
use context_trust_monitor::EvmOracleConfig;
use context_trust_store_sqlite::SqliteStoreMode;
use context_trust_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Default HTTP bind address.
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8788";
/// Default USD price floor below which tools skip stake reconciliation.
const DEFAULT_PRICE_FLOOR: &str = "0.001";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
///
/// # Invariants
/// - `Invalid` messages name the offending field.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// The file was not valid TOML for the expected schema.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A field value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Tree
// ============================================================================

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustServerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,
    /// Backing store selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Stake oracle settings. Absent means stake sync runs as skipped.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Health prober settings.
    #[serde(default)]
    pub prober: ProberConfig,
    /// Stake reconciler settings.
    #[serde(default)]
    pub stake: StakeConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind_address")]
    pub bind: String,
    /// Shared secret for the internal scheduler endpoints.
    pub scheduler_secret: String,
}

/// Which store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Volatile in-memory store, for development.
    Memory,
    /// Durable `SQLite` store.
    #[default]
    Sqlite,
}

/// Backing store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend.
    #[serde(default)]
    pub kind: StoreKind,
    /// Database file path, required for the `SQLite` backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Stake oracle configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// JSON-RPC endpoint of the chain node.
    #[serde(default)]
    pub rpc_url: String,
    /// Hex address of the router contract.
    #[serde(default)]
    pub contract_address: String,
    /// Request timeout in milliseconds. Zero uses the oracle default.
    #[serde(default)]
    pub timeout_ms: u64,
}

/// Health prober configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProberConfig {
    /// Concurrent probes per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Allow probing loopback and private-network hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

/// Stake reconciler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StakeConfig {
    /// USD price floor below which tools are not reconciled.
    #[serde(default = "default_price_floor")]
    pub price_floor: String,
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default bind address.
fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

/// Returns the default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Returns the default probe batch size.
const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Returns the default stake price floor.
fn default_price_floor() -> String {
    DEFAULT_PRICE_FLOOR.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            scheduler_secret: String::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            allow_private_hosts: false,
        }
    }
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            price_floor: default_price_floor(),
        }
    }
}

// ============================================================================
// SECTION: Loading and Validation
// ============================================================================

impl TrustServerConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the
    /// size cap, is not UTF-8 TOML, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata =
            fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file exceeds {MAX_CONFIG_FILE_SIZE} bytes"
            )));
        }
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Parse("config file is not UTF-8".to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the whole configuration tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must not be empty".to_string()));
        }
        if self.server.scheduler_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.scheduler_secret must not be empty".to_string(),
            ));
        }
        if self.store.kind == StoreKind::Sqlite && self.store.path.is_none() {
            return Err(ConfigError::Invalid(
                "store.path is required for the sqlite backend".to_string(),
            ));
        }
        if self.prober.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "prober.batch_size must be at least 1".to_string(),
            ));
        }
        if BigDecimal::from_str(&self.stake.price_floor).is_err() {
            return Err(ConfigError::Invalid(
                "stake.price_floor must be a decimal number".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the oracle configuration when both endpoint fields are set.
    #[must_use]
    pub fn oracle_config(&self) -> Option<EvmOracleConfig> {
        if self.oracle.rpc_url.trim().is_empty()
            || self.oracle.contract_address.trim().is_empty()
        {
            return None;
        }
        Some(EvmOracleConfig {
            rpc_url: self.oracle.rpc_url.clone(),
            contract_address: self.oracle.contract_address.clone(),
            timeout_ms: self.oracle.timeout_ms,
        })
    }

    /// Returns the parsed stake price floor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the floor is not a decimal;
    /// [`TrustServerConfig::validate`] rejects that earlier.
    pub fn price_floor(&self) -> Result<BigDecimal, ConfigError> {
        BigDecimal::from_str(&self.stake.price_floor).map_err(|_| {
            ConfigError::Invalid("stake.price_floor must be a decimal number".to_string())
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
