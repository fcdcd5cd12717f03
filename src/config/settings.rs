//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! environment variables or configuration files.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database configuration.
    pub database: DatabaseSettings,
    /// Per-chain defaults and tick-level tuning.
    pub indexer: IndexerSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// Files are loaded in this order (later overrides earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (if exists)
    /// 3. Environment variables with `INDEXER__` prefix
    ///
    /// # Arguments
    /// * `environment` - Environment name (e.g., "development", "production")
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load(environment: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("database.url", "postgres://localhost/fee_indexer")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_ms", 5000)?
            .set_default("database.idle_timeout_ms", 600_000)?
            .set_default("indexer.default_scan_interval_ms", 30_000)?
            .set_default("indexer.default_starting_block", 70_000_000_i64)?
            .set_default("indexer.default_max_block_range", 1_000)?
            .set_default("indexer.default_retry_attempts", 3)?
            .set_default("indexer.retry_base_delay_ms", 1_000)?
            .set_default("indexer.timestamp_batch_size", 5)?
            .set_default("indexer.timestamp_batch_delay_ms", 200)?
            .set_default("indexer.max_decode_error_ratio", 0.5)?
            .set_default("indexer.graceful_shutdown_ms", 30_000)?
            .set_default("indexer.rpc_probe_timeout_ms", 5_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.file_path", Option::<String>::None)?
            // Load default configuration file
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            // Load environment-specific file
            .add_source(File::with_name(&format!("{config_dir}/{environment}")).required(false))
            // Override with environment variables (INDEXER__ prefix)
            .add_source(
                Environment::with_prefix("INDEXER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load settings from a specific file path.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.is_empty() {
            errors.push("database.url cannot be empty".into());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be non-zero".into());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".into());
        }

        if self.indexer.default_scan_interval_ms == 0 {
            errors.push("indexer.default_scan_interval_ms must be non-zero".into());
        }
        if self.indexer.default_max_block_range == 0 {
            errors.push("indexer.default_max_block_range must be non-zero".into());
        }
        if self.indexer.default_retry_attempts == 0 {
            errors.push("indexer.default_retry_attempts must be non-zero".into());
        }
        if self.indexer.timestamp_batch_size == 0 {
            errors.push("indexer.timestamp_batch_size must be non-zero".into());
        }
        if !(0.0..=1.0).contains(&self.indexer.max_decode_error_ratio) {
            errors.push("indexer.max_decode_error_ratio must be between 0.0 and 1.0".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum connections to maintain.
    pub min_connections: u32,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connection timeout in milliseconds.
    pub idle_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Get the connection timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Per-chain defaults and tick-level tuning, applied when a `ChainConfig`
/// omits the corresponding field.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSettings {
    /// Default `scanInterval` when a chain omits it.
    pub default_scan_interval_ms: u64,
    /// Default `startingBlock` when a chain omits it.
    pub default_starting_block: u64,
    /// Default `maxBlockRange` when a chain omits it.
    pub default_max_block_range: u64,
    /// Default `retryAttempts` when a chain omits it.
    pub default_retry_attempts: u32,
    /// Fixed pause between Chain Client Pool retries.
    pub retry_base_delay_ms: u64,
    /// Parallel block-timestamp fetch batch size (Event Processor step 2).
    pub timestamp_batch_size: usize,
    /// Pause between timestamp-fetch batches.
    pub timestamp_batch_delay_ms: u64,
    /// Share of per-log decode errors in a window (0.0-1.0) above which a
    /// tick aborts instead of proceeding with the logs that did decode.
    pub max_decode_error_ratio: f64,
    /// Supervisor graceful shutdown budget before a worker is force-stopped.
    pub graceful_shutdown_ms: u64,
    /// Timeout for the control plane's RPC reachability probe.
    pub rpc_probe_timeout_ms: u64,
}

impl IndexerSettings {
    /// Get the retry base delay as a `Duration`.
    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Get the inter-batch delay as a `Duration`.
    #[must_use]
    pub const fn timestamp_batch_delay(&self) -> Duration {
        Duration::from_millis(self.timestamp_batch_delay_ms)
    }

    /// Get the graceful shutdown budget as a `Duration`.
    #[must_use]
    pub const fn graceful_shutdown(&self) -> Duration {
        Duration::from_millis(self.graceful_shutdown_ms)
    }

    /// Get the RPC probe timeout as a `Duration`.
    #[must_use]
    pub const fn rpc_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_probe_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
    /// Optional file path for log output.
    pub file_path: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
