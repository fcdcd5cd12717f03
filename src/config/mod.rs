//! Configuration loading and validation for the fee indexer.
//!
//! Configuration is loaded from multiple sources in order of precedence:
//! 1. Environment variables (highest)
//! 2. Environment-specific file (e.g., `development.toml`)
//! 3. Default file (`default.toml`)
//!
//! # Example
//!
//! ```ignore
//! use fee_indexer::config::Settings;
//!
//! let settings = Settings::load("development")?;
//! println!("database url: {}", settings.database.url);
//! ```

mod settings;

pub use settings::{DatabaseSettings, IndexerSettings, LoggingSettings, Settings};
