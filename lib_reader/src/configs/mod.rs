//! # Configuration Modules
//!
//! Reader tuning loaded from JSON files with environment overrides.

/// Reader configuration: retry policy and live-source polling.
pub mod config_reader;

pub use config_reader::{load_reader_config, ConfigError, ReaderConfig};
