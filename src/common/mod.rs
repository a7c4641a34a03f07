//! Common Infrastructure Module
//!
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigError, ConfigOverrides, Network, RelayerConfig};
pub use error::{ErrorKind, Result, VaultError};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_provision_event,
    log_transfer_event, parse_level, EventCategory, LogEvent, LoggingError,
};
