//! Structured Logging for the Vault Relayer
//!
//! - JSON output for log aggregation, pretty output for terminals
//! - Correlation IDs per relayed request
//! - Structured provision / transfer events
//!
//! ```rust,ignore
//! use vault_relayer::common::logging::init_logging;
//!
//! init_logging(tracing::Level::INFO, false)?;
//! tracing::info!(target: "vault_relayer::transfer", %mint, "transferring");
//! ```

use serde::{Serialize, Serializer};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Parse a level name, falling back to INFO for anything unrecognised
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_lowercase().as_str() {
        "warning" => Level::WARN,
        other => other.parse().unwrap_or(Level::INFO),
    }
}

fn level_name<S: Serializer>(level: &Level, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(level)
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// What a structured event is about
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Vault account provisioning
    Provision,
    /// Vault -> recipient transfers
    Transfer,
    /// Batch runs over a request file
    Batch,
}

/// One JSON line per relayed request
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// RFC 3339
    pub timestamp: String,
    #[serde(serialize_with = "level_name")]
    pub level: Level,
    pub category: EventCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: Level, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level,
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach `(code, message)` and raise the level to ERROR
    pub fn with_failure(mut self, failure: Option<(&str, &str)>) -> Self {
        if let Some((code, message)) = failure {
            self.level = Level::ERROR;
            self.error = Some(ErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            });
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"message":{:?},"serialize_error":{:?}}}"#,
                self.message,
                e.to_string()
            )
        })
    }

    /// Emit on the `vault_relayer::events` target at the event's own level
    pub fn emit(&self) {
        let line = self.to_json();
        if self.level == Level::ERROR {
            tracing::error!(target: "vault_relayer::events", "{}", line);
        } else if self.level == Level::WARN {
            tracing::warn!(target: "vault_relayer::events", "{}", line);
        } else {
            tracing::info!(target: "vault_relayer::events", "{}", line);
        }
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log the outcome of a vault account provisioning attempt
pub fn log_provision_event(
    mint: &str,
    vault_ata: &str,
    created: bool,
    error: Option<(&str, &str)>,
    correlation_id: &str,
) {
    let message = match (error.is_some(), created) {
        (true, _) => "vault account provisioning failed",
        (false, true) => "vault account created",
        (false, false) => "vault account already exists",
    };

    LogEvent::new(Level::INFO, EventCategory::Provision, message)
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({ "mint": mint, "vault_ata": vault_ata, "created": created }))
        .with_failure(error)
        .emit();
}

/// Log the outcome of a vault transfer
pub fn log_transfer_event(
    mint: &str,
    recipient: &str,
    amount: u64,
    signature: Option<&str>,
    error: Option<(&str, &str)>,
    correlation_id: &str,
) {
    let message = if error.is_some() { "transfer failed" } else { "transfer confirmed" };

    LogEvent::new(Level::INFO, EventCategory::Transfer, message)
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "mint": mint,
            "recipient": recipient,
            "amount": amount,
            "signature": signature,
        }))
        .with_failure(error)
        .emit();
}

// ============================================================================
// Initialization
// ============================================================================

/// Install the global subscriber; `RUST_LOG` wins over `level` when set.
/// Human-readable output goes to stderr so stdout stays clean for reports.
pub fn init_logging(level: Level, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vault_relayer={}", level.to_string().to_lowercase()))
    });

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

pub fn init_from_config(config: &super::config::RelayerConfig) -> Result<(), LoggingError> {
    init_logging(parse_level(&config.log_level), config.log_json)
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    InitFailed(String),
}

/// Short random id tying together the log lines of one relayed request
pub fn generate_correlation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}
