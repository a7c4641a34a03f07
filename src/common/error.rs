//! Common Error Types for the Vault Relayer
//!
//! `VaultError` is the single structured failure value handed to callers:
//! every variant reports an [`ErrorKind`] plus its underlying cause.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::classify::FailureKind;
use crate::ledger::LedgerError;

/// Coarse failure kind used by callers to pick abort / skip / retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed address, amount or request file
    InvalidInput,
    /// A required token account does not exist
    AccountMissing,
    /// Account creation lost a race; never surfaced by provisioning
    AlreadyExists,
    /// Payer or vault cannot cover the operation
    InsufficientFunds,
    /// Program not deployed or instruction not found
    ProgramUnavailable,
    /// Payer is not accepted by the program
    Unauthorized,
    /// Program refused the instruction for a fixed reason
    Rejected,
    /// Bad or missing configuration
    Config,
    /// Local IO failure (keypair files, request files)
    Io,
    Unknown,
}

impl From<FailureKind> for ErrorKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::AccountMissing => ErrorKind::AccountMissing,
            FailureKind::AlreadyExists => ErrorKind::AlreadyExists,
            FailureKind::InsufficientFunds => ErrorKind::InsufficientFunds,
            FailureKind::ProgramUnavailable => ErrorKind::ProgramUnavailable,
            FailureKind::Unauthorized => ErrorKind::Unauthorized,
            FailureKind::Rejected => ErrorKind::Rejected,
            FailureKind::Unknown => ErrorKind::Unknown,
        }
    }
}

/// Root error type for the relayer
#[derive(Debug, Error)]
pub enum VaultError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Caller contract violations
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Required account absent; detected before any submission
    #[error("{role} account {address} does not exist")]
    AccountMissing { role: &'static str, address: Pubkey },

    /// Ledger query or submission failure, classified
    #[error("ledger error [{kind:?}]: {source}")]
    Ledger {
        kind: FailureKind,
        #[source]
        source: LedgerError,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an account missing error
    pub fn account_missing(role: &'static str, address: Pubkey) -> Self {
        Self::AccountMissing { role, address }
    }

    /// Wrap a ledger failure, classifying it
    pub fn ledger(source: LedgerError) -> Self {
        Self::Ledger {
            kind: crate::classify::classify(&source),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Config(_) => ErrorKind::Config,
            VaultError::Logging(_) => ErrorKind::Unknown,
            VaultError::InvalidInput(_) => ErrorKind::InvalidInput,
            VaultError::AccountMissing { .. } => ErrorKind::AccountMissing,
            VaultError::Ledger { kind, .. } => (*kind).into(),
            VaultError::Io(_) => ErrorKind::Io,
        }
    }

    /// Program is not deployed here; batch callers skip and continue
    pub fn is_skippable(&self) -> bool {
        self.kind() == ErrorKind::ProgramUnavailable
    }

    /// Hint for external retry policy. Nothing in this crate retries.
    ///
    /// Only unclassified ledger failures that are transient qualify: the
    /// transport failed, or the runtime refused for a momentary reason such
    /// as an expired blockhash.
    pub fn is_retryable(&self) -> bool {
        match self {
            VaultError::Ledger {
                kind: FailureKind::Unknown,
                source,
            } => crate::classify::is_transient(source),
            _ => false,
        }
    }

    /// Stable code for logs and reports
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::AccountMissing => "ACCOUNT_MISSING",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::ProgramUnavailable => "PROGRAM_UNAVAILABLE",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Rejected => "PROGRAM_REJECTED",
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;
