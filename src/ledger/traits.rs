//! Ledger Trait Definitions
//!
//! The relayer needs little from the chain: does an account
//! exist, what does it hold, who pays, and submission. Implementations:
//! - `RpcLedger` - Solana JSON-RPC (devnet / mainnet / localnet)
//! - `MemoryLedger` - In-process simulation of the vault program

use async_trait::async_trait;
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature,
    transaction::TransactionError,
};
use thiserror::Error;

/// Raw failure reported by a ledger backend
///
/// Carries whatever structure the backend exposes: the transaction error when
/// the runtime reported one, and program logs from simulation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LedgerError {
    pub message: String,
    pub transaction_error: Option<TransactionError>,
    pub logs: Vec<String>,
}

impl LedgerError {
    /// Unstructured failure (transport, decoding)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transaction_error: None,
            logs: Vec::new(),
        }
    }

    /// Failure with a runtime-reported transaction error
    pub fn transaction(message: impl Into<String>, err: TransactionError) -> Self {
        Self {
            message: message.into(),
            transaction_error: Some(err),
            logs: Vec::new(),
        }
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = logs;
        self
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Chain access used by provisioning and transfers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fee payer and signer of every submitted transaction
    fn payer(&self) -> Pubkey;

    /// Whether an account is present at `address`
    async fn account_exists(&self, address: &Pubkey) -> LedgerResult<bool>;

    /// Token balance in base units; `None` if the token account does not exist
    async fn token_balance(&self, address: &Pubkey) -> LedgerResult<Option<u64>>;

    /// Lamport balance of `address`
    async fn sol_balance(&self, address: &Pubkey) -> LedgerResult<u64>;

    /// Sign with the payer, submit, and wait for confirmation
    async fn submit(&self, instructions: &[Instruction]) -> LedgerResult<Signature>;
}
