//! Vault Relayer
//!
//! Client side of a program-owned SPL token vault. The vault program keeps
//! one token account per mint, owned by the PDA `["vault", mint]`; this crate
//! drives it from the outside.
//!
//! ## Protocol
//!
//! 1. **Derive** - vault authority PDA and associated token accounts, pure
//! 2. **Provision** - create the vault token account, at most once
//! 3. **Transfer** - guarded transfer out of the vault to any wallet
//!
//! Failures come back as [`VaultError`] with an [`ErrorKind`] that tells
//! the caller whether to abort, skip (program not deployed), or hand off to
//! an external retry policy.

pub mod amount;
pub mod classify;
pub mod common;
pub mod derive;
pub mod instruction;
pub mod ledger;
pub mod request;
pub mod vault;

// Re-exports: errors and config
pub use common::{ErrorKind, RelayerConfig, Result, VaultError};

// Re-exports: derivation
pub use derive::{
    derive_associated_account, derive_transfer_addresses, derive_vault_authority,
    TransferAddresses,
};

// Re-exports: ledger backends
pub use ledger::{Ledger, LedgerError, MemoryLedger, RpcLedger};

// Re-exports: client
pub use amount::HumanAmount;
pub use classify::{classify, FailureKind};
pub use request::{RequestFile, TransferRequest};
pub use vault::{BatchReport, ProvisionOutcome, TransferReceipt, VaultClient, VaultStatus};
