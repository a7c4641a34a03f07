//! Ledger Module
//!
//! Chain access behind the [`Ledger`] trait:
//! - `rpc` - Solana JSON-RPC backend
//! - `memory` - In-process vault program simulation

pub mod memory;
pub mod rpc;
pub mod traits;

pub use memory::MemoryLedger;
pub use rpc::{load_keypair_from_file, RpcLedger};
pub use traits::{Ledger, LedgerError, LedgerResult};

#[cfg(test)]
pub use traits::MockLedger;
