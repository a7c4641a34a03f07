//! Vault Client
//!
//! Drives the vault program through a [`Ledger`]:
//! 1. `ensure_vault_account` - create the vault's token account exactly once
//! 2. `transfer` - guarded transfer from the vault to a recipient
//! 3. `run_batch` - both of the above over a request file
//!
//! Addresses are derived fresh per call; the client holds no per-request
//! state, so one instance can serve any number of mints.

pub mod batch;
pub mod provision;
pub mod transfer;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::common::error::{Result, VaultError};
use crate::derive::derive_vault_account;
use crate::ledger::Ledger;

pub use batch::{BatchReport, OutcomeStatus, RequestOutcome};
pub use provision::ProvisionOutcome;
pub use transfer::TransferReceipt;

pub struct VaultClient<L> {
    ledger: L,
    program_id: Pubkey,
}

/// Point-in-time view of one mint's vault
#[derive(Debug, Clone, Serialize)]
pub struct VaultStatus {
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub vault_authority: Pubkey,
    #[serde(with = "pubkey_string")]
    pub vault_ata: Pubkey,
    /// Base-unit balance; `None` when the vault account does not exist
    pub balance: Option<u64>,
}

impl<L: Ledger> VaultClient<L> {
    pub fn new(ledger: L, program_id: Pubkey) -> Self {
        Self { ledger, program_id }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn payer(&self) -> Pubkey {
        self.ledger.payer()
    }

    /// Whether the loaded payer is the one the program accepts for
    /// transfers; `None` when no restriction is configured
    pub fn payer_is_authorized(&self, authorized: Option<&Pubkey>) -> Option<bool> {
        authorized.map(|authorized| *authorized == self.ledger.payer())
    }

    /// Payer lamport balance
    pub async fn payer_balance(&self) -> Result<u64> {
        self.ledger
            .sol_balance(&self.ledger.payer())
            .await
            .map_err(VaultError::ledger)
    }

    /// Addresses and balance of the vault for `mint`
    pub async fn vault_status(&self, mint: &Pubkey) -> Result<VaultStatus> {
        let (vault_authority, vault_ata) = derive_vault_account(mint, &self.program_id);
        let balance = self
            .ledger
            .token_balance(&vault_ata)
            .await
            .map_err(VaultError::ledger)?;

        Ok(VaultStatus {
            mint: *mint,
            vault_authority,
            vault_ata,
            balance,
        })
    }
}

/// Serialize pubkeys as base58 strings in reports
pub(crate) mod pubkey_string {
    use serde::Serializer;
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(key)
    }
}
