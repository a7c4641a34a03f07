//! Guarded Vault Transfers
//!
//! Pre-flight checks run before anything is signed: the amount must scale to
//! a nonzero u64 and the vault token account must exist. The receiver's ATA
//! is not checked; the program creates it on demand (`init_if_needed`).

use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::{pubkey_string, VaultClient};
use crate::amount::HumanAmount;
use crate::common::error::{Result, VaultError};
use crate::common::logging::{generate_correlation_id, log_transfer_event};
use crate::derive::{derive_transfer_addresses, TransferAddresses};
use crate::instruction;
use crate::ledger::Ledger;
use crate::request::TransferRequest;

/// Confirmed transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    #[serde(serialize_with = "signature_string")]
    pub signature: Signature,
    /// Base units moved
    pub amount: u64,
    pub decimals: u8,
    #[serde(with = "pubkey_string")]
    pub sender_ata: Pubkey,
    #[serde(with = "pubkey_string")]
    pub receiver_ata: Pubkey,
}

fn signature_string<S: serde::Serializer>(
    sig: &Signature,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(sig)
}

impl TransferReceipt {
    fn new(signature: Signature, addrs: &TransferAddresses, amount: u64, decimals: u8) -> Self {
        Self {
            signature,
            amount,
            decimals,
            sender_ata: addrs.sender_ata,
            receiver_ata: addrs.receiver_ata,
        }
    }
}

impl<L: Ledger> VaultClient<L> {
    /// Transfer `amount` (human units at `decimals`) of `mint` from the vault
    /// to `recipient`. Every call moves funds; there is no deduplication.
    pub async fn transfer(
        &self,
        mint: &Pubkey,
        recipient: &Pubkey,
        amount: &HumanAmount,
        decimals: u8,
    ) -> Result<TransferReceipt> {
        let correlation_id = generate_correlation_id();
        let addrs = derive_transfer_addresses(&self.program_id, mint, recipient);

        let result = self.transfer_guarded(&addrs, amount, decimals).await;

        let (mint_str, recipient_str) = (mint.to_string(), recipient.to_string());
        match &result {
            Ok(receipt) => log_transfer_event(
                &mint_str,
                &recipient_str,
                receipt.amount,
                Some(&receipt.signature.to_string()),
                None,
                &correlation_id,
            ),
            Err(err) => log_transfer_event(
                &mint_str,
                &recipient_str,
                amount.to_base_units(decimals).unwrap_or(0),
                None,
                Some((err.error_code(), &err.to_string())),
                &correlation_id,
            ),
        }

        result
    }

    /// Run a resolved transfer request
    pub async fn transfer_request(&self, req: &TransferRequest) -> Result<TransferReceipt> {
        self.transfer(&req.mint, &req.recipient, &req.amount, req.decimals)
            .await
    }

    async fn transfer_guarded(
        &self,
        addrs: &TransferAddresses,
        amount: &HumanAmount,
        decimals: u8,
    ) -> Result<TransferReceipt> {
        let base_amount = amount.to_base_units(decimals)?;
        if base_amount == 0 {
            return Err(VaultError::invalid_input(format!(
                "amount {} is zero base units at {} decimals",
                amount, decimals
            )));
        }
        if amount.truncates_at(decimals) {
            tracing::warn!(
                target: "vault_relayer::transfer",
                %amount, decimals, base_amount,
                "amount has more fractional digits than the mint; truncated"
            );
        }

        let sender_exists = self
            .ledger
            .account_exists(&addrs.sender_ata)
            .await
            .map_err(VaultError::ledger)?;
        if !sender_exists {
            return Err(VaultError::account_missing("vault token", addrs.sender_ata));
        }

        tracing::debug!(
            target: "vault_relayer::transfer",
            mint = %addrs.mint,
            vault_authority = %addrs.vault_authority,
            sender_ata = %addrs.sender_ata,
            receiver_ata = %addrs.receiver_ata,
            base_amount,
            "submitting transfer"
        );

        let ix = instruction::transfer_tokens(
            &self.program_id,
            addrs,
            &self.ledger.payer(),
            base_amount,
        );
        let signature = self.ledger.submit(&[ix]).await.map_err(VaultError::ledger)?;

        Ok(TransferReceipt::new(signature, addrs, base_amount, decimals))
    }
}
