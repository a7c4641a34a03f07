//! Vault Account Provisioning
//!
//! Query first, create only when absent. A creation that loses a race with
//! another relayer comes back as "already in use"; that is classified right
//! after submission and reported as an existing account, not an error.

use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::{pubkey_string, VaultClient};
use crate::common::error::{ErrorKind, Result, VaultError};
use crate::common::logging::{generate_correlation_id, log_provision_event};
use crate::derive::derive_vault_account;
use crate::instruction;
use crate::ledger::Ledger;

/// Result of `ensure_vault_account`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionOutcome {
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub vault_authority: Pubkey,
    /// Vault ATA address, identical whether or not this call created it
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    /// True only if this call's transaction created the account
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_signature")]
    pub signature: Option<Signature>,
}

fn opt_signature<S: serde::Serializer>(sig: &Option<Signature>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match sig {
        Some(sig) => s.collect_str(sig),
        None => s.serialize_none(),
    }
}

impl<L: Ledger> VaultClient<L> {
    /// Make sure the vault token account for `mint` exists
    pub async fn ensure_vault_account(&self, mint: &Pubkey) -> Result<ProvisionOutcome> {
        let correlation_id = generate_correlation_id();
        let (vault_authority, address) = derive_vault_account(mint, &self.program_id);
        let mint_str = mint.to_string();
        let address_str = address.to_string();

        let outcome = |created: bool, signature: Option<Signature>| ProvisionOutcome {
            mint: *mint,
            vault_authority,
            address,
            created,
            signature,
        };
        let report_failure = |err: &VaultError| {
            log_provision_event(
                &mint_str,
                &address_str,
                false,
                Some((err.error_code(), &err.to_string())),
                &correlation_id,
            );
        };

        tracing::debug!(
            target: "vault_relayer::provision",
            %mint, %vault_authority, vault_ata = %address,
            "checking vault account"
        );

        let exists = match self.ledger.account_exists(&address).await {
            Ok(exists) => exists,
            Err(e) => {
                let err = VaultError::ledger(e);
                report_failure(&err);
                return Err(err);
            }
        };

        if exists {
            log_provision_event(&mint_str, &address_str, false, None, &correlation_id);
            return Ok(outcome(false, None));
        }

        let ix = instruction::create_program_token_account(
            &self.program_id,
            mint,
            &self.ledger.payer(),
        );

        match self.ledger.submit(&[ix]).await {
            Ok(signature) => {
                log_provision_event(&mint_str, &address_str, true, None, &correlation_id);
                Ok(outcome(true, Some(signature)))
            }
            Err(e) => {
                let err = VaultError::ledger(e);
                if err.kind() == ErrorKind::AlreadyExists {
                    tracing::warn!(
                        target: "vault_relayer::provision",
                        %mint, vault_ata = %address,
                        "vault account created concurrently by another submitter"
                    );
                    log_provision_event(&mint_str, &address_str, false, None, &correlation_id);
                    return Ok(outcome(false, None));
                }
                report_failure(&err);
                Err(err)
            }
        }
    }
}
