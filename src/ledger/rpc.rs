//! Solana RPC Ledger
//!
//! Thin adapter over the nonblocking `RpcClient`. Timeouts belong to the
//! transport and are fixed when the client is built.

use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_request::{RpcError, RpcResponseErrorData},
    rpc_response::RpcSimulateTransactionResult,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::path::Path;
use std::time::Duration;

use super::traits::{Ledger, LedgerError, LedgerResult};
use crate::common::config::RelayerConfig;
use crate::common::error::{Result, VaultError};

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        let logs = match &err.kind {
            ClientErrorKind::RpcError(RpcError::RpcResponseError {
                data:
                    RpcResponseErrorData::SendTransactionPreflightFailure(
                        RpcSimulateTransactionResult {
                            logs: Some(logs), ..
                        },
                    ),
                ..
            }) => logs.clone(),
            _ => Vec::new(),
        };

        Self {
            message: err.to_string(),
            transaction_error: err.get_transaction_error(),
            logs,
        }
    }
}

pub struct RpcLedger {
    rpc: RpcClient,
    payer: Keypair,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(
        rpc_url: impl Into<String>,
        payer: Keypair,
        commitment: CommitmentConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            rpc: RpcClient::new_with_timeout_and_commitment(rpc_url.into(), timeout, commitment),
            payer,
            commitment,
        }
    }

    /// Build from config, loading the payer keypair from disk
    pub fn from_config(config: &RelayerConfig) -> Result<Self> {
        let payer = load_keypair_from_file(&config.payer_keypair)?;
        Ok(Self::new(
            config.rpc_url.clone(),
            payer,
            config.commitment,
            config.rpc_timeout,
        ))
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    async fn account_exists(&self, address: &Pubkey) -> LedgerResult<bool> {
        let account = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value;
        Ok(account.is_some())
    }

    async fn token_balance(&self, address: &Pubkey) -> LedgerResult<Option<u64>> {
        if !self.account_exists(address).await? {
            return Ok(None);
        }

        let balance = self
            .rpc
            .get_token_account_balance_with_commitment(address, self.commitment)
            .await?
            .value;
        balance
            .amount
            .parse()
            .map(Some)
            .map_err(|_| LedgerError::new(format!("unparseable token amount: {}", balance.amount)))
    }

    async fn sol_balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        Ok(self
            .rpc
            .get_balance_with_commitment(address, self.commitment)
            .await?
            .value)
    }

    async fn submit(&self, instructions: &[Instruction]) -> LedgerResult<Signature> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            &[&self.payer],
            recent_blockhash,
        );

        let sig = self.rpc.send_and_confirm_transaction(&tx).await?;

        tracing::debug!(target: "vault_relayer::ledger", signature = %sig, "transaction confirmed");
        Ok(sig)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a Solana CLI style keypair (JSON array of 64 bytes)
pub fn load_keypair_from_file(path: impl AsRef<Path>) -> Result<Keypair> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&content).map_err(|e| {
        VaultError::invalid_input(format!("invalid keypair file {}: {}", path.display(), e))
    })?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| {
        VaultError::invalid_input(format!("invalid keypair file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_keypair_roundtrip() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = load_keypair_from_file(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_keypair_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2, 3]").unwrap();

        let err = load_keypair_from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);

        let err = load_keypair_from_file("/nonexistent/id.json").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[tokio::test]
    #[ignore = "Requires a reachable Solana RPC endpoint"]
    async fn test_devnet_queries() {
        let ledger = RpcLedger::new(
            crate::common::config::Network::Devnet.default_rpc(),
            Keypair::new(),
            CommitmentConfig::confirmed(),
            Duration::from_secs(10),
        );

        assert_eq!(ledger.sol_balance(&ledger.payer()).await.unwrap(), 0);
        assert!(!ledger.account_exists(&Pubkey::new_unique()).await.unwrap());
        assert_eq!(ledger.token_balance(&Pubkey::new_unique()).await.unwrap(), None);
    }
}
