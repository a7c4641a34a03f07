//! Request Descriptors
//!
//! Mints and recipients arrive from the caller, either as CLI arguments or
//! as a JSON request file:
//!
//! ```json
//! {
//!   "mints": [
//!     { "address": "46TfUxewP8FftqfN8QJYjeBktGziPkgKrejYEzrazFHa", "decimals": 9, "label": "SPL" }
//!   ],
//!   "transfers": [
//!     { "mint": "46TfUxewP8FftqfN8QJYjeBktGziPkgKrejYEzrazFHa",
//!       "recipient": "FQnMNMoQJmMT9G6eZfUADXnyizX1vo2gMo4JBQjeWPU5",
//!       "amount": "10" }
//!   ]
//! }
//! ```
//!
//! A transfer without `decimals` takes them from the matching `mints` entry.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;

use crate::amount::HumanAmount;
use crate::common::error::{Result, VaultError};
use crate::derive::parse_pubkey;

/// One vault transfer, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub mint: Pubkey,
    pub recipient: Pubkey,
    pub amount: HumanAmount,
    /// Must be the mint's real decimals; a mismatch scales silently wrong
    pub decimals: u8,
}

/// Mint entry of a request file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintSpec {
    pub address: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Transfer entry of a request file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSpec {
    pub mint: String,
    pub recipient: String,
    pub amount: HumanAmount,
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// Batch request file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFile {
    /// Mints whose vault account should exist
    #[serde(default)]
    pub mints: Vec<MintSpec>,
    /// Transfers to run after provisioning
    #[serde(default)]
    pub transfers: Vec<TransferSpec>,
}

impl RequestFile {
    /// Load and parse a JSON request file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            VaultError::InvalidInput(msg) => {
                VaultError::invalid_input(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| VaultError::invalid_input(format!("malformed request file: {}", e)))
    }

    /// Label for a mint, falling back to its address
    pub fn mint_label(&self, mint: &str) -> String {
        self.mints
            .iter()
            .find(|m| m.address == mint)
            .and_then(|m| m.label.clone())
            .unwrap_or_else(|| mint.to_string())
    }

    /// Resolve a transfer entry into a request
    pub fn resolve_transfer(&self, spec: &TransferSpec) -> Result<TransferRequest> {
        let mint = parse_pubkey(&spec.mint)?;
        let recipient = parse_pubkey(&spec.recipient)?;

        let decimals = spec
            .decimals
            .or_else(|| {
                self.mints
                    .iter()
                    .find(|m| parse_pubkey(&m.address).ok() == Some(mint))
                    .and_then(|m| m.decimals)
            })
            .ok_or_else(|| {
                VaultError::invalid_input(format!("no decimals known for mint {}", spec.mint))
            })?;

        Ok(TransferRequest {
            mint,
            recipient,
            amount: spec.amount.clone(),
            decimals,
        })
    }
}
