//! Vault Address Derivation
//!
//! Pure, chain-free derivation of every address the relayer touches:
//! - Vault authority PDA: seeds `[b"vault", mint]` under the vault program
//! - Associated token accounts: seeds `[owner, token_program, mint]` under the
//!   ATA program (standard SPL rule)
//!
//! Anyone holding the program id and mint can recompute these without RPC
//! access, and the result does not depend on whether the account exists yet.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::common::error::{Result, VaultError};

// ============================================================================
// Constants
// ============================================================================

/// Seed tag for the per-mint vault authority PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// SPL Token program ID
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Associated Token Account program ID
pub const ATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// System program ID
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::system_program::ID;

// ============================================================================
// Derivation
// ============================================================================

/// Derive the vault authority PDA for `mint`
pub fn derive_vault_authority(mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    derive_vault_authority_with_bump(mint, program_id).0
}

/// Derive the vault authority PDA together with its canonical bump
pub fn derive_vault_authority_with_bump(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, mint.as_ref()], program_id)
}

/// Compute the associated token address of `owner` for `mint`
pub fn derive_associated_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    )
    .0
}

/// The vault's own token account: ATA owned by the vault authority
pub fn derive_vault_account(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, Pubkey) {
    let vault_authority = derive_vault_authority(mint, program_id);
    let vault_ata = derive_associated_account(&vault_authority, mint);
    (vault_authority, vault_ata)
}

/// Every address a single transfer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAddresses {
    pub mint: Pubkey,
    pub recipient: Pubkey,
    pub vault_authority: Pubkey,
    /// Vault ATA (owner = vault authority)
    pub sender_ata: Pubkey,
    /// Recipient ATA (owner = recipient wallet)
    pub receiver_ata: Pubkey,
}

/// Derive sender and receiver accounts for a transfer of `mint` to `recipient`
pub fn derive_transfer_addresses(
    program_id: &Pubkey,
    mint: &Pubkey,
    recipient: &Pubkey,
) -> TransferAddresses {
    let (vault_authority, sender_ata) = derive_vault_account(mint, program_id);

    TransferAddresses {
        mint: *mint,
        recipient: *recipient,
        vault_authority,
        sender_ata,
        receiver_ata: derive_associated_account(recipient, mint),
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a base58 pubkey, failing fast on malformed input
pub fn parse_pubkey(s: &str) -> Result<Pubkey> {
    Pubkey::from_str(s.trim())
        .map_err(|e| VaultError::invalid_input(format!("invalid address '{}': {}", s, e)))
}

/// Build a pubkey from raw bytes; anything but 32 bytes is rejected
pub fn pubkey_from_bytes(bytes: &[u8]) -> Result<Pubkey> {
    Pubkey::try_from(bytes).map_err(|_| {
        VaultError::invalid_input(format!("address must be 32 bytes, got {}", bytes.len()))
    })
}
