//! Vault Program Instructions
//!
//! Builders for the two instructions the vault program exposes. Data layout
//! is Anchor's: 8-byte `sha256("global:<name>")` discriminator followed by
//! borsh-encoded arguments.

use borsh::BorshDeserialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::derive::{
    derive_vault_account, TransferAddresses, ATA_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};

pub const CREATE_PROGRAM_TOKEN_ACCOUNT: &str = "create_program_token_account";
pub const TRANSFER_TOKENS: &str = "transfer_tokens";

/// Anchor 8-byte instruction discriminator: sha256("global:{name}")[..8]
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("global:{}", name).as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// `create_program_token_account()`
///
/// Accounts: [vault ATA (w), mint, vault authority, payer (w, s),
/// token program, ATA program, system program]
pub fn create_program_token_account(
    program_id: &Pubkey,
    mint: &Pubkey,
    payer: &Pubkey,
) -> Instruction {
    let (vault_authority, vault_ata) = derive_vault_account(mint, program_id);

    let accounts = vec![
        AccountMeta::new(vault_ata, false),
        AccountMeta::new_readonly(*mint, false),
        AccountMeta::new_readonly(vault_authority, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(ATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: anchor_discriminator(CREATE_PROGRAM_TOKEN_ACCOUNT).to_vec(),
    }
}

/// `transfer_tokens(amount: u64)`
///
/// Accounts: [sender ATA (w), receiver ATA (w), mint, receiver wallet,
/// vault authority, payer (w, s), token program, ATA program, system program]
///
/// The vault authority is never a transaction signer; the program signs
/// for it with the PDA seeds.
pub fn transfer_tokens(
    program_id: &Pubkey,
    addrs: &TransferAddresses,
    payer: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(addrs.sender_ata, false),
        AccountMeta::new(addrs.receiver_ata, false),
        AccountMeta::new_readonly(addrs.mint, false),
        AccountMeta::new_readonly(addrs.recipient, false),
        AccountMeta::new_readonly(addrs.vault_authority, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(ATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];

    let mut data = Vec::with_capacity(8 + 8);
    data.extend_from_slice(&anchor_discriminator(TRANSFER_TOKENS));
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// A vault program instruction recognised from its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultInstruction {
    CreateProgramTokenAccount,
    TransferTokens { amount: u64 },
}

impl VaultInstruction {
    /// Decode instruction data; `None` for unknown discriminators or bad args
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let (disc, mut args) = data.split_at(8);

        if disc == anchor_discriminator(CREATE_PROGRAM_TOKEN_ACCOUNT) {
            args.is_empty().then_some(Self::CreateProgramTokenAccount)
        } else if disc == anchor_discriminator(TRANSFER_TOKENS) {
            let amount = u64::deserialize(&mut args).ok()?;
            args.is_empty().then_some(Self::TransferTokens { amount })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_transfer_addresses;

    #[test]
    fn test_discriminator_is_stable() {
        let a = anchor_discriminator(TRANSFER_TOKENS);
        assert_eq!(a, anchor_discriminator("transfer_tokens"));
        assert_ne!(a, anchor_discriminator(CREATE_PROGRAM_TOKEN_ACCOUNT));
    }

    #[test]
    fn test_create_account_layout() {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let payer = Pubkey::new_unique();

        let ix = create_program_token_account(&program_id, &mint, &payer);
        let (authority, ata) = derive_vault_account(&mint, &program_id);

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts.len(), 7);
        assert_eq!(ix.accounts[0].pubkey, ata);
        assert!(ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[2].pubkey, authority);
        assert!(!ix.accounts[2].is_signer);
        assert!(ix.accounts[3].is_signer && ix.accounts[3].is_writable);
        assert_eq!(ix.accounts[6].pubkey, SYSTEM_PROGRAM_ID);
        assert_eq!(
            VaultInstruction::decode(&ix.data),
            Some(VaultInstruction::CreateProgramTokenAccount)
        );
    }

    #[test]
    fn test_transfer_layout() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let addrs =
            derive_transfer_addresses(&program_id, &Pubkey::new_unique(), &Pubkey::new_unique());

        let ix = transfer_tokens(&program_id, &addrs, &payer, 10_000_000_000);

        assert_eq!(ix.accounts.len(), 9);
        assert_eq!(ix.accounts[0].pubkey, addrs.sender_ata);
        assert_eq!(ix.accounts[1].pubkey, addrs.receiver_ata);
        assert_eq!(ix.accounts[3].pubkey, addrs.recipient);
        assert_eq!(ix.accounts[4].pubkey, addrs.vault_authority);
        // Only the payer signs
        assert_eq!(ix.accounts.iter().filter(|a| a.is_signer).count(), 1);
        assert_eq!(ix.data.len(), 16);
        assert_eq!(
            VaultInstruction::decode(&ix.data),
            Some(VaultInstruction::TransferTokens {
                amount: 10_000_000_000
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown() {
        assert_eq!(VaultInstruction::decode(&[1, 2, 3]), None);
        assert_eq!(VaultInstruction::decode(&[0u8; 16]), None);

        let mut truncated = anchor_discriminator(TRANSFER_TOKENS).to_vec();
        truncated.extend_from_slice(&[1, 2]);
        assert_eq!(VaultInstruction::decode(&truncated), None);
    }
}
