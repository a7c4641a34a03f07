//! In-Memory Ledger
//!
//! Simulates the vault program against an in-process account table for tests
//! and `--simulate` runs. Data is lost when the process exits.
//!
//! Behaviour mirrors the deployed program:
//! - `create_program_token_account` fails with "already in use" when the
//!   vault ATA exists
//! - `transfer_tokens` requires the vault ATA, creates the receiver ATA on
//!   demand, and rejects zero or uncovered amounts
//! - When an authorized payer is set, `transfer_tokens` from any other payer
//!   fails with `Unauthorized` (6004)
//! - Each submission applies atomically; a failed one leaves state unchanged

use async_trait::async_trait;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::Signature,
    transaction::TransactionError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{Ledger, LedgerError, LedgerResult};
use crate::derive::derive_transfer_addresses;
use crate::instruction::{self as vault_ix, VaultInstruction};

/// Lamports given to the simulated payer
const DEFAULT_PAYER_LAMPORTS: u64 = 10_000_000_000;

/// Simulated ledger state
#[derive(Debug, Default)]
struct MemoryState {
    /// Token accounts and their base-unit balances
    token_accounts: HashMap<Pubkey, u64>,
    payer_lamports: u64,
    program_deployed: bool,
    /// Every submitted batch, failed or not
    submissions: Vec<Vec<Instruction>>,
    queries: u64,
    next_failure: Option<LedgerError>,
}

/// In-memory vault program simulation
#[derive(Clone)]
pub struct MemoryLedger {
    program_id: Pubkey,
    payer: Pubkey,
    /// The only payer `transfer_tokens` accepts, when set
    authorized_payer: Option<Pubkey>,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryLedger {
    /// Create a ledger with the vault program deployed under `program_id`
    pub fn new(program_id: Pubkey) -> Self {
        Self::with_program(program_id, true)
    }

    /// Create a ledger where the vault program is not deployed
    pub fn without_program(program_id: Pubkey) -> Self {
        Self::with_program(program_id, false)
    }

    fn with_program(program_id: Pubkey, program_deployed: bool) -> Self {
        Self {
            program_id,
            payer: Pubkey::new_unique(),
            authorized_payer: None,
            state: Arc::new(RwLock::new(MemoryState {
                payer_lamports: DEFAULT_PAYER_LAMPORTS,
                program_deployed,
                ..Default::default()
            })),
        }
    }

    /// Sign as `payer` instead of a random key
    pub fn with_payer(mut self, payer: Pubkey) -> Self {
        self.payer = payer;
        self
    }

    /// Only accept transfers paid by `payer`
    pub fn with_authorized_payer(mut self, payer: Pubkey) -> Self {
        self.authorized_payer = Some(payer);
        self
    }

    /// Set the token balance of an existing or new token account
    pub async fn set_token_balance(&self, address: Pubkey, amount: u64) {
        self.state.write().await.token_accounts.insert(address, amount);
    }

    /// Make the next `submit` fail with `err` without touching state
    pub async fn fail_next_submit(&self, err: LedgerError) {
        self.state.write().await.next_failure = Some(err);
    }

    /// Number of `submit` calls so far, including failed ones
    pub async fn submission_count(&self) -> usize {
        self.state.read().await.submissions.len()
    }

    /// All submitted instruction batches
    pub async fn submissions(&self) -> Vec<Vec<Instruction>> {
        self.state.read().await.submissions.clone()
    }

    /// Number of account queries so far
    pub async fn query_count(&self) -> u64 {
        self.state.read().await.queries
    }

    fn apply(
        &self,
        accounts: &mut HashMap<Pubkey, u64>,
        index: u8,
        ix: &Instruction,
    ) -> LedgerResult<()> {
        let fail = |err: InstructionError, log: String| {
            LedgerError::transaction(
                format!(
                    "Transaction simulation failed: Error processing Instruction {}: {}",
                    index, err
                ),
                TransactionError::InstructionError(index, err),
            )
            .with_logs(vec![format!("Program {} invoke [1]", self.program_id), log])
        };

        let decoded = VaultInstruction::decode(&ix.data).ok_or_else(|| {
            fail(
                InstructionError::Custom(101),
                anchor_log("InstructionFallbackNotFound", 101),
            )
        })?;

        match decoded {
            VaultInstruction::CreateProgramTokenAccount => {
                let (mint, payer) = match (ix.accounts.get(1), ix.accounts.get(3)) {
                    (Some(mint), Some(payer)) => (mint.pubkey, payer.pubkey),
                    _ => return Err(fail(InstructionError::NotEnoughAccountKeys, String::new())),
                };
                let expected = vault_ix::create_program_token_account(&self.program_id, &mint, &payer);
                if expected.accounts != ix.accounts {
                    return Err(fail(
                        InstructionError::Custom(2006),
                        anchor_log("ConstraintSeeds", 2006),
                    ));
                }

                let vault_ata = expected.accounts[0].pubkey;
                if accounts.contains_key(&vault_ata) {
                    return Err(fail(
                        InstructionError::Custom(0),
                        format!(
                            "Allocate: account Address {{ address: {}, base: None }} already in use",
                            vault_ata
                        ),
                    ));
                }
                accounts.insert(vault_ata, 0);
            }
            VaultInstruction::TransferTokens { amount } => {
                let (mint, recipient, payer) =
                    match (ix.accounts.get(2), ix.accounts.get(3), ix.accounts.get(5)) {
                        (Some(m), Some(r), Some(p)) => (m.pubkey, r.pubkey, p.pubkey),
                        _ => {
                            return Err(fail(InstructionError::NotEnoughAccountKeys, String::new()))
                        }
                    };
                let addrs = derive_transfer_addresses(&self.program_id, &mint, &recipient);
                let expected = vault_ix::transfer_tokens(&self.program_id, &addrs, &payer, amount);
                if expected.accounts != ix.accounts {
                    return Err(fail(
                        InstructionError::Custom(2006),
                        anchor_log("ConstraintSeeds", 2006),
                    ));
                }

                // Account deserialization precedes the handler body
                let Some(&sender_balance) = accounts.get(&addrs.sender_ata) else {
                    return Err(fail(
                        InstructionError::Custom(3012),
                        anchor_log("AccountNotInitialized", 3012),
                    ));
                };
                if amount == 0 {
                    return Err(fail(
                        InstructionError::Custom(6000),
                        anchor_log("InvalidAmount", 6000),
                    ));
                }
                if self.authorized_payer.is_some_and(|authorized| authorized != payer) {
                    return Err(fail(
                        InstructionError::Custom(6004),
                        anchor_log("Unauthorized", 6004),
                    ));
                }
                if sender_balance < amount {
                    return Err(fail(
                        InstructionError::Custom(1),
                        "Program log: Error: insufficient funds".to_string(),
                    ));
                }

                accounts.insert(addrs.sender_ata, sender_balance - amount);
                let receiver = accounts.entry(addrs.receiver_ata).or_insert(0);
                *receiver = receiver.saturating_add(amount);
            }
        }

        Ok(())
    }
}

fn anchor_log(name: &str, number: u32) -> String {
    format!(
        "Program log: AnchorError occurred. Error Code: {}. Error Number: {}.",
        name, number
    )
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn payer(&self) -> Pubkey {
        self.payer
    }

    async fn account_exists(&self, address: &Pubkey) -> LedgerResult<bool> {
        let mut state = self.state.write().await;
        state.queries += 1;
        Ok(state.token_accounts.contains_key(address) || *address == self.payer)
    }

    async fn token_balance(&self, address: &Pubkey) -> LedgerResult<Option<u64>> {
        let mut state = self.state.write().await;
        state.queries += 1;
        Ok(state.token_accounts.get(address).copied())
    }

    async fn sol_balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        let state = self.state.read().await;
        Ok(if *address == self.payer {
            state.payer_lamports
        } else {
            0
        })
    }

    async fn submit(&self, instructions: &[Instruction]) -> LedgerResult<Signature> {
        let mut state = self.state.write().await;
        state.submissions.push(instructions.to_vec());

        if let Some(err) = state.next_failure.take() {
            return Err(err);
        }

        let mut accounts = state.token_accounts.clone();
        for (i, ix) in instructions.iter().enumerate() {
            let index = i as u8;
            if ix.program_id != self.program_id {
                return Err(LedgerError::transaction(
                    format!("Attempt to load a program that does not exist: {}", ix.program_id),
                    TransactionError::ProgramAccountNotFound,
                ));
            }
            if !state.program_deployed {
                return Err(LedgerError::transaction(
                    "Attempt to load a program that does not exist",
                    TransactionError::InstructionError(index, InstructionError::UnsupportedProgramId),
                ));
            }
            self.apply(&mut accounts, index, ix)?;
        }
        state.token_accounts = accounts;

        let mut sig = [0u8; 64];
        sig[..8].copy_from_slice(&(state.submissions.len() as u64).to_le_bytes());
        sig[8..40].copy_from_slice(self.program_id.as_ref());
        Ok(Signature::from(sig))
    }
}
