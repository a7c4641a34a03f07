//! Failure Classification
//!
//! Maps raw ledger failures onto the small taxonomy callers act on.
//! Structured runtime codes are checked first; message and program log text
//! is only consulted when no code settles it (custom codes are per-program,
//! and preflight failures from some RPC providers arrive without structure).

use serde::Serialize;
use solana_sdk::{instruction::InstructionError, transaction::TransactionError};

use crate::ledger::LedgerError;

/// Anchor: 8 byte instruction discriminator not provided
pub const ANCHOR_INSTRUCTION_MISSING: u32 = 100;
/// Anchor: no instruction matches the discriminator
pub const ANCHOR_INSTRUCTION_FALLBACK_NOT_FOUND: u32 = 101;
/// Anchor: the program expected this account to be already initialized
pub const ANCHOR_ACCOUNT_NOT_INITIALIZED: u32 = 3012;
/// Anchor account constraint range (`ConstraintSeeds`, `ConstraintHasOne`, ...)
pub const ANCHOR_CONSTRAINT_CODES: std::ops::RangeInclusive<u32> = 2000..=2999;
/// Vault program: `InvalidAmount`
pub const VAULT_INVALID_AMOUNT: u32 = 6000;
/// Vault program: `InsufficientBalance`
pub const VAULT_INSUFFICIENT_BALANCE: u32 = 6001;
/// Vault program: `TokenMintMismatch`
pub const VAULT_TOKEN_MINT_MISMATCH: u32 = 6002;
/// Vault program: `InvalidVaultAuthority`
pub const VAULT_INVALID_AUTHORITY: u32 = 6003;
/// Vault program: `Unauthorized`, the payer is not the one the program accepts
pub const VAULT_UNAUTHORIZED: u32 = 6004;
/// SPL Token: `TokenError::InsufficientFunds`
pub const TOKEN_INSUFFICIENT_FUNDS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required account does not exist
    AccountMissing,
    /// Account creation lost a race with another creator
    AlreadyExists,
    InsufficientFunds,
    /// Program not deployed or instruction not recognised
    ProgramUnavailable,
    /// Payer is not the authorized submitter
    Unauthorized,
    /// The program refused the instruction for a fixed reason (bad amount,
    /// account constraint); resubmitting the same request cannot succeed
    Rejected,
    Unknown,
}

/// Classify a ledger failure
pub fn classify(err: &LedgerError) -> FailureKind {
    if let Some(kind) = err.transaction_error.as_ref().and_then(classify_transaction_error) {
        return kind;
    }
    classify_text(err)
}

fn classify_transaction_error(err: &TransactionError) -> Option<FailureKind> {
    match err {
        // AccountNotFound: the fee payer has never been funded
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. }
        | TransactionError::AccountNotFound => Some(FailureKind::InsufficientFunds),
        TransactionError::ProgramAccountNotFound | TransactionError::InvalidProgramForExecution => {
            Some(FailureKind::ProgramUnavailable)
        }
        TransactionError::InstructionError(_, ix_err) => classify_instruction_error(ix_err),
        _ => None,
    }
}

fn classify_instruction_error(err: &InstructionError) -> Option<FailureKind> {
    match err {
        InstructionError::InsufficientFunds => Some(FailureKind::InsufficientFunds),
        InstructionError::AccountAlreadyInitialized => Some(FailureKind::AlreadyExists),
        InstructionError::UninitializedAccount | InstructionError::MissingAccount => {
            Some(FailureKind::AccountMissing)
        }
        InstructionError::UnsupportedProgramId | InstructionError::IncorrectProgramId => {
            Some(FailureKind::ProgramUnavailable)
        }
        InstructionError::Custom(code) => match *code {
            ANCHOR_INSTRUCTION_MISSING | ANCHOR_INSTRUCTION_FALLBACK_NOT_FOUND => {
                Some(FailureKind::ProgramUnavailable)
            }
            ANCHOR_ACCOUNT_NOT_INITIALIZED => Some(FailureKind::AccountMissing),
            VAULT_INSUFFICIENT_BALANCE | TOKEN_INSUFFICIENT_FUNDS => {
                Some(FailureKind::InsufficientFunds)
            }
            VAULT_UNAUTHORIZED => Some(FailureKind::Unauthorized),
            VAULT_INVALID_AMOUNT | VAULT_TOKEN_MINT_MISMATCH | VAULT_INVALID_AUTHORITY => {
                Some(FailureKind::Rejected)
            }
            c if ANCHOR_CONSTRAINT_CODES.contains(&c) => Some(FailureKind::Rejected),
            // 0 is "already in use" for the system program but means other
            // things elsewhere; the logs decide
            _ => None,
        },
        _ => None,
    }
}

fn classify_text(err: &LedgerError) -> FailureKind {
    let mut text = err.message.to_lowercase();
    for log in &err.logs {
        text.push('\n');
        text.push_str(&log.to_lowercase());
    }

    const PROGRAM_UNAVAILABLE: &[&str] = &[
        "instructionfallbacknotfound",
        "program that does not exist",
        "program account not found",
        "unsupported program id",
        "program is not deployed",
    ];
    const UNAUTHORIZED: &[&str] = &["error code: unauthorized", "payer must be the authorized"];
    const REJECTED: &[&str] = &["error code: constraint", "error code: invalidamount"];
    const ALREADY_EXISTS: &[&str] = &["already in use", "already exists", "already initialized"];
    const INSUFFICIENT_FUNDS: &[&str] = &["insufficient", "no record of a prior credit"];
    const ACCOUNT_MISSING: &[&str] = &[
        "accountnotinitialized",
        "account not found",
        "accountnotfound",
        "could not find account",
        "does not exist",
    ];

    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has(PROGRAM_UNAVAILABLE) {
        FailureKind::ProgramUnavailable
    } else if has(UNAUTHORIZED) {
        FailureKind::Unauthorized
    } else if has(REJECTED) {
        FailureKind::Rejected
    } else if has(ALREADY_EXISTS) {
        FailureKind::AlreadyExists
    } else if has(INSUFFICIENT_FUNDS) {
        FailureKind::InsufficientFunds
    } else if has(ACCOUNT_MISSING) {
        FailureKind::AccountMissing
    } else {
        FailureKind::Unknown
    }
}

/// Whether resubmitting might succeed: transport failures that never reached
/// the runtime, or runtime errors tied to the moment of submission
pub fn is_transient(err: &LedgerError) -> bool {
    match &err.transaction_error {
        None => classify_text(err) == FailureKind::Unknown,
        Some(tx_err) => matches!(
            tx_err,
            TransactionError::BlockhashNotFound
                | TransactionError::AccountInUse
                | TransactionError::ClusterMaintenance
                | TransactionError::WouldExceedMaxBlockCostLimit
                | TransactionError::WouldExceedMaxAccountCostLimit
                | TransactionError::WouldExceedMaxVoteCostLimit
                | TransactionError::WouldExceedAccountDataBlockLimit
                | TransactionError::WouldExceedAccountDataTotalLimit
                | TransactionError::TooManyAccountLocks
        ),
    }
}
