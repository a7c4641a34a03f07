//! End-to-end relayer flows against the in-memory vault program.

use solana_sdk::pubkey::Pubkey;
use std::io::Write;

use vault_relayer::derive::derive_vault_account;
use vault_relayer::instruction::VaultInstruction;
use vault_relayer::vault::OutcomeStatus;
use vault_relayer::{
    derive_associated_account, derive_vault_authority, ErrorKind, HumanAmount, Ledger,
    MemoryLedger, RequestFile, VaultClient,
};

fn setup() -> (VaultClient<MemoryLedger>, Pubkey) {
    let program_id = Pubkey::new_unique();
    (VaultClient::new(MemoryLedger::new(program_id), program_id), program_id)
}

fn submitted_amounts(batches: &[Vec<solana_sdk::instruction::Instruction>]) -> Vec<u64> {
    batches
        .iter()
        .flatten()
        .filter_map(|ix| match VaultInstruction::decode(&ix.data) {
            Some(VaultInstruction::TransferTokens { amount }) => Some(amount),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_provision_then_pay_out() {
    let (client, program_id) = setup();
    let mint = Pubkey::new_unique();
    let wallet = Pubkey::new_unique();

    let outcome = client.ensure_vault_account(&mint).await.unwrap();
    assert!(outcome.created);

    let (_, vault_ata) = derive_vault_account(&mint, &program_id);
    assert_eq!(outcome.address, vault_ata);
    client.ledger().set_token_balance(vault_ata, 50_000_000_000).await;

    let first = client
        .transfer(&mint, &wallet, &HumanAmount::from(10), 9)
        .await
        .unwrap();
    assert_eq!(first.amount, 10_000_000_000);
    assert!(!first.signature.to_string().is_empty());

    // No deduplication: an identical second call moves funds again
    let second = client
        .transfer(&mint, &wallet, &HumanAmount::from(10), 9)
        .await
        .unwrap();
    assert_ne!(first.signature, second.signature);

    let submissions = client.ledger().submissions().await;
    assert_eq!(submitted_amounts(&submissions), vec![10_000_000_000, 10_000_000_000]);

    let receiver_ata = derive_associated_account(&wallet, &mint);
    assert_eq!(
        client.ledger().token_balance(&receiver_ata).await.unwrap(),
        Some(20_000_000_000)
    );
    assert_eq!(
        client.ledger().token_balance(&vault_ata).await.unwrap(),
        Some(30_000_000_000)
    );
}

#[tokio::test]
async fn test_derivation_does_not_depend_on_ledger_state() {
    let (client, program_id) = setup();
    let mint = Pubkey::new_unique();

    let authority_before = derive_vault_authority(&mint, &program_id);
    let (_, ata_before) = derive_vault_account(&mint, &program_id);

    client.ensure_vault_account(&mint).await.unwrap();

    assert_eq!(derive_vault_authority(&mint, &program_id), authority_before);
    assert_eq!(derive_vault_account(&mint, &program_id).1, ata_before);
    assert_eq!(derive_associated_account(&authority_before, &mint), ata_before);
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let (client, _) = setup();
    let mint = Pubkey::new_unique();

    let first = client.ensure_vault_account(&mint).await.unwrap();
    let second = client.ensure_vault_account(&mint).await.unwrap();
    let third = client.ensure_vault_account(&mint).await.unwrap();

    assert!(first.created);
    assert!(!second.created && !third.created);
    assert_eq!(first.address, third.address);
    assert!(second.signature.is_none());
    assert_eq!(client.ledger().submission_count().await, 1);
}

#[tokio::test]
async fn test_transfer_before_provision_submits_nothing() {
    let (client, _) = setup();
    let mint = Pubkey::new_unique();

    let err = client
        .transfer(&mint, &Pubkey::new_unique(), &HumanAmount::from(1), 6)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AccountMissing);
    assert_eq!(client.ledger().submission_count().await, 0);
}

#[tokio::test]
async fn test_fractional_amounts_scale_exactly() {
    let (client, program_id) = setup();
    let mint = Pubkey::new_unique();

    client.ensure_vault_account(&mint).await.unwrap();
    let (_, vault_ata) = derive_vault_account(&mint, &program_id);
    client.ledger().set_token_balance(vault_ata, 10_000_000).await;

    let amount: HumanAmount = "2.5".parse().unwrap();
    let receipt = client
        .transfer(&mint, &Pubkey::new_unique(), &amount, 6)
        .await
        .unwrap();

    assert_eq!(receipt.amount, 2_500_000);
}

#[tokio::test]
async fn test_batch_from_file() {
    let (client, program_id) = setup();
    let mint = Pubkey::new_unique();
    let wallet = Pubkey::new_unique();

    let (_, vault_ata) = derive_vault_account(&mint, &program_id);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "mints": [{{ "address": "{mint}", "decimals": 9, "label": "VLT" }}],
            "transfers": [{{ "mint": "{mint}", "recipient": "{wallet}", "amount": "0.5" }}]
        }}"#
    )
    .unwrap();

    let requests = RequestFile::load(file.path()).unwrap();
    let report = client.run_batch(&requests).await;

    // Provisioned fresh, so the vault is empty and the transfer fails on funds
    assert_eq!(report.outcomes[0].status, OutcomeStatus::Succeeded);
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
    assert_eq!(report.outcomes[1].error_code, Some("INSUFFICIENT_FUNDS"));

    client.ledger().set_token_balance(vault_ata, 1_000_000_000).await;
    let report = client.run_batch(&requests).await;

    assert!(!report.has_failures());
    assert!(report.outcomes[0].detail.starts_with("exists"));
    assert_eq!(
        submitted_amounts(&client.ledger().submissions().await).last(),
        Some(&500_000_000)
    );
}

#[tokio::test]
async fn test_request_file_accepts_numeric_amounts() {
    let (client, program_id) = setup();
    let mint = Pubkey::new_unique();
    let wallet = Pubkey::new_unique();

    let requests = RequestFile::from_json(&format!(
        r#"{{
            "mints": [{{ "address": "{mint}", "decimals": 6 }}],
            "transfers": [
                {{ "mint": "{mint}", "recipient": "{wallet}", "amount": 3 }},
                {{ "mint": "{mint}", "recipient": "{wallet}", "amount": 0.25 }}
            ]
        }}"#
    ))
    .unwrap();

    client.ensure_vault_account(&mint).await.unwrap();
    let (_, vault_ata) = derive_vault_account(&mint, &program_id);
    client.ledger().set_token_balance(vault_ata, 5_000_000).await;

    let report = client.run_batch(&requests).await;
    assert!(!report.has_failures());
    assert_eq!(
        submitted_amounts(&client.ledger().submissions().await),
        vec![3_000_000, 250_000]
    );
}

#[tokio::test]
async fn test_unauthorized_payer_is_rejected_without_retry() {
    let program_id = Pubkey::new_unique();
    let authorized = Pubkey::new_unique();
    let ledger = MemoryLedger::new(program_id).with_authorized_payer(authorized);
    let client = VaultClient::new(ledger, program_id);
    let mint = Pubkey::new_unique();

    assert_eq!(client.payer_is_authorized(Some(&authorized)), Some(false));
    assert_eq!(client.payer_is_authorized(None), None);

    client.ensure_vault_account(&mint).await.unwrap();
    let (_, vault_ata) = derive_vault_account(&mint, &program_id);
    client.ledger().set_token_balance(vault_ata, 1_000).await;

    let err = client
        .transfer(&mint, &Pubkey::new_unique(), &HumanAmount::from(1), 2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.error_code(), "UNAUTHORIZED");
    assert!(!err.is_retryable());
    assert!(!err.is_skippable());

    // Same vault, signed by the accepted payer
    let client = VaultClient::new(client.ledger().clone().with_payer(authorized), program_id);
    assert_eq!(client.payer_is_authorized(Some(&authorized)), Some(true));
    let receipt = client
        .transfer(&mint, &Pubkey::new_unique(), &HumanAmount::from(1), 2)
        .await
        .unwrap();
    assert_eq!(receipt.amount, 100);
}
