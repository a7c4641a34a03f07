//! Batch Runs
//!
//! Provisions every mint of a request file, then runs its transfers, one
//! request at a time. Requests are independent: a failure is recorded and the
//! run moves on. A program that is not deployed marks the request as skipped
//! rather than failed.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;

use super::VaultClient;
use crate::common::error::VaultError;
use crate::common::logging::{EventCategory, LogEvent};
use crate::derive::parse_pubkey;
use crate::ledger::Ledger;
use crate::request::RequestFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    /// Program unavailable on this cluster
    Skipped,
    Failed,
}

/// Outcome of one request in a batch
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    /// "provision" or "transfer"
    pub operation: &'static str,
    pub label: String,
    pub status: OutcomeStatus,
    /// Signature, address or error text
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl RequestOutcome {
    fn succeeded(operation: &'static str, label: String, detail: String) -> Self {
        Self {
            operation,
            label,
            status: OutcomeStatus::Succeeded,
            detail,
            error_code: None,
        }
    }

    fn skipped(operation: &'static str, label: String, detail: String) -> Self {
        Self {
            operation,
            label,
            status: OutcomeStatus::Skipped,
            detail,
            error_code: Some("PROGRAM_UNAVAILABLE"),
        }
    }

    fn from_error(operation: &'static str, label: String, err: &VaultError) -> Self {
        let status = if err.is_skippable() {
            OutcomeStatus::Skipped
        } else {
            OutcomeStatus::Failed
        };
        Self {
            operation,
            label,
            status,
            detail: err.to_string(),
            error_code: Some(err.error_code()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<RequestOutcome>,
}

impl BatchReport {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failed) > 0
    }
}

impl<L: Ledger> VaultClient<L> {
    /// Provision all mints, then run all transfers, sequentially
    pub async fn run_batch(&self, requests: &RequestFile) -> BatchReport {
        let mut report = BatchReport::default();
        // Mints whose provisioning found no program; their transfers are skipped too
        let mut unavailable: HashSet<Pubkey> = HashSet::new();

        for spec in &requests.mints {
            let label = requests.mint_label(&spec.address);
            let result = match parse_pubkey(&spec.address) {
                Ok(mint) => {
                    let result = self.ensure_vault_account(&mint).await;
                    if result.as_ref().is_err_and(|e| e.is_skippable()) {
                        unavailable.insert(mint);
                    }
                    result
                }
                Err(e) => Err(e),
            };

            report.outcomes.push(match result {
                Ok(outcome) => {
                    let verb = if outcome.created { "created" } else { "exists" };
                    RequestOutcome::succeeded(
                        "provision",
                        label,
                        format!("{} {}", verb, outcome.address),
                    )
                }
                Err(e) => RequestOutcome::from_error("provision", label, &e),
            });
        }

        for spec in &requests.transfers {
            let label = format!(
                "{} {} -> {}",
                spec.amount,
                requests.mint_label(&spec.mint),
                spec.recipient
            );
            let req = match requests.resolve_transfer(spec) {
                Ok(req) => req,
                Err(e) => {
                    report.outcomes.push(RequestOutcome::from_error("transfer", label, &e));
                    continue;
                }
            };
            if unavailable.contains(&req.mint) {
                report.outcomes.push(RequestOutcome::skipped(
                    "transfer",
                    label,
                    "vault program unavailable; mint was not provisioned".to_string(),
                ));
                continue;
            }

            let result = self.transfer_request(&req).await;

            report.outcomes.push(match result {
                Ok(receipt) => {
                    RequestOutcome::succeeded("transfer", label, receipt.signature.to_string())
                }
                Err(e) => RequestOutcome::from_error("transfer", label, &e),
            });
        }

        LogEvent::new(tracing::Level::INFO, EventCategory::Batch, "batch complete")
            .with_data(serde_json::json!({
                "succeeded": report.count(OutcomeStatus::Succeeded),
                "skipped": report.count(OutcomeStatus::Skipped),
                "failed": report.count(OutcomeStatus::Failed),
            }))
            .emit();

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use solana_sdk::pubkey::Pubkey;

    fn request_file(mint: &Pubkey, recipient: &str) -> RequestFile {
        RequestFile::from_json(&format!(
            r#"{{
                "mints": [{{ "address": "{mint}", "decimals": 6, "label": "USDT" }}],
                "transfers": [
                    {{ "mint": "{mint}", "recipient": "{recipient}", "amount": "2" }},
                    {{ "mint": "{mint}", "recipient": "{recipient}", "amount": "1.5" }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_the_batch() {
        let program_id = Pubkey::new_unique();
        let client = VaultClient::new(MemoryLedger::new(program_id), program_id);
        let mint = Pubkey::new_unique();

        let mut requests = request_file(&mint, "not-a-pubkey");
        requests.transfers[1].recipient = Pubkey::new_unique().to_string();
        let report = client.run_batch(&requests).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Succeeded);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
        assert_eq!(report.outcomes[1].error_code, Some("INVALID_INPUT"));
        // Vault is empty, so the valid transfer still fails on funds
        assert_eq!(report.outcomes[2].status, OutcomeStatus::Failed);
        assert_eq!(report.outcomes[2].error_code, Some("INSUFFICIENT_FUNDS"));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_undeployed_program_skips() {
        let program_id = Pubkey::new_unique();
        let client = VaultClient::new(MemoryLedger::without_program(program_id), program_id);
        let mint = Pubkey::new_unique();

        let report = client
            .run_batch(&request_file(&mint, &Pubkey::new_unique().to_string()))
            .await;

        // Provisioning and both transfers of that mint
        assert_eq!(report.count(OutcomeStatus::Skipped), 3);
        assert_eq!(report.outcomes[1].error_code, Some("PROGRAM_UNAVAILABLE"));
        assert!(!report.has_failures());
        assert_eq!(client.ledger().submission_count().await, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_payer_is_reported() {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::new(program_id).with_authorized_payer(Pubkey::new_unique());
        let client = VaultClient::new(ledger, program_id);
        let mint = Pubkey::new_unique();
        let (_, vault_ata) = crate::derive::derive_vault_account(&mint, &program_id);

        let requests = request_file(&mint, &Pubkey::new_unique().to_string());
        client.ensure_vault_account(&mint).await.unwrap();
        client.ledger().set_token_balance(vault_ata, 10_000_000).await;
        let report = client.run_batch(&requests).await;

        assert_eq!(report.outcomes[0].status, OutcomeStatus::Succeeded);
        for outcome in &report.outcomes[1..] {
            assert_eq!(outcome.status, OutcomeStatus::Failed);
            assert_eq!(outcome.error_code, Some("UNAUTHORIZED"));
        }
        assert_eq!(client.ledger().token_balance(&vault_ata).await.unwrap(), Some(10_000_000));
    }
}
