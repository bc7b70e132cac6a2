//! Solana-family signature confirmation.

use crate::jsonrpc::JsonRpcClient;
use crate::{truncate_hash, ConfirmationError, ConfirmationWatcher, PollPolicy};
use async_trait::async_trait;
use relay_types::{Receipt, SvmReceipt, VmType};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SignatureStatuses {
	value: Vec<Option<SignatureStatus>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
	slot: u64,
	#[serde(default)]
	err: Option<Value>,
	#[serde(default)]
	confirmation_status: Option<String>,
}

pub struct SvmConfirmation {
	rpc: JsonRpcClient,
	policy: PollPolicy,
}

impl SvmConfirmation {
	pub fn new(rpc_url: &str, policy: PollPolicy) -> Result<Self, ConfirmationError> {
		url::Url::parse(rpc_url)
			.map_err(|e| ConfirmationError::Network(format!("Invalid RPC URL: {}", e)))?;
		Ok(Self {
			rpc: JsonRpcClient::new(rpc_url),
			policy,
		})
	}
}

#[async_trait]
impl ConfirmationWatcher for SvmConfirmation {
	fn vm_type(&self) -> VmType {
		VmType::Svm
	}

	async fn wait_for_confirmation(&self, signature: &str) -> Result<Receipt, ConfirmationError> {
		if signature.is_empty() {
			return Err(ConfirmationError::InvalidReference(
				"empty signature".to_string(),
			));
		}

		for attempt in 1..=self.policy.max_attempts {
			let statuses: Option<SignatureStatuses> = self
				.rpc
				.call(
					"getSignatureStatuses",
					json!([[signature], { "searchTransactionHistory": true }]),
				)
				.await?;

			let status = statuses.and_then(|s| s.value.into_iter().next().flatten());
			if let Some(status) = status {
				if let Some(err) = status.err.filter(|e| !e.is_null()) {
					return Err(ConfirmationError::Failed {
						tx_hash: signature.to_string(),
						message: err.to_string(),
						trace: Some(err),
					});
				}

				match status.confirmation_status.as_deref() {
					Some(commitment @ ("confirmed" | "finalized")) => {
						info!(
							signature = %truncate_hash(signature),
							slot = status.slot,
							commitment,
							"Signature confirmed"
						);
						return Ok(Receipt::Svm(SvmReceipt {
							signature: signature.to_string(),
							slot: status.slot,
							confirmation_status: commitment.to_string(),
						}));
					}
					other => {
						debug!(signature = %truncate_hash(signature), attempt, status = ?other, "Awaiting confirmation");
					}
				}
			}

			if attempt < self.policy.max_attempts {
				tokio::time::sleep(self.policy.interval).await;
			}
		}

		Err(ConfirmationError::Timeout {
			tx_hash: signature.to_string(),
			attempts: self.policy.max_attempts,
		})
	}
}
