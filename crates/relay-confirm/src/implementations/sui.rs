//! Sui transaction effects polling.

use crate::jsonrpc::{JsonRpcClient, RpcFailure};
use crate::{truncate_hash, ConfirmationError, ConfirmationWatcher, PollPolicy};
use async_trait::async_trait;
use relay_types::{Receipt, SuiReceipt, VmType};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TransactionBlock {
	digest: String,
	#[serde(default)]
	checkpoint: Option<String>,
	#[serde(default)]
	effects: Option<Effects>,
}

#[derive(Debug, Deserialize)]
struct Effects {
	status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
struct ExecutionStatus {
	status: String,
	#[serde(default)]
	error: Option<String>,
}

pub struct SuiConfirmation {
	rpc: JsonRpcClient,
	policy: PollPolicy,
}

impl SuiConfirmation {
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
impl ConfirmationWatcher for SuiConfirmation {
	fn vm_type(&self) -> VmType {
		VmType::Suivm
	}

	async fn wait_for_confirmation(&self, digest: &str) -> Result<Receipt, ConfirmationError> {
		for attempt in 1..=self.policy.max_attempts {
			let result = self
				.rpc
				.call::<TransactionBlock>(
					"sui_getTransactionBlock",
					json!([digest, { "showEffects": true }]),
				)
				.await;

			match result {
				Ok(Some(block)) => {
					if let Some(effects) = block.effects {
						if effects.status.status == "failure" {
							return Err(ConfirmationError::Failed {
								tx_hash: digest.to_string(),
								message: effects
									.status
									.error
									.unwrap_or_else(|| "execution failed".to_string()),
								trace: None,
							});
						}
						info!(digest = %truncate_hash(digest), "Sui transaction confirmed");
						return Ok(Receipt::Sui(SuiReceipt {
							digest: block.digest,
							checkpoint: block.checkpoint,
							status: effects.status.status,
						}));
					}
				}
				Ok(None) => {}
				// The node answers with an error until the digest is indexed.
				Err(RpcFailure::Node(e)) => {
					debug!(digest = %truncate_hash(digest), attempt, code = e.code, "Transaction not yet indexed");
				}
				Err(err @ RpcFailure::Transport(_)) => return Err(err.into()),
			}

			if attempt < self.policy.max_attempts {
				tokio::time::sleep(self.policy.interval).await;
			}
		}

		Err(ConfirmationError::Timeout {
			tx_hash: digest.to_string(),
			attempts: self.policy.max_attempts,
		})
	}
}
