//! EVM receipt polling.
//!
//! Failures are enriched with a `callTracer` trace from `debug_traceTransaction`
//! when the endpoint offers it. Enrichment never changes the outcome: a
//! failed trace lookup is logged at debug and dropped.

use crate::jsonrpc::JsonRpcClient;
use crate::{truncate_hash, ConfirmationError, ConfirmationWatcher, PollPolicy};
use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use relay_types::{ChainId, EvmReceipt, Receipt, VmType};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

pub struct EvmConfirmation {
	chain_id: ChainId,
	provider: DynProvider,
	tracer: JsonRpcClient,
	policy: PollPolicy,
}

impl EvmConfirmation {
	pub fn new(
		chain_id: ChainId,
		rpc_url: &str,
		trace_url: Option<&str>,
		policy: PollPolicy,
	) -> Result<Self, ConfirmationError> {
		let url: url::Url = rpc_url
			.parse()
			.map_err(|e| ConfirmationError::Network(format!("Invalid RPC URL: {}", e)))?;
		let provider = ProviderBuilder::new().connect_http(url).erased();

		Ok(Self::with_provider(
			chain_id,
			provider,
			trace_url.unwrap_or(rpc_url),
			policy,
		))
	}

	pub fn with_provider(chain_id: ChainId, provider: DynProvider, trace_url: &str, policy: PollPolicy) -> Self {
		Self {
			chain_id,
			provider,
			tracer: JsonRpcClient::new(trace_url),
			policy,
		}
	}

	/// Best-effort call trace of a failed transaction.
	async fn trace(&self, tx_hash: &str) -> Option<Value> {
		match self
			.tracer
			.call::<Value>(
				"debug_traceTransaction",
				json!([tx_hash, { "tracer": "callTracer" }]),
			)
			.await
		{
			Ok(trace) => trace,
			Err(e) => {
				debug!(tx_hash = %truncate_hash(tx_hash), error = ?e, "Trace enrichment failed");
				None
			}
		}
	}
}

#[async_trait]
impl ConfirmationWatcher for EvmConfirmation {
	fn vm_type(&self) -> VmType {
		VmType::Evm
	}

	async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<Receipt, ConfirmationError> {
		let hash: B256 = tx_hash
			.parse()
			.map_err(|e| ConfirmationError::InvalidReference(format!("{}: {}", tx_hash, e)))?;

		info!(
			chain_id = self.chain_id,
			tx_hash = %truncate_hash(tx_hash),
			"Waiting for transaction receipt"
		);

		for attempt in 1..=self.policy.max_attempts {
			match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => {
					let converted = Receipt::Evm(EvmReceipt {
						tx_hash: receipt.transaction_hash.to_string(),
						chain_id: self.chain_id,
						block_number: receipt.block_number,
						block_hash: receipt.block_hash.map(|h| h.to_string()),
						gas_used: receipt.gas_used,
						success: receipt.status(),
					});

					if receipt.status() {
						info!(
							tx_hash = %truncate_hash(tx_hash),
							attempts = attempt,
							"Transaction confirmed"
						);
						return Ok(converted);
					}

					warn!(tx_hash = %truncate_hash(tx_hash), "Transaction reverted");
					let trace = self.trace(tx_hash).await;
					return Err(ConfirmationError::Reverted {
						tx_hash: tx_hash.to_string(),
						receipt: Box::new(converted),
						trace,
					});
				}
				Ok(None) => {
					debug!(
						tx_hash = %truncate_hash(tx_hash),
						attempt,
						"Transaction not yet mined"
					);
				}
				Err(e) => {
					warn!(tx_hash = %truncate_hash(tx_hash), error = %e, "Failed to get receipt");
					let trace = self.trace(tx_hash).await;
					return Err(ConfirmationError::Failed {
						tx_hash: tx_hash.to_string(),
						message: format!("Failed to get receipt: {}", e),
						trace,
					});
				}
			}

			if attempt < self.policy.max_attempts {
				tokio::time::sleep(self.policy.interval).await;
			}
		}

		Err(ConfirmationError::Timeout {
			tx_hash: tx_hash.to_string(),
			attempts: self.policy.max_attempts,
		})
	}
}
