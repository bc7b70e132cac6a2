//! Transaction confirmation watchers.
//!
//! Each watcher polls its chain until a submitted transaction is final and
//! returns a VM-specific [`Receipt`], or fails with a [`ConfirmationError`].
//! There is no ambiguous outcome: a watcher that runs out of attempts fails
//! with [`ConfirmationError::Timeout`].
//!
//! Bitcoin and deposit-address flows have no watcher; their completion is
//! observed through the relay status endpoint.

use async_trait::async_trait;
use relay_config::{ConfirmationConfig, RelayConfig};
use relay_types::{ChainId, ExecutionError, Receipt, VmType};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub mod implementations;
pub mod jsonrpc;

pub use implementations::{EvmConfirmation, SuiConfirmation, SvmConfirmation};

#[derive(Debug, Error)]
pub enum ConfirmationError {
	#[error("Network error: {0}")]
	Network(String),

	#[error("Transaction {tx_hash} reverted")]
	Reverted {
		tx_hash: String,
		receipt: Box<Receipt>,
		trace: Option<Value>,
	},

	#[error("Transaction {tx_hash} failed: {message}")]
	Failed {
		tx_hash: String,
		message: String,
		trace: Option<Value>,
	},

	#[error("Transaction {tx_hash} not confirmed after {attempts} attempt(s)")]
	Timeout { tx_hash: String, attempts: u32 },

	#[error("Invalid transaction reference: {0}")]
	InvalidReference(String),

	#[error("No confirmation watcher configured for chain {0}")]
	UnsupportedChain(ChainId),
}

impl From<ConfirmationError> for ExecutionError {
	fn from(err: ConfirmationError) -> Self {
		let message = err.to_string();
		match err {
			ConfirmationError::Reverted { receipt, trace, .. } => {
				ExecutionError::TransactionConfirmation {
					message,
					receipt: Some(receipt),
					trace,
				}
			}
			ConfirmationError::Failed { trace, .. } => ExecutionError::TransactionConfirmation {
				message,
				receipt: None,
				trace,
			},
			ConfirmationError::Timeout { tx_hash, attempts } => {
				ExecutionError::DepositTransactionTimeout { tx_hash, attempts }
			}
			ConfirmationError::Network(msg) => ExecutionError::Network(msg),
			ConfirmationError::InvalidReference(_) => ExecutionError::TransactionConfirmation {
				message,
				receipt: None,
				trace: None,
			},
			ConfirmationError::UnsupportedChain(_) => ExecutionError::Configuration(message),
		}
	}
}

/// Waits for a submitted transaction to become final.
#[async_trait]
pub trait ConfirmationWatcher: Send + Sync {
	fn vm_type(&self) -> VmType;

	async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<Receipt, ConfirmationError>;
}

/// Fixed-interval polling bounded by an attempt count.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
	pub interval: Duration,
	pub max_attempts: u32,
}

impl PollPolicy {
	pub fn new(interval: Duration, max_attempts: u32) -> Self {
		Self {
			interval,
			max_attempts,
		}
	}
}

impl From<&ConfirmationConfig> for PollPolicy {
	fn from(config: &ConfirmationConfig) -> Self {
		Self::new(config.interval(), config.max_attempts)
	}
}

/// Per-chain watchers built from configuration. Wallet adapters take their
/// watchers from here.
#[derive(Clone, Default)]
pub struct ConfirmationService {
	watchers: HashMap<ChainId, Arc<dyn ConfirmationWatcher>>,
}

impl ConfirmationService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a watcher for every configured chain whose VM supports local
	/// confirmation.
	pub fn from_config(config: &RelayConfig) -> Result<Self, ConfirmationError> {
		let policy = PollPolicy::from(&config.confirmation);
		let mut service = Self::new();

		for (chain_id, chain) in &config.chains {
			let vm = config.vm_type(*chain_id);
			let watcher: Arc<dyn ConfirmationWatcher> = match vm {
				VmType::Evm | VmType::Hypevm => Arc::new(EvmConfirmation::new(
					*chain_id,
					&chain.rpc_url,
					chain.trace_url.as_deref(),
					policy,
				)?),
				VmType::Svm => Arc::new(SvmConfirmation::new(&chain.rpc_url, policy)?),
				VmType::Suivm => Arc::new(SuiConfirmation::new(&chain.rpc_url, policy)?),
				VmType::Bvm | VmType::Tvm => continue,
			};
			info!(chain_id, vm = %vm, "Registered confirmation watcher");
			service.watchers.insert(*chain_id, watcher);
		}

		Ok(service)
	}

	pub fn watcher(&self, chain_id: ChainId) -> Option<Arc<dyn ConfirmationWatcher>> {
		self.watchers.get(&chain_id).cloned()
	}
}

/// Utility function to truncate a transaction hash for display.
pub(crate) fn truncate_hash(hash: &str) -> String {
	let mut chars = hash.chars();
	let head: String = chars.by_ref().take(10).collect();
	if chars.next().is_some() {
		format!("{}..", head)
	} else {
		head
	}
}

#[cfg(test)]
pub(crate) mod test_utils {
	use serde_json::{json, Value};
	use wiremock::{Request, Respond, ResponseTemplate};

	/// Answers JSON-RPC requests with a fixed result, echoing the request id.
	pub struct RpcResult(pub Value);

	impl Respond for RpcResult {
		fn respond(&self, request: &Request) -> ResponseTemplate {
			let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
			ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": body.get("id").cloned().unwrap_or(json!(0)),
				"result": self.0,
			}))
		}
	}

	/// Answers JSON-RPC requests with an error object.
	pub struct RpcError(pub i64, pub &'static str);

	impl Respond for RpcError {
		fn respond(&self, request: &Request) -> ResponseTemplate {
			let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
			ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": body.get("id").cloned().unwrap_or(json!(0)),
				"error": { "code": self.0, "message": self.1 },
			}))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timeout_maps_to_deposit_timeout() {
		let err: ExecutionError = ConfirmationError::Timeout {
			tx_hash: "0xabc".into(),
			attempts: 4,
		}
		.into();
		assert!(matches!(
			err,
			ExecutionError::DepositTransactionTimeout { attempts: 4, .. }
		));
	}

	#[test]
	fn test_truncate_hash() {
		assert_eq!(truncate_hash("0x12345678"), "0x12345678");
		assert_eq!(
			truncate_hash("0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060"),
			"0x5c504ed4.."
		);
		assert_eq!(truncate_hash("ラベル-ダイジェスト-001"), "ラベル-ダイジェスト..");
	}

	#[test]
	fn test_service_skips_bitcoin() {
		let mut config = RelayConfig::with_base_url("https://api.relay.link");
		config.chains.insert(
			relay_types::BITCOIN_CHAIN_ID,
			relay_config::ChainConfig {
				name: "Bitcoin".into(),
				rpc_url: "https://bitcoin.example.com".into(),
				trace_url: None,
				vm_type: None,
				atomic_batch: false,
			},
		);
		config.chains.insert(
			8453,
			relay_config::ChainConfig {
				name: "Base".into(),
				rpc_url: "https://mainnet.base.org".into(),
				trace_url: None,
				vm_type: None,
				atomic_batch: false,
			},
		);

		let service = ConfirmationService::from_config(&config).unwrap();
		assert!(service.watcher(relay_types::BITCOIN_CHAIN_ID).is_none());
		assert_eq!(service.watcher(8453).unwrap().vm_type(), VmType::Evm);
	}
}
