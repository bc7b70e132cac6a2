//! Local-key EVM wallet.
//!
//! Signs with an alloy [`PrivateKeySigner`] and sends through one HTTP
//! provider per configured chain. Endpoints flagged `atomic_batch` accept
//! EIP-5792 call bundles; the bundle ids this wallet issues are tracked so
//! confirmation can route them to `wallet_getCallsStatus`.

use crate::{SentTransaction, WalletAdapter, WalletCapabilities, WalletError};
use alloy::dyn_abi::TypedData;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use dashmap::DashMap;
use relay_config::RelayConfig;
use relay_confirm::{ConfirmationError, ConfirmationService, ConfirmationWatcher, PollPolicy};
use relay_types::{BatchCall, BatchReceipt, ChainId, Receipt, SignData, Step, StepItem, VmType};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

sol! {
	interface IERC20 {
		function balanceOf(address account) external view returns (uint256);
	}
}

/// Provider and watcher for one chain.
pub struct EvmChain {
	provider: DynProvider,
	watcher: Arc<dyn ConfirmationWatcher>,
	atomic_batch: bool,
}

impl EvmChain {
	pub fn new(provider: DynProvider, watcher: Arc<dyn ConfirmationWatcher>, atomic_batch: bool) -> Self {
		Self {
			provider,
			watcher,
			atomic_batch,
		}
	}
}

pub struct EvmWallet {
	signer: PrivateKeySigner,
	chains: HashMap<ChainId, EvmChain>,
	current_chain: AtomicU64,
	pending_batches: DashMap<String, ChainId>,
	batch_policy: PollPolicy,
}

impl EvmWallet {
	/// Creates a wallet from a hex-encoded private key, with or without `0x`.
	pub fn new(private_key_hex: &str, default_chain: ChainId, batch_policy: PollPolicy) -> Result<Self, WalletError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| WalletError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self {
			signer,
			chains: HashMap::new(),
			current_chain: AtomicU64::new(default_chain),
			pending_batches: DashMap::new(),
			batch_policy,
		})
	}

	/// Registers a chain with a signing provider built from `rpc_url`.
	/// Transactions on it are confirmed through `watcher`.
	pub fn with_rpc(
		mut self,
		chain_id: ChainId,
		rpc_url: &str,
		watcher: Arc<dyn ConfirmationWatcher>,
		atomic_batch: bool,
	) -> Result<Self, WalletError> {
		let url: url::Url = rpc_url
			.parse()
			.map_err(|e| WalletError::Provider(format!("Invalid RPC URL: {}", e)))?;

		let wallet = EthereumWallet::from(self.signer.clone());
		let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

		self.chains
			.insert(chain_id, EvmChain::new(provider, watcher, atomic_batch));
		Ok(self)
	}

	pub fn with_chain(mut self, chain_id: ChainId, chain: EvmChain) -> Self {
		self.chains.insert(chain_id, chain);
		self
	}

	pub fn signer_address(&self) -> Address {
		self.signer.address()
	}

	fn chain(&self, chain_id: ChainId) -> Result<&EvmChain, WalletError> {
		self.chains
			.get(&chain_id)
			.ok_or(WalletError::UnsupportedChain(chain_id))
	}

	async fn sign_payload(&self, sign: &SignData) -> Result<String, WalletError> {
		let signature = match sign {
			SignData::Eip191 { message } => {
				let bytes = match message.strip_prefix("0x").map(hex::decode) {
					Some(Ok(raw)) => raw,
					_ => message.as_bytes().to_vec(),
				};
				self.signer
					.sign_message(&bytes)
					.await
					.map_err(|e| WalletError::SigningFailed(format!("Failed to sign message: {}", e)))?
			}
			SignData::Eip712 { .. } => {
				let json = sign
					.typed_data_json()
					.ok_or_else(|| WalletError::InvalidPayload("missing typed data".to_string()))?;
				let typed: TypedData = serde_json::from_value(json)
					.map_err(|e| WalletError::InvalidPayload(format!("Invalid typed data: {}", e)))?;
				self.signer
					.sign_dynamic_typed_data(&typed)
					.await
					.map_err(|e| WalletError::SigningFailed(format!("Failed to sign typed data: {}", e)))?
			}
		};

		Ok(format!("0x{}", hex::encode(signature.as_bytes())))
	}

	async fn send_calls(&self, chain_id: ChainId, chain: &EvmChain, calls: &[BatchCall]) -> Result<SentTransaction, WalletError> {
		if !chain.atomic_batch {
			return Err(WalletError::InvalidPayload(format!(
				"Chain {} does not support atomic batches",
				chain_id
			)));
		}

		let calls = calls
			.iter()
			.map(|call| {
				let value = parse_u256(call.value.as_deref())?;
				Ok(json!({
					"to": call.to,
					"data": call.data.clone().unwrap_or_else(|| "0x".to_string()),
					"value": format!("{:#x}", value),
				}))
			})
			.collect::<Result<Vec<_>, WalletError>>()?;
		let call_count = calls.len();

		let params = json!({
			"version": "2.0.0",
			"chainId": format!("{:#x}", chain_id),
			"from": self.signer.address().to_string(),
			"atomicRequired": true,
			"calls": calls,
		});

		let response: Value = chain
			.provider
			.raw_request("wallet_sendCalls".into(), (params,))
			.await
			.map_err(classify_provider_error)?;

		let id = match &response {
			Value::String(id) => id.clone(),
			other => other
				.get("id")
				.and_then(Value::as_str)
				.map(str::to_string)
				.ok_or_else(|| WalletError::Provider(format!("Unexpected wallet_sendCalls response: {}", other)))?,
		};

		info!(chain_id, batch_id = %id, calls = call_count, "Submitted call bundle");
		self.pending_batches.insert(id.clone(), chain_id);
		Ok(SentTransaction::batch(id))
	}

	async fn wait_for_calls(&self, id: &str, chain_id: ChainId) -> Result<Receipt, WalletError> {
		let chain = self.chain(chain_id)?;

		for attempt in 1..=self.batch_policy.max_attempts {
			let status: CallsStatus = chain
				.provider
				.raw_request("wallet_getCallsStatus".into(), (id.to_string(),))
				.await
				.map_err(classify_provider_error)?;

			let code = status.code();
			if code == 200 {
				self.pending_batches.remove(id);
				return Ok(Receipt::Batch(BatchReceipt {
					id: id.to_string(),
					chain_id,
					status: code,
					tx_hashes: status
						.receipts
						.into_iter()
						.filter_map(|r| r.transaction_hash)
						.collect(),
				}));
			}
			if code >= 300 {
				self.pending_batches.remove(id);
				return Err(ConfirmationError::Failed {
					tx_hash: id.to_string(),
					message: format!("Call bundle failed with status {}", code),
					trace: None,
				}
				.into());
			}

			debug!(batch_id = %id, attempt, status = code, "Call bundle pending");
			if attempt < self.batch_policy.max_attempts {
				tokio::time::sleep(self.batch_policy.interval).await;
			}
		}

		Err(ConfirmationError::Timeout {
			tx_hash: id.to_string(),
			attempts: self.batch_policy.max_attempts,
		}
		.into())
	}
}

#[derive(Debug, Deserialize)]
struct CallsStatus {
	status: Value,
	#[serde(default)]
	receipts: Vec<CallReceipt>,
}

impl CallsStatus {
	/// EIP-5792 numeric status; early drafts used strings.
	fn code(&self) -> u64 {
		match &self.status {
			Value::Number(n) => n.as_u64().unwrap_or(0),
			Value::String(s) if s.eq_ignore_ascii_case("CONFIRMED") => 200,
			Value::String(s) if s.eq_ignore_ascii_case("PENDING") => 100,
			_ => 400,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallReceipt {
	#[serde(default)]
	transaction_hash: Option<String>,
}

fn parse_u256(raw: Option<&str>) -> Result<U256, WalletError> {
	match raw {
		None | Some("") => Ok(U256::ZERO),
		Some(v) => U256::from_str(v).map_err(|e| WalletError::InvalidPayload(format!("Invalid amount {}: {}", v, e))),
	}
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, WalletError> {
	parse_u256(Some(raw))?
		.try_into()
		.map_err(|_| WalletError::InvalidPayload(format!("{} out of range: {}", field, raw)))
}

fn parse_u128(field: &str, raw: &str) -> Result<u128, WalletError> {
	parse_u256(Some(raw))?
		.try_into()
		.map_err(|_| WalletError::InvalidPayload(format!("{} out of range: {}", field, raw)))
}

fn classify_provider_error(err: impl std::fmt::Display) -> WalletError {
	let msg = err.to_string();
	let lower = msg.to_lowercase();
	if lower.contains("user rejected") || lower.contains("user denied") || lower.contains("4001") {
		WalletError::Rejected(msg)
	} else {
		WalletError::Provider(msg)
	}
}

#[async_trait]
impl WalletAdapter for EvmWallet {
	fn vm_type(&self) -> VmType {
		VmType::Evm
	}

	async fn address(&self) -> Result<String, WalletError> {
		Ok(self.signer.address().to_string())
	}

	async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(self.current_chain.load(Ordering::SeqCst))
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		self.chain(chain_id)?;
		let previous = self.current_chain.swap(chain_id, Ordering::SeqCst);
		if previous != chain_id {
			info!(from = previous, to = chain_id, "Switched chain");
		}
		Ok(())
	}

	async fn handle_sign_message_step(&self, chain_id: ChainId, item: &StepItem) -> Result<String, WalletError> {
		let sign = item
			.data
			.sign
			.as_ref()
			.ok_or_else(|| WalletError::InvalidPayload("Signature item has no sign data".to_string()))?;
		debug!(chain_id, "Signing message");
		self.sign_payload(sign).await
	}

	async fn handle_send_transaction_step(
		&self,
		chain_id: ChainId,
		item: &StepItem,
		step: &Step,
	) -> Result<SentTransaction, WalletError> {
		let chain = self.chain(chain_id)?;
		let data = &item.data;

		if let Some(calls) = &data.calls {
			return self.send_calls(chain_id, chain, calls).await;
		}

		let to = data
			.to
			.as_deref()
			.ok_or_else(|| WalletError::InvalidPayload("Transaction item has no recipient".to_string()))?
			.parse::<Address>()
			.map_err(|e| WalletError::InvalidPayload(format!("Invalid recipient: {}", e)))?;
		let input = match data.data.as_deref() {
			Some(hex_data) => hex_data
				.parse::<Bytes>()
				.map_err(|e| WalletError::InvalidPayload(format!("Invalid calldata: {}", e)))?,
			None => Bytes::new(),
		};

		let mut request = TransactionRequest::default()
			.with_from(self.signer.address())
			.with_to(to)
			.with_input(input)
			.with_value(parse_u256(data.value.as_deref())?)
			.with_chain_id(chain_id);
		if let Some(gas) = &data.gas {
			request = request.with_gas_limit(parse_u64("gas", gas)?);
		}
		if let Some(fee) = &data.max_fee_per_gas {
			request = request.with_max_fee_per_gas(parse_u128("maxFeePerGas", fee)?);
		}
		if let Some(tip) = &data.max_priority_fee_per_gas {
			request = request.with_max_priority_fee_per_gas(parse_u128("maxPriorityFeePerGas", tip)?);
		}

		let pending = chain
			.provider
			.send_transaction(request)
			.await
			.map_err(classify_provider_error)?;
		let tx_hash = pending.tx_hash().to_string();

		info!(chain_id, step = %step.id, tx_hash = %tx_hash, "Submitted transaction");
		Ok(SentTransaction::hash(tx_hash))
	}

	async fn handle_confirm_transaction_step(&self, tx_hash: &str, chain_id: ChainId) -> Result<Receipt, WalletError> {
		if self.pending_batches.contains_key(tx_hash) {
			return self.wait_for_calls(tx_hash, chain_id).await;
		}

		let chain = self.chain(chain_id)?;
		Ok(chain.watcher.wait_for_confirmation(tx_hash).await?)
	}

	fn capabilities(&self) -> WalletCapabilities {
		WalletCapabilities {
			atomic_batch: self.chains.values().any(|c| c.atomic_batch),
			eoa_detection: true,
			balance: true,
		}
	}

	async fn is_eoa(&self, chain_id: ChainId) -> Result<bool, WalletError> {
		let code = self
			.chain(chain_id)?
			.provider
			.get_code_at(self.signer.address())
			.await
			.map_err(classify_provider_error)?;
		Ok(code.is_empty())
	}

	async fn supports_atomic_batch(&self, chain_id: ChainId) -> Result<bool, WalletError> {
		Ok(self.chains.get(&chain_id).map(|c| c.atomic_batch).unwrap_or(false))
	}

	async fn get_balance(&self, chain_id: ChainId, address: &str, currency: Option<&str>) -> Result<String, WalletError> {
		let chain = self.chain(chain_id)?;
		let owner = address
			.parse::<Address>()
			.map_err(|e| WalletError::InvalidPayload(format!("Invalid address: {}", e)))?;

		let token = match currency {
			Some(c) => Some(
				c.parse::<Address>()
					.map_err(|e| WalletError::InvalidPayload(format!("Invalid currency: {}", e)))?,
			),
			None => None,
		}
		.filter(|t| !t.is_zero());

		let balance = match token {
			None => chain
				.provider
				.get_balance(owner)
				.await
				.map_err(classify_provider_error)?,
			Some(token) => {
				let call = TransactionRequest::default()
					.with_to(token)
					.with_input(IERC20::balanceOfCall { account: owner }.abi_encode());
				let output = chain
					.provider
					.call(call)
					.await
					.map_err(classify_provider_error)?;
				U256::try_from_be_slice(&output)
					.ok_or_else(|| WalletError::Provider("Invalid balanceOf response".to_string()))?
			}
		};

		Ok(balance.to_string())
	}
}

/// Builds the EVM wallet from configuration.
///
/// Every chain whose VM is EVM-like gets a signing provider and the
/// confirmation watcher registered for it. The wallet starts on
/// `wallet.default_chain`, or on the lowest configured chain id.
pub fn create_evm_wallet(config: &RelayConfig) -> Result<EvmWallet, WalletError> {
	let private_key = config
		.wallet
		.private_key
		.as_deref()
		.ok_or_else(|| WalletError::InvalidKey("wallet.private_key is not configured".to_string()))?;

	let mut evm_chains: Vec<ChainId> = config
		.chains
		.keys()
		.copied()
		.filter(|id| matches!(config.vm_type(*id), VmType::Evm | VmType::Hypevm))
		.collect();
	evm_chains.sort_unstable();

	let default_chain = config
		.wallet
		.default_chain
		.or_else(|| evm_chains.first().copied())
		.ok_or_else(|| WalletError::Provider("No EVM chain configured".to_string()))?;

	let confirmations = ConfirmationService::from_config(config)?;
	let mut wallet = EvmWallet::new(private_key, default_chain, PollPolicy::from(&config.confirmation))?;
	for chain_id in evm_chains {
		if let Some(chain) = config.chains.get(&chain_id) {
			let watcher = confirmations
				.watcher(chain_id)
				.ok_or(ConfirmationError::UnsupportedChain(chain_id))?;
			wallet = wallet.with_rpc(chain_id, &chain.rpc_url, watcher, chain.atomic_batch)?;
		}
	}

	Ok(wallet)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::Signature;
	use relay_confirm::EvmConfirmation;
	use relay_types::{ItemData, StepKind};
	use std::time::Duration;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

	// Anvil's first development key.
	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const TX: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

	struct RpcResult(Value);

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

	async fn rpc(server: &MockServer, name: &str, result: Value) {
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": name })))
			.respond_with(RpcResult(result))
			.mount(server)
			.await;
	}

	fn policy() -> PollPolicy {
		PollPolicy::new(Duration::from_millis(5), 3)
	}

	fn watcher(server: &MockServer) -> Arc<dyn ConfirmationWatcher> {
		Arc::new(EvmConfirmation::new(8453, &server.uri(), None, policy()).unwrap())
	}

	fn step(id: &str, item: StepItem) -> Step {
		Step {
			id: id.to_string(),
			kind: StepKind::Transaction,
			action: String::new(),
			description: String::new(),
			request_id: None,
			deposit_address: None,
			items: vec![item],
			error: None,
			error_data: None,
		}
	}

	#[tokio::test]
	async fn test_sign_eip191_recovers_signer() {
		let wallet = EvmWallet::new(KEY, 1, policy()).unwrap();
		let item = StepItem::new(ItemData {
			sign: Some(SignData::Eip191 {
				message: "hello relay".to_string(),
			}),
			..Default::default()
		});

		let signature = wallet.handle_sign_message_step(1, &item).await.unwrap();
		let bytes = hex::decode(signature.trim_start_matches("0x")).unwrap();
		let sig = Signature::from_raw(&bytes).unwrap();
		assert_eq!(
			sig.recover_address_from_msg("hello relay").unwrap(),
			wallet.signer_address()
		);
	}

	#[tokio::test]
	async fn test_sign_eip712_recovers_signer() {
		let wallet = EvmWallet::new(KEY, 1, policy()).unwrap();
		let sign = SignData::Eip712 {
			domain: json!({"name": "Relay", "version": "1", "chainId": 1}),
			types: json!({
				"EIP712Domain": [
					{"name": "name", "type": "string"},
					{"name": "version", "type": "string"},
					{"name": "chainId", "type": "uint256"}
				],
				"Order": [{"name": "amount", "type": "uint256"}]
			}),
			primary_type: "Order".to_string(),
			value: json!({"amount": "1000"}),
		};
		let item = StepItem::new(ItemData {
			sign: Some(sign.clone()),
			..Default::default()
		});

		let signature = wallet.handle_sign_message_step(1, &item).await.unwrap();
		let bytes = hex::decode(signature.trim_start_matches("0x")).unwrap();
		let sig = Signature::from_raw(&bytes).unwrap();

		let typed: TypedData = serde_json::from_value(sign.typed_data_json().unwrap()).unwrap();
		let hash = typed.eip712_signing_hash().unwrap();
		assert_eq!(
			sig.recover_address_from_prehash(&hash).unwrap(),
			wallet.signer_address()
		);
	}

	#[tokio::test]
	async fn test_switch_chain_requires_configured_chain() {
		let server = MockServer::start().await;
		let wallet = EvmWallet::new(KEY, 1, policy())
			.unwrap()
			.with_rpc(8453, &server.uri(), watcher(&server), false)
			.unwrap();

		wallet.switch_chain(8453).await.unwrap();
		assert_eq!(wallet.get_chain_id().await.unwrap(), 8453);

		let err = wallet.switch_chain(10).await.unwrap_err();
		assert!(matches!(err, WalletError::UnsupportedChain(10)));
	}

	#[tokio::test]
	async fn test_send_transaction() {
		let server = MockServer::start().await;
		rpc(&server, "eth_getTransactionCount", json!("0x0")).await;
		rpc(&server, "eth_sendRawTransaction", json!(TX)).await;

		let wallet = EvmWallet::new(KEY, 8453, policy())
			.unwrap()
			.with_rpc(8453, &server.uri(), watcher(&server), false)
			.unwrap();
		let item = StepItem::new(ItemData {
			to: Some("0x2222222222222222222222222222222222222222".to_string()),
			data: Some("0x".to_string()),
			value: Some("1000".to_string()),
			chain_id: Some(8453),
			gas: Some("21000".to_string()),
			max_fee_per_gas: Some("1000000000".to_string()),
			max_priority_fee_per_gas: Some("1000".to_string()),
			..Default::default()
		});

		let sent = wallet
			.handle_send_transaction_step(8453, &item, &step("deposit", item.clone()))
			.await
			.unwrap();
		assert_eq!(sent, SentTransaction::hash(TX));
	}

	#[tokio::test]
	async fn test_batch_requires_atomic_support() {
		let server = MockServer::start().await;
		let wallet = EvmWallet::new(KEY, 8453, policy())
			.unwrap()
			.with_rpc(8453, &server.uri(), watcher(&server), false)
			.unwrap();
		let item = StepItem::new(ItemData {
			calls: Some(vec![BatchCall {
				to: "0x2222222222222222222222222222222222222222".to_string(),
				data: None,
				value: None,
			}]),
			..Default::default()
		});

		assert!(!wallet.supports_atomic_batch(8453).await.unwrap());
		let err = wallet
			.handle_send_transaction_step(8453, &item, &step("approve", item.clone()))
			.await
			.unwrap_err();
		assert!(matches!(err, WalletError::InvalidPayload(_)));
	}

	#[tokio::test]
	async fn test_batch_send_and_confirm() {
		let server = MockServer::start().await;
		rpc(&server, "wallet_sendCalls", json!({"id": "bundle-1"})).await;
		rpc(
			&server,
			"wallet_getCallsStatus",
			json!({"status": 200, "receipts": [{"transactionHash": TX}]}),
		)
		.await;

		let wallet = EvmWallet::new(KEY, 8453, policy())
			.unwrap()
			.with_rpc(8453, &server.uri(), watcher(&server), true)
			.unwrap();
		assert!(wallet.capabilities().atomic_batch);

		let item = StepItem::new(ItemData {
			calls: Some(vec![
				BatchCall {
					to: "0x2222222222222222222222222222222222222222".to_string(),
					data: Some("0x095ea7b3".to_string()),
					value: None,
				},
				BatchCall {
					to: "0x3333333333333333333333333333333333333333".to_string(),
					data: Some("0x".to_string()),
					value: Some("5".to_string()),
				},
			]),
			..Default::default()
		});

		let sent = wallet
			.handle_send_transaction_step(8453, &item, &step("approve", item.clone()))
			.await
			.unwrap();
		assert_eq!(sent, SentTransaction::batch("bundle-1"));

		let receipt = wallet
			.handle_confirm_transaction_step("bundle-1", 8453)
			.await
			.unwrap();
		assert_eq!(receipt.tx_hashes(), vec![TX.to_string()]);
	}

	#[tokio::test]
	async fn test_native_balance() {
		let server = MockServer::start().await;
		rpc(&server, "eth_getBalance", json!("0x64")).await;

		let wallet = EvmWallet::new(KEY, 8453, policy())
			.unwrap()
			.with_rpc(8453, &server.uri(), watcher(&server), false)
			.unwrap();
		let address = wallet.address().await.unwrap();
		let balance = wallet.get_balance(8453, &address, None).await.unwrap();
		assert_eq!(balance, "100");
	}

	#[tokio::test]
	async fn test_create_wallet_registers_evm_chains() {
		let mut config = RelayConfig::with_base_url("https://api.relay.link");
		config.wallet.private_key = Some(KEY.to_string());
		for (chain_id, name, rpc_url) in [
			(8453, "Base", "http://127.0.0.1:8545"),
			(relay_types::SOLANA_CHAIN_ID, "Solana", "http://127.0.0.1:8899"),
		] {
			config.chains.insert(
				chain_id,
				relay_config::ChainConfig {
					name: name.to_string(),
					rpc_url: rpc_url.to_string(),
					trace_url: None,
					vm_type: None,
					atomic_batch: false,
				},
			);
		}

		let wallet = create_evm_wallet(&config).unwrap();
		assert_eq!(wallet.get_chain_id().await.unwrap(), 8453);
		wallet.switch_chain(8453).await.unwrap();
		assert!(matches!(
			wallet.switch_chain(relay_types::SOLANA_CHAIN_ID).await,
			Err(WalletError::UnsupportedChain(_))
		));
	}

	#[test]
	fn test_create_wallet_requires_key() {
		let config = RelayConfig::with_base_url("https://api.relay.link");
		assert!(matches!(
			create_evm_wallet(&config),
			Err(WalletError::InvalidKey(_))
		));
	}
}
