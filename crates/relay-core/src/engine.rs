//! Step execution engine.
//!
//! Drives one quote through a wallet: items are signed or sent strictly in
//! order, confirmed locally when the wallet can, and otherwise confirmed
//! through the relay status endpoints. The caller's quote is never touched;
//! the engine works on its own copy and publishes a [`ProgressSnapshot`]
//! after every transition.

use crate::batch::{batch_chain_id, prepare_batch};
use crate::hyperliquid::HyperliquidRelay;
use relay_config::{PollingConfig, RelayConfig, RetryConfig};
use relay_status::{retry_transient, RelayApiClient, StatusPoller, StatusSocket};
use relay_types::{
	validate_quote, ChainId, ExecutionError, ItemPhase, ProgressSnapshot, Quote, Receipt, RequestStatus,
	StatusResponse, StepKind, TxHashEntry,
};
use relay_wallet::{SentTransaction, WalletAdapter};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Receives a snapshot after every state transition.
pub type ProgressCallback = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ExecuteOptions {
	/// Execute quotes whose route was split across several solvers.
	pub accept_split_route: bool,
	pub on_progress: Option<ProgressCallback>,
	/// Stops the execution between wallet and network calls.
	pub cancel: CancellationToken,
}

impl ExecuteOptions {
	pub fn with_progress(mut self, callback: impl Fn(ProgressSnapshot) + Send + Sync + 'static) -> Self {
		self.on_progress = Some(Arc::new(callback));
		self
	}

	pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn accept_split_route(mut self, accept: bool) -> Self {
		self.accept_split_route = accept;
		self
	}
}

pub struct StepEngine {
	api: RelayApiClient,
	poller: StatusPoller,
	hyperliquid: HyperliquidRelay,
	polling: PollingConfig,
	retry: RetryConfig,
}

impl StepEngine {
	pub fn new(config: &RelayConfig, api: RelayApiClient) -> Self {
		let mut poller = StatusPoller::new(api.clone(), &config.polling);
		if let Some(socket) = StatusSocket::from_config(&config.api) {
			poller = poller.with_socket(Arc::new(socket));
		}

		Self {
			api,
			poller,
			hyperliquid: HyperliquidRelay::new(&config.hyperliquid),
			polling: config.polling.clone(),
			retry: config.retry.clone(),
		}
	}

	/// Executes `quote` with `wallet` and resolves with the final snapshot.
	///
	/// On failure the error is attached to the failing item and step, a last
	/// snapshot carrying the error is published, and the error is returned.
	#[instrument(skip_all, fields(steps = quote.steps.len()))]
	pub async fn execute(
		&self,
		quote: &Quote,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		let mut execution = Execution {
			engine: self,
			wallet,
			options,
			quote: quote.clone(),
			batch: None,
		};
		execution.run().await
	}
}

/// Positions of a merged approve/deposit pair.
struct BatchGroup {
	leader: (usize, usize),
	absorbed: Vec<(usize, usize)>,
}

struct Execution<'a> {
	engine: &'a StepEngine,
	wallet: &'a dyn WalletAdapter,
	options: &'a ExecuteOptions,
	quote: Quote,
	batch: Option<BatchGroup>,
}

fn publish(quote: &Quote, options: &ExecuteOptions, error: Option<String>) {
	if options.cancel.is_cancelled() {
		return;
	}
	if let Some(callback) = &options.on_progress {
		callback(ProgressSnapshot::from_quote(quote, error));
	}
}

impl<'a> Execution<'a> {
	fn emit(&self) {
		publish(&self.quote, self.options, None);
	}

	fn ensure_active(&self) -> Result<(), ExecutionError> {
		if self.options.cancel.is_cancelled() {
			Err(ExecutionError::Cancelled)
		} else {
			Ok(())
		}
	}

	async fn run(&mut self) -> Result<ProgressSnapshot, ExecutionError> {
		validate_quote(&self.quote)?;
		if self.quote.is_split_route() && !self.options.accept_split_route {
			return Err(ExecutionError::ConfirmationRequired(
				"Quote routes through multiple solvers and must be accepted explicitly".to_string(),
			));
		}
		self.ensure_active()?;

		self.apply_batch().await?;
		self.emit();

		while let Some(step_index) = self.quote.first_incomplete_step() {
			if self.quote.refunded {
				info!("Request refunded, skipping remaining steps");
				break;
			}
			self.ensure_active()?;
			self.run_step(step_index).await?;
		}

		let snapshot = ProgressSnapshot::from_quote(&self.quote, None);
		self.emit();
		info!(
			tx_hashes = snapshot.tx_hashes.len(),
			refunded = snapshot.refunded,
			"Execution finished"
		);
		Ok(snapshot)
	}

	/// Merges the first two incomplete steps into one wallet prompt when they
	/// qualify and the wallet supports atomic batches on their chain.
	async fn apply_batch(&mut self) -> Result<(), ExecutionError> {
		let Some(first) = self.quote.first_incomplete_step() else {
			return Ok(());
		};
		let second = first + 1;
		let Some(next) = self.quote.steps.get(second) else {
			return Ok(());
		};
		let current = &self.quote.steps[first];
		let Some(merged) = prepare_batch(current, next) else {
			return Ok(());
		};
		let Some(chain_id) = batch_chain_id(current, next) else {
			return Ok(());
		};

		if !self.wallet.capabilities().atomic_batch {
			return Ok(());
		}
		self.ensure_active()?;
		match self.wallet.supports_atomic_batch(chain_id).await {
			Ok(true) => {}
			Ok(false) => return Ok(()),
			Err(e) => {
				debug!(chain_id, error = %e, "Atomic batch capability check failed");
				return Ok(());
			}
		}

		let split = self.quote.steps[first].items.len();
		let leader = merged.items.iter().position(|item| item.data.calls.is_some());
		let mut absorbed = Vec::new();
		for (index, item) in merged.items.into_iter().enumerate() {
			let position = if index < split {
				(first, index)
			} else {
				(second, index - split)
			};
			let target = &mut self.quote.steps[position.0].items[position.1];
			if !target.is_complete() && item.is_complete() {
				absorbed.push(position);
			}
			*target = item;
		}
		if self.quote.steps[first].request_id.is_none() {
			self.quote.steps[first].request_id = merged.request_id;
		}

		if let Some(index) = leader {
			info!(chain_id, calls = absorbed.len() + 1, "Batching approval with {}", self.quote.steps[second].id);
			self.batch = Some(BatchGroup {
				leader: (first, index),
				absorbed,
			});
		}
		Ok(())
	}

	async fn run_step(&mut self, step_index: usize) -> Result<(), ExecutionError> {
		debug!(step = %self.quote.steps[step_index].id, "Running step");

		while let Some(item_index) = self.quote.steps[step_index].first_incomplete_item() {
			self.ensure_active()?;
			if let Err(e) = self.run_item(step_index, item_index).await {
				self.fail(step_index, item_index, &e);
				return Err(e);
			}
			self.share_batch_hashes(step_index, item_index);
			if self.quote.refunded {
				break;
			}
		}
		Ok(())
	}

	async fn run_item(&mut self, s: usize, i: usize) -> Result<(), ExecutionError> {
		if self.quote.steps[s].items[i].data.action.is_some() {
			return self.run_hyperliquid(s, i).await;
		}
		match self.quote.steps[s].kind {
			StepKind::Signature => self.run_signature(s, i).await,
			StepKind::Transaction => self.run_transaction(s, i).await,
		}
	}

	fn transition(&mut self, s: usize, i: usize, next: ItemPhase) -> Result<(), ExecutionError> {
		let kind = self.quote.steps[s].kind;
		self.quote.steps[s].items[i].transition(kind, next)?;
		self.emit();
		Ok(())
	}

	async fn signing_chain(&self, s: usize, i: usize) -> Result<ChainId, ExecutionError> {
		if let Some(chain_id) = self.quote.steps[s].items[i].data.chain_id {
			return Ok(chain_id);
		}
		self.ensure_active()?;
		Ok(self.wallet.get_chain_id().await?)
	}

	async fn run_signature(&mut self, s: usize, i: usize) -> Result<(), ExecutionError> {
		let chain_id = self.signing_chain(s, i).await?;
		self.transition(s, i, ItemPhase::Signing)?;

		self.ensure_active()?;
		let item = self.quote.steps[s].items[i].clone();
		let signature = self
			.wallet
			.handle_sign_message_step(chain_id, &item)
			.await?;
		debug!(step = %self.quote.steps[s].id, "Signed message");
		self.transition(s, i, ItemPhase::Submitted)?;

		if let Some(post) = &item.data.post {
			let api = &self.engine.api;
			let signature = signature.as_str();
			self.with_retry(|| async move {
				api.post_signature(post, signature)
					.await
					.map_err(ExecutionError::from)
			})
			.await?;
			debug!(endpoint = %post.endpoint, "Posted signature");
		}

		if item.check.is_some() {
			self.transition(s, i, ItemPhase::Confirming)?;
			self.wait_for_remote(s, i, chain_id, false).await
		} else {
			self.transition(s, i, ItemPhase::Complete)
		}
	}

	async fn run_hyperliquid(&mut self, s: usize, i: usize) -> Result<(), ExecutionError> {
		self.ensure_active()?;
		let chain_id = self.wallet.get_chain_id().await?;
		let Some(action) = self.quote.steps[s].items[i].data.action.clone() else {
			return Ok(());
		};
		let nonce = chrono::Utc::now().timestamp_millis() as u64;
		let request = self
			.engine
			.hyperliquid
			.sign_request(&action, chain_id, nonce)?;

		self.quote.steps[s].items[i].data.sign = Some(request.sign.clone());
		self.transition(s, i, ItemPhase::Signing)?;

		self.ensure_active()?;
		let item = self.quote.steps[s].items[i].clone();
		let signature = self
			.wallet
			.handle_sign_message_step(chain_id, &item)
			.await?;
		self.transition(s, i, ItemPhase::Submitted)?;

		// submitted once: an error response does not mean the action was rejected
		self.ensure_active()?;
		self.engine.hyperliquid.submit(&request, &signature).await?;

		if item.check.is_some() || self.quote.steps[s].request_id.is_some() {
			self.transition(s, i, ItemPhase::Confirming)?;
			self.wait_for_remote(s, i, chain_id, false).await
		} else {
			self.transition(s, i, ItemPhase::Complete)
		}
	}

	async fn run_transaction(&mut self, s: usize, i: usize) -> Result<(), ExecutionError> {
		let chain_id = self.quote.steps[s].items[i]
			.data
			.chain_id
			.ok_or_else(|| ExecutionError::Validation("Transaction item is missing a chain id".to_string()))?;

		self.ensure_active()?;
		let current = self.wallet.get_chain_id().await?;
		if current != chain_id {
			self.ensure_active()?;
			info!(from = current, to = chain_id, "Switching chain");
			self.wallet.switch_chain(chain_id).await?;
		}

		self.transition(s, i, ItemPhase::Sending)?;
		self.ensure_active()?;
		let step = self.quote.steps[s].clone();
		let sent = self
			.wallet
			.handle_send_transaction_step(chain_id, &step.items[i], &step)
			.await?;
		info!(step = %step.id, chain_id, id = %sent.id, batch = sent.is_batch, "Transaction submitted");

		let entry = if sent.is_batch {
			TxHashEntry::batch(sent.id.clone(), chain_id)
		} else {
			TxHashEntry::new(sent.id.clone(), chain_id)
		};
		self.quote.steps[s].items[i].record_tx_hash(entry);
		self.transition(s, i, ItemPhase::Submitted)?;

		self.confirm_transaction(s, i, chain_id, &sent).await
	}

	async fn confirm_transaction(
		&mut self,
		s: usize,
		i: usize,
		chain_id: ChainId,
		sent: &SentTransaction,
	) -> Result<(), ExecutionError> {
		self.transition(s, i, ItemPhase::Confirming)?;

		self.ensure_active()?;
		let receipt = match self
			.wallet
			.handle_confirm_transaction_step(&sent.id, chain_id)
			.await
		{
			Ok(receipt) => Some(receipt),
			Err(e) if e.is_not_implemented() => {
				debug!(id = %sent.id, "Wallet cannot confirm, using relay status");
				None
			}
			Err(e) => return Err(e.into()),
		};

		if let Some(Receipt::Batch(batch)) = &receipt {
			for hash in &batch.tx_hashes {
				self.quote.steps[s].items[i].record_tx_hash(TxHashEntry::new(hash.clone(), chain_id));
			}
		}

		let step = &self.quote.steps[s];
		let needs_remote = receipt.is_none()
			|| step.items[i].check.is_some()
			|| step.deposit_address.is_some();
		if needs_remote {
			self.wait_for_remote(s, i, chain_id, receipt.is_some()).await
		} else {
			self.transition(s, i, ItemPhase::Complete)
		}
	}

	/// Polls the item's check endpoint, or the status endpoint keyed by the
	/// step's request id, until the relay reports a terminal status.
	async fn wait_for_remote(
		&mut self,
		s: usize,
		i: usize,
		origin_chain_id: ChainId,
		confirmed_locally: bool,
	) -> Result<(), ExecutionError> {
		let request_id = self.quote.steps[s].request_id.clone();
		let check = self.quote.steps[s].items[i].check.clone();

		if check.is_none() && request_id.is_none() {
			if confirmed_locally {
				return self.transition(s, i, ItemPhase::Complete);
			}
			return Err(ExecutionError::Validation(format!(
				"Step '{}' cannot be confirmed: no check endpoint or request id",
				self.quote.steps[s].id
			)));
		}
		self.ensure_active()?;

		let engine = self.engine;
		let options = self.options;
		let delayed_after = engine.polling.delayed_after;
		let quote = &mut self.quote;
		let on_attempt = |attempt: u32, _: Option<&StatusResponse>| {
			if delayed_after > 0 && attempt == delayed_after {
				warn!(attempt, "Request is taking longer than expected");
				quote.steps[s].items[i].mark_delayed();
				publish(quote, options, None);
			}
		};
		let poll = async {
			match &check {
				Some(check) => {
					engine
						.poller
						.wait_for_check(request_id.as_deref(), check, on_attempt)
						.await
				}
				None => {
					let id = request_id.as_deref().unwrap_or_default();
					engine.poller.wait_for_status(id, on_attempt).await
				}
			}
		};
		let status = tokio::select! {
			status = poll => status.map_err(ExecutionError::from)?,
			_ = options.cancel.cancelled() => return Err(ExecutionError::Cancelled),
		};

		self.apply_status(s, i, origin_chain_id, request_id, status)
	}

	fn apply_status(
		&mut self,
		s: usize,
		i: usize,
		origin_chain_id: ChainId,
		request_id: Option<String>,
		status: StatusResponse,
	) -> Result<(), ExecutionError> {
		match status.status {
			RequestStatus::Success => {
				let destination = status
					.destination_chain_id
					.or_else(|| {
						self.quote
							.details
							.as_ref()
							.and_then(|d| d.currency_out.as_ref())
							.and_then(|c| c.currency.as_ref())
							.map(|c| c.chain_id)
					})
					.unwrap_or(origin_chain_id);
				let origin = status.origin_chain_id.unwrap_or(origin_chain_id);

				let item = &mut self.quote.steps[s].items[i];
				for hash in &status.tx_hashes {
					item.record_tx_hash(TxHashEntry::new(hash.clone(), destination));
				}
				for hash in &status.in_tx_hashes {
					item.record_internal_tx_hash(TxHashEntry::new(hash.clone(), origin));
				}
				info!(request_id = ?request_id, "Request filled");
				self.transition(s, i, ItemPhase::Complete)
			}
			RequestStatus::Refund => {
				warn!(request_id = ?request_id, "Request refunded");
				self.quote.refunded = true;
				self.transition(s, i, ItemPhase::Refunded)
			}
			RequestStatus::Failure => Err(ExecutionError::RequestFailed {
				request_id,
				details: status.details,
			}),
			other => Err(ExecutionError::RequestFailed {
				request_id,
				details: Some(format!("unexpected status {}", other)),
			}),
		}
	}

	/// Copies the leader's identifiers onto the items its bundle covered.
	fn share_batch_hashes(&mut self, s: usize, i: usize) {
		let Some(batch) = &self.batch else {
			return;
		};
		if batch.leader != (s, i) {
			return;
		}
		let hashes = self.quote.steps[s].items[i].tx_hashes.clone();
		for &(bs, bi) in &batch.absorbed {
			let item = &mut self.quote.steps[bs].items[bi];
			for entry in hashes.iter().rev() {
				item.record_tx_hash(entry.clone());
			}
		}
		self.emit();
	}

	fn fail(&mut self, s: usize, i: usize, error: &ExecutionError) {
		warn!(step = %self.quote.steps[s].id, error = %error, "Step failed");

		let kind = self.quote.steps[s].kind;
		let message = error.to_string();
		let data = error.error_data();

		let step = &mut self.quote.steps[s];
		step.error = Some(message.clone());
		step.error_data = Some(data.clone());
		let item = &mut step.items[i];
		item.error = Some(message.clone());
		item.error_data = Some(data);
		if item.current_phase().can_transition_to(ItemPhase::Error) {
			item.transition(kind, ItemPhase::Error).ok();
		}

		if !matches!(error, ExecutionError::Cancelled) {
			publish(&self.quote, self.options, Some(message));
		}
	}

	async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, ExecutionError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, ExecutionError>>,
	{
		self.ensure_active()?;
		retry_transient(self.engine.retry.max_attempts, self.engine.retry.interval(), op).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use relay_config::PollingConfig;
	use relay_types::{BatchReceipt, EvmReceipt, ProgressState, Quote, Step, StepItem, VmType};
	use relay_wallet::{WalletCapabilities, WalletError};
	use serde_json::{json, Value};
	use std::sync::Mutex;
	use wiremock::matchers::{body_partial_json, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const SIGNATURE: &str = "0x1111111111111111111111111111111111111111111111111111111111111111222222222222222222222222222222222222222222222222222222222222222201";

	struct FakeWallet {
		chain: Mutex<ChainId>,
		atomic_batch: bool,
		confirms: bool,
		log: Mutex<Vec<String>>,
	}

	impl FakeWallet {
		fn on(chain: ChainId) -> Self {
			Self {
				chain: Mutex::new(chain),
				atomic_batch: false,
				confirms: true,
				log: Mutex::new(Vec::new()),
			}
		}

		fn with_atomic_batch(mut self) -> Self {
			self.atomic_batch = true;
			self
		}

		fn without_confirmation(mut self) -> Self {
			self.confirms = false;
			self
		}

		fn log(&self) -> Vec<String> {
			self.log.lock().unwrap().clone()
		}

		fn record(&self, entry: String) {
			self.log.lock().unwrap().push(entry);
		}
	}

	#[async_trait]
	impl WalletAdapter for FakeWallet {
		fn vm_type(&self) -> VmType {
			VmType::Evm
		}

		async fn address(&self) -> Result<String, WalletError> {
			Ok("0x00000000000000000000000000000000000000aa".to_string())
		}

		async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
			Ok(*self.chain.lock().unwrap())
		}

		async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
			self.record(format!("switch:{}", chain_id));
			*self.chain.lock().unwrap() = chain_id;
			Ok(())
		}

		async fn handle_sign_message_step(&self, chain_id: ChainId, _item: &StepItem) -> Result<String, WalletError> {
			self.record(format!("sign:{}", chain_id));
			Ok(SIGNATURE.to_string())
		}

		async fn handle_send_transaction_step(
			&self,
			_chain_id: ChainId,
			item: &StepItem,
			step: &Step,
		) -> Result<SentTransaction, WalletError> {
			if let Some(calls) = &item.data.calls {
				self.record(format!("send_calls:{}", calls.len()));
				return Ok(SentTransaction::batch("batch-1"));
			}
			self.record(format!("send:{}", step.id));
			Ok(SentTransaction::hash(format!("0xhash-{}", step.id)))
		}

		async fn handle_confirm_transaction_step(&self, tx_hash: &str, chain_id: ChainId) -> Result<Receipt, WalletError> {
			if !self.confirms {
				return Err(WalletError::NotImplemented);
			}
			if tx_hash.starts_with("batch") {
				return Ok(Receipt::Batch(BatchReceipt {
					id: tx_hash.to_string(),
					chain_id,
					status: 200,
					tx_hashes: vec!["0xbatched".to_string()],
				}));
			}
			Ok(Receipt::Evm(EvmReceipt {
				tx_hash: tx_hash.to_string(),
				chain_id,
				block_number: Some(1),
				block_hash: None,
				gas_used: 21_000,
				success: true,
			}))
		}

		fn capabilities(&self) -> WalletCapabilities {
			WalletCapabilities {
				atomic_batch: self.atomic_batch,
				..Default::default()
			}
		}

		async fn supports_atomic_batch(&self, _chain_id: ChainId) -> Result<bool, WalletError> {
			Ok(self.atomic_batch)
		}
	}

	fn engine(base_url: &str, max_attempts: u32) -> StepEngine {
		let mut config = RelayConfig::with_base_url(base_url);
		config.polling = PollingConfig {
			interval_ms: 10,
			max_attempts,
			delayed_after: 2,
		};
		config.retry = RetryConfig {
			max_attempts: 3,
			interval_ms: 10,
		};
		config.hyperliquid.exchange_url = format!("{}/exchange", base_url);
		StepEngine::new(&config, RelayApiClient::new(&config.api).unwrap())
	}

	fn recorder() -> (ExecuteOptions, Arc<Mutex<Vec<ProgressSnapshot>>>) {
		let snapshots = Arc::new(Mutex::new(Vec::new()));
		let sink = snapshots.clone();
		let options = ExecuteOptions::default().with_progress(move |snapshot| sink.lock().unwrap().push(snapshot));
		(options, snapshots)
	}

	fn tx_step(id: &str, chain_id: ChainId) -> Value {
		json!({
			"id": id,
			"kind": "transaction",
			"items": [{
				"status": "incomplete",
				"data": {
					"to": "0x00000000000000000000000000000000000000b0",
					"data": "0x",
					"value": "1000",
					"chainId": chain_id
				}
			}]
		})
	}

	fn quote(steps: Vec<Value>) -> Quote {
		serde_json::from_value(json!({
			"steps": steps,
			"details": {"recipient": "0x00000000000000000000000000000000000000cc"}
		}))
		.unwrap()
	}

	fn checked_step(id: &str) -> Value {
		let mut step = tx_step(id, 8453);
		step["requestId"] = json!("0xreq");
		step["items"][0]["check"] = json!({"endpoint": "/intents/status?requestId=0xreq", "method": "GET"});
		step
	}

	async fn check_server(body: Value) -> MockServer {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/intents/status"))
			.and(query_param("requestId", "0xreq"))
			.respond_with(ResponseTemplate::new(200).set_body_json(body))
			.mount(&server)
			.await;
		server
	}

	#[tokio::test]
	async fn test_single_transaction_confirmed_locally() {
		let wallet = FakeWallet::on(8453);
		let (options, snapshots) = recorder();

		let result = engine("http://127.0.0.1:1", 3)
			.execute(&quote(vec![tx_step("deposit", 8453)]), &wallet, &options)
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["send:deposit"]);
		assert!(result.is_complete());
		assert_eq!(result.tx_hashes, vec![TxHashEntry::new("0xhash-deposit", 8453)]);

		let snapshots = snapshots.lock().unwrap();
		let states: Vec<_> = snapshots
			.iter()
			.filter_map(|s| s.current_step_item.as_ref().and_then(|i| i.progress_state))
			.collect();
		assert!(states.contains(&ProgressState::Confirming));
		assert!(states.contains(&ProgressState::Validating));
		assert!(snapshots.last().unwrap().is_complete());
	}

	#[tokio::test]
	async fn test_approve_and_swap_run_in_order_without_batching() {
		let wallet = FakeWallet::on(8453);

		let result = engine("http://127.0.0.1:1", 3)
			.execute(
				&quote(vec![tx_step("approve", 8453), tx_step("swap", 8453)]),
				&wallet,
				&ExecuteOptions::default(),
			)
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["send:approve", "send:swap"]);
		assert!(result.steps.iter().all(Step::is_complete));
	}

	#[tokio::test]
	async fn test_approve_and_deposit_sent_as_one_batch() {
		let wallet = FakeWallet::on(8453).with_atomic_batch();

		let result = engine("http://127.0.0.1:1", 3)
			.execute(
				&quote(vec![tx_step("approve", 8453), tx_step("deposit", 8453)]),
				&wallet,
				&ExecuteOptions::default(),
			)
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["send_calls:2"]);
		assert!(result.steps.iter().all(Step::is_complete));

		let deposit = &result.steps[1].items[0];
		assert!(deposit.tx_hashes.contains(&TxHashEntry::batch("batch-1", 8453)));
		assert!(deposit.tx_hashes.contains(&TxHashEntry::new("0xbatched", 8453)));
	}

	#[tokio::test]
	async fn test_dead_recipient_rejected_before_wallet_calls() {
		let wallet = FakeWallet::on(8453);
		let (options, snapshots) = recorder();
		let mut quote = quote(vec![tx_step("deposit", 8453)]);
		quote.details.as_mut().unwrap().recipient = Some("0x000000000000000000000000000000000000dEaD".to_string());

		let err = engine("http://127.0.0.1:1", 3)
			.execute(&quote, &wallet, &options)
			.await
			.unwrap_err();

		assert!(matches!(err, ExecutionError::Validation(_)));
		assert!(wallet.log().is_empty());
		assert!(snapshots.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_split_route_requires_acceptance() {
		let wallet = FakeWallet::on(8453);
		let mut quote = quote(vec![tx_step("deposit", 8453)]);
		quote.details.as_mut().unwrap().split_route = true;
		let engine = engine("http://127.0.0.1:1", 3);

		let err = engine
			.execute(&quote, &wallet, &ExecuteOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(err, ExecutionError::ConfirmationRequired(_)));
		assert!(wallet.log().is_empty());

		let options = ExecuteOptions::default().accept_split_route(true);
		engine.execute(&quote, &wallet, &options).await.unwrap();
		assert_eq!(wallet.log(), vec!["send:deposit"]);
	}

	#[tokio::test]
	async fn test_status_poll_gives_up_after_max_attempts() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/intents/status/v2"))
			.and(query_param("requestId", "0xreq"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
			.expect(3)
			.mount(&server)
			.await;

		let wallet = FakeWallet::on(8253038).without_confirmation();
		let mut step = tx_step("deposit", 8253038);
		step["requestId"] = json!("0xreq");
		let (options, snapshots) = recorder();

		let err = engine(&server.uri(), 3)
			.execute(&quote(vec![step]), &wallet, &options)
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			ExecutionError::SolverStatusTimeout { ref request_id, attempts: 3 } if request_id == "0xreq"
		));
		let last = snapshots.lock().unwrap().last().cloned().unwrap();
		assert_eq!(last.error, Some(err.to_string()));
		assert_eq!(last.steps[0].items[0].error, Some(err.to_string()));
		assert_eq!(last.steps[0].items[0].tx_hashes, vec![TxHashEntry::new("0xhash-deposit", 8253038)]);
		server.verify().await;
	}

	#[tokio::test]
	async fn test_check_success_records_fill_hashes() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/intents/status"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
			.up_to_n_times(2)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/intents/status"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "success",
				"txHashes": ["0xfill"],
				"inTxHashes": ["0xin"],
				"destinationChainId": 10
			})))
			.mount(&server)
			.await;

		let wallet = FakeWallet::on(8453);
		let (options, snapshots) = recorder();

		let result = engine(&server.uri(), 5)
			.execute(&quote(vec![checked_step("deposit")]), &wallet, &options)
			.await
			.unwrap();

		let item = &result.steps[0].items[0];
		assert!(item.is_complete());
		assert_eq!(
			item.tx_hashes,
			vec![TxHashEntry::new("0xfill", 10), TxHashEntry::new("0xhash-deposit", 8453)]
		);
		assert_eq!(item.internal_tx_hashes, vec![TxHashEntry::new("0xin", 8453)]);

		let delayed = snapshots.lock().unwrap().iter().any(|s| {
			s.current_step_item
				.as_ref()
				.is_some_and(|i| i.progress_state == Some(ProgressState::ValidatingDelayed))
		});
		assert!(delayed);
	}

	#[tokio::test]
	async fn test_refund_stops_remaining_steps() {
		let server = check_server(json!({"status": "refund"})).await;
		let wallet = FakeWallet::on(8453);

		let result = engine(&server.uri(), 3)
			.execute(
				&quote(vec![checked_step("deposit"), tx_step("claim", 8453)]),
				&wallet,
				&ExecuteOptions::default(),
			)
			.await
			.unwrap();

		assert!(result.refunded);
		assert_eq!(wallet.log(), vec!["send:deposit"]);
		assert!(result.steps[0].is_complete());
		assert!(!result.steps[1].is_complete());
	}

	#[tokio::test]
	async fn test_failure_is_attached_to_the_item() {
		let server = check_server(json!({"status": "failure", "details": "Solver rejected"})).await;
		let wallet = FakeWallet::on(8453);
		let (options, snapshots) = recorder();

		let err = engine(&server.uri(), 3)
			.execute(&quote(vec![checked_step("deposit")]), &wallet, &options)
			.await
			.unwrap_err();

		assert_eq!(err.to_string(), "Request failed (0xreq): Solver rejected");
		let last = snapshots.lock().unwrap().last().cloned().unwrap();
		let step = &last.steps[0];
		assert_eq!(step.error.as_deref(), Some("Request failed (0xreq): Solver rejected"));
		assert!(step.items[0].error_data.is_some());
		assert!(!step.items[0].is_complete());
	}

	#[tokio::test]
	async fn test_switches_chain_before_sending() {
		let wallet = FakeWallet::on(1);

		engine("http://127.0.0.1:1", 3)
			.execute(&quote(vec![tx_step("deposit", 8453)]), &wallet, &ExecuteOptions::default())
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["switch:8453", "send:deposit"]);
	}

	#[tokio::test]
	async fn test_signature_is_posted_with_retry() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/authorize"))
			.respond_with(ResponseTemplate::new(503))
			.up_to_n_times(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/authorize"))
			.and(query_param("signature", SIGNATURE))
			.and(body_partial_json(json!({"kind": "login"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
			.expect(1)
			.mount(&server)
			.await;

		let wallet = FakeWallet::on(1);
		let step = json!({
			"id": "authorize",
			"kind": "signature",
			"items": [{
				"status": "incomplete",
				"data": {
					"chainId": 1,
					"sign": {"signatureKind": "eip191", "message": "Sign in"},
					"post": {"endpoint": "/authorize", "method": "POST", "body": {"kind": "login"}}
				}
			}]
		});

		let result = engine(&server.uri(), 3)
			.execute(&quote(vec![step]), &wallet, &ExecuteOptions::default())
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["sign:1"]);
		assert!(result.is_complete());
		server.verify().await;
	}

	#[tokio::test]
	async fn test_hyperliquid_action_is_relayed() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/exchange"))
			.and(body_partial_json(json!({
				"action": {"type": "usdSend", "destination": "0x00000000000000000000000000000000000000dd"},
				"signature": {"v": 28}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
			.expect(1)
			.mount(&server)
			.await;

		let wallet = FakeWallet::on(42161);
		let step = json!({
			"id": "deposit",
			"kind": "signature",
			"items": [{
				"status": "incomplete",
				"data": {
					"chainId": 1337,
					"action": {
						"type": "usdSend",
						"parameters": {"destination": "0x00000000000000000000000000000000000000dd", "amount": "5"}
					}
				}
			}]
		});

		let result = engine(&server.uri(), 3)
			.execute(&quote(vec![step]), &wallet, &ExecuteOptions::default())
			.await
			.unwrap();

		assert_eq!(wallet.log(), vec!["sign:42161"]);
		let item = &result.steps[0].items[0];
		assert!(item.is_complete());
		assert!(matches!(item.data.sign, Some(relay_types::SignData::Eip712 { .. })));
		server.verify().await;
	}

	#[tokio::test]
	async fn test_hyperliquid_action_is_not_resubmitted() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/exchange"))
			.respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
			.expect(1)
			.mount(&server)
			.await;

		let wallet = FakeWallet::on(42161);
		let step = json!({
			"id": "deposit",
			"kind": "signature",
			"items": [{
				"status": "incomplete",
				"data": {
					"chainId": 1337,
					"action": {
						"type": "usdSend",
						"parameters": {"destination": "0x00000000000000000000000000000000000000dd", "amount": "5"}
					}
				}
			}]
		});

		let err = engine(&server.uri(), 3)
			.execute(&quote(vec![step]), &wallet, &ExecuteOptions::default())
			.await
			.unwrap_err();

		assert!(matches!(err, ExecutionError::Api { status: 502, .. }));
		assert_eq!(wallet.log(), vec!["sign:42161"]);
		server.verify().await;
	}

	fn is_delayed(snapshot: &ProgressSnapshot) -> bool {
		snapshot
			.current_step_item
			.as_ref()
			.is_some_and(|i| i.progress_state == Some(ProgressState::ValidatingDelayed))
	}

	#[tokio::test]
	async fn test_cancel_during_status_wait_stops_polling() {
		let server = check_server(json!({"status": "pending"})).await;
		let wallet = FakeWallet::on(8453);

		let snapshots = Arc::new(Mutex::new(Vec::new()));
		let sink = snapshots.clone();
		let cancel = CancellationToken::new();
		let trigger = cancel.clone();
		let options = ExecuteOptions::default()
			.with_progress(move |snapshot: ProgressSnapshot| {
				let delayed = is_delayed(&snapshot);
				sink.lock().unwrap().push(snapshot);
				if delayed {
					trigger.cancel();
				}
			})
			.with_cancel(cancel);

		let err = engine(&server.uri(), 500)
			.execute(&quote(vec![checked_step("deposit")]), &wallet, &options)
			.await
			.unwrap_err();
		assert!(matches!(err, ExecutionError::Cancelled));

		let polled = server.received_requests().await.unwrap().len();
		assert_eq!(polled, 2);
		tokio::time::sleep(std::time::Duration::from_millis(100)).await;
		assert_eq!(server.received_requests().await.unwrap().len(), polled);

		// nothing is emitted after the snapshot that cancelled
		let snapshots = snapshots.lock().unwrap();
		let cancelled_at = snapshots.iter().position(is_delayed).unwrap();
		assert_eq!(cancelled_at, snapshots.len() - 1);
		assert!(snapshots.iter().all(|s| s.error.is_none()));
	}

	#[tokio::test]
	async fn test_cancelled_execution_stops_before_wallet() {
		let wallet = FakeWallet::on(8453);
		let (options, snapshots) = recorder();
		let cancel = CancellationToken::new();
		cancel.cancel();

		let err = engine("http://127.0.0.1:1", 3)
			.execute(&quote(vec![tx_step("deposit", 8453)]), &wallet, &options.with_cancel(cancel))
			.await
			.unwrap_err();

		assert!(matches!(err, ExecutionError::Cancelled));
		assert!(wallet.log().is_empty());
		assert!(snapshots.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_caller_quote_is_untouched_and_prior_hashes_kept() {
		let wallet = FakeWallet::on(8453);
		let mut step = tx_step("deposit", 8453);
		step["items"][0]["txHashes"] = json!([{"txHash": "0xearlier", "chainId": 8453}]);
		let quote = quote(vec![step]);
		let before = quote.clone();

		let result = engine("http://127.0.0.1:1", 3)
			.execute(&quote, &wallet, &ExecuteOptions::default())
			.await
			.unwrap();

		assert_eq!(quote, before);
		assert_eq!(
			result.steps[0].items[0].tx_hashes,
			vec![
				TxHashEntry::new("0xhash-deposit", 8453),
				TxHashEntry::new("0xearlier", 8453)
			]
		);
	}
}
