//! High-level actions.
//!
//! [`RelayClient`] bundles configuration, the HTTP client and the engine so
//! callers can go from "move this much of X to chain Y" to an executed quote
//! in one call. Nothing here is global; every client owns its dependencies.

use crate::engine::{ExecuteOptions, StepEngine};
use relay_config::RelayConfig;
use relay_status::{AppFeeBalances, CallTx, ClaimAppFeesRequest, QuoteRequest, RelayApiClient, TradeType};
use relay_types::{ChainId, ExecutionError, ProgressSnapshot, Quote};
use relay_wallet::WalletAdapter;
use serde_json::{Map, Value};
use tracing::{info, instrument};

/// Parameters of a bridge or swap.
#[derive(Debug, Clone, Default)]
pub struct TransferParams {
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	/// Currency paid on the origin chain.
	pub currency: String,
	/// Currency received on the destination chain. Bridges reuse `currency`.
	pub to_currency: Option<String>,
	/// Amount in base units.
	pub amount: String,
	pub recipient: Option<String>,
	pub trade_type: TradeType,
	pub options: Map<String, Value>,
}

/// Parameters of a cross-chain call.
#[derive(Debug, Clone, Default)]
pub struct CallParams {
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	/// Currency used to pay for the calls on the origin chain.
	pub currency: String,
	/// Currency the calls consume on the destination chain.
	pub to_currency: String,
	pub txs: Vec<CallTx>,
	pub recipient: Option<String>,
	pub options: Map<String, Value>,
}

pub struct RelayClient {
	config: RelayConfig,
	api: RelayApiClient,
	engine: StepEngine,
}

impl RelayClient {
	pub fn new(config: RelayConfig) -> Result<Self, ExecutionError> {
		let api = RelayApiClient::new(&config.api)?;
		Ok(Self::with_api(config, api))
	}

	/// Uses a caller-built API client.
	pub fn with_api(config: RelayConfig, api: RelayApiClient) -> Self {
		let engine = StepEngine::new(&config, api.clone());
		Self { config, api, engine }
	}

	pub fn config(&self) -> &RelayConfig {
		&self.config
	}

	pub fn api(&self) -> &RelayApiClient {
		&self.api
	}

	pub async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ExecutionError> {
		Ok(self.api.get_quote(request).await?)
	}

	pub async fn get_app_fees(&self, wallet: &str) -> Result<AppFeeBalances, ExecutionError> {
		Ok(self.api.get_app_fees(wallet).await?)
	}

	pub async fn execute(
		&self,
		quote: &Quote,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		self.engine.execute(quote, wallet, options).await
	}

	/// Moves `currency` from the origin chain to the same currency on the
	/// destination chain.
	#[instrument(skip_all, fields(origin = params.origin_chain_id, destination = params.destination_chain_id))]
	pub async fn bridge(
		&self,
		params: &TransferParams,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		let user = wallet.address().await?;
		let request = transfer_request(user, params, params.currency.clone());
		self.quote_and_execute(&request, wallet, options).await
	}

	#[instrument(skip_all, fields(origin = params.origin_chain_id, destination = params.destination_chain_id))]
	pub async fn swap(
		&self,
		params: &TransferParams,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		let to_currency = params
			.to_currency
			.clone()
			.ok_or_else(|| ExecutionError::Validation("Swap requires a destination currency".to_string()))?;
		let user = wallet.address().await?;
		let request = transfer_request(user, params, to_currency);
		self.quote_and_execute(&request, wallet, options).await
	}

	/// Executes `params.txs` on the destination chain, paid for from the
	/// origin chain. The amount is the total value the calls need.
	#[instrument(skip_all, fields(origin = params.origin_chain_id, destination = params.destination_chain_id, txs = params.txs.len()))]
	pub async fn call(
		&self,
		params: &CallParams,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		if params.txs.is_empty() {
			return Err(ExecutionError::Validation("Call requires at least one transaction".to_string()));
		}
		let amount = total_value(&params.txs)?;
		let user = wallet.address().await?;

		let request = QuoteRequest {
			user,
			recipient: params.recipient.clone(),
			origin_chain_id: params.origin_chain_id,
			destination_chain_id: params.destination_chain_id,
			origin_currency: params.currency.clone(),
			destination_currency: params.to_currency.clone(),
			amount: amount.to_string(),
			trade_type: TradeType::ExactOutput,
			referrer: None,
			txs: Some(params.txs.clone()),
			options: params.options.clone(),
		};
		self.quote_and_execute(&request, wallet, options).await
	}

	/// Withdraws accrued app fees of `currency` on `chain_id` to `recipient`
	/// (the wallet itself when `None`).
	#[instrument(skip_all, fields(chain_id = chain_id, currency = %currency))]
	pub async fn claim_app_fees(
		&self,
		wallet: &dyn WalletAdapter,
		chain_id: ChainId,
		currency: &str,
		recipient: Option<&str>,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		let address = wallet.address().await?;
		let request = ClaimAppFeesRequest {
			chain_id,
			currency: currency.to_string(),
			recipient: recipient.map(str::to_string).unwrap_or_else(|| address.clone()),
		};

		let quote = self.api.claim_app_fees(&address, &request).await?;
		info!(steps = quote.steps.len(), "Claiming app fees");
		self.engine.execute(&quote, wallet, options).await
	}

	async fn quote_and_execute(
		&self,
		request: &QuoteRequest,
		wallet: &dyn WalletAdapter,
		options: &ExecuteOptions,
	) -> Result<ProgressSnapshot, ExecutionError> {
		let quote = self.get_quote(request).await?;
		info!(steps = quote.steps.len(), "Executing quote");
		self.engine.execute(&quote, wallet, options).await
	}
}

fn transfer_request(user: String, params: &TransferParams, destination_currency: String) -> QuoteRequest {
	QuoteRequest {
		user,
		recipient: params.recipient.clone(),
		origin_chain_id: params.origin_chain_id,
		destination_chain_id: params.destination_chain_id,
		origin_currency: params.currency.clone(),
		destination_currency,
		amount: params.amount.clone(),
		trade_type: params.trade_type,
		referrer: None,
		txs: None,
		options: params.options.clone(),
	}
}

/// Sum of the native value carried by `txs`, in base units.
fn total_value(txs: &[CallTx]) -> Result<u128, ExecutionError> {
	txs.iter().try_fold(0u128, |total, tx| {
		let value = if tx.value.is_empty() {
			0
		} else {
			tx.value
				.parse::<u128>()
				.map_err(|_| ExecutionError::Validation(format!("Invalid call value: {}", tx.value)))?
		};
		total
			.checked_add(value)
			.ok_or_else(|| ExecutionError::Validation("Call values overflow".to_string()))
	})
}
