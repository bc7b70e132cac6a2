use anyhow::{Context, Result};
use clap::Parser;
use relay_config::{ConfigLoader, RelayConfig};
use relay_core::{ExecuteOptions, ProgressBus, RelayClient};
use relay_status::{QuoteRequest, StatusPoller, StatusSocket};
use relay_types::{ExecutionError, ProgressSnapshot, Quote};
use relay_wallet::{create_evm_wallet, WalletAdapter};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Args, Command, ExecuteArgs, TransferArgs};

const DEFAULT_API_URL: &str = "https://api.relay.link";

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = load_config(&args).await?;
	setup_tracing(args.log_level(&config.logging))?;
	if args.config.is_none() {
		debug!("No configuration file given, using defaults");
	}

	match args.command {
		Command::Quote { transfer, user } => quote(config, transfer, user).await,
		Command::Execute(execute_args) => execute(config, execute_args).await,
		Command::Status { request_id, wait } => status(config, &request_id, wait).await,
		Command::ClaimFees {
			chain_id,
			currency,
			recipient,
		} => claim_fees(config, chain_id, &currency, recipient.as_deref()).await,
		Command::Validate => validate(args.config.is_some(), &config),
	}
}

async fn load_config(args: &Args) -> Result<RelayConfig> {
	let mut config = match &args.config {
		Some(path) => ConfigLoader::new()
			.with_file(path)
			.load()
			.await
			.context("Failed to load configuration")?,
		None => RelayConfig::with_base_url(DEFAULT_API_URL),
	};

	if let Some(url) = &args.api_url {
		config.api.base_url = url.clone();
	}
	Ok(config)
}

async fn quote(config: RelayConfig, transfer: TransferArgs, user: Option<String>) -> Result<()> {
	let client = RelayClient::new(config.clone()).context("Failed to create relay client")?;
	let user = match user {
		Some(user) => user,
		None => create_evm_wallet(&config)
			.context("No --user given and no wallet configured")?
			.address()
			.await?,
	};

	let quote = client
		.get_quote(&quote_request(user, &transfer))
		.await
		.context("Failed to get quote")?;
	info!(steps = quote.steps.len(), "Quote received");
	print_json(&quote)
}

async fn execute(config: RelayConfig, args: ExecuteArgs) -> Result<()> {
	let client = RelayClient::new(config.clone()).context("Failed to create relay client")?;
	let wallet = create_evm_wallet(&config).context("Failed to create wallet")?;

	let quote = match (&args.quote_file, args.transfer()) {
		(Some(path), _) => read_quote(path).await?,
		(None, Some(transfer)) => {
			let user = wallet.address().await?;
			client
				.get_quote(&quote_request(user, &transfer))
				.await
				.context("Failed to get quote")?
		}
		(None, None) => anyhow::bail!("Either --quote-file or the transfer arguments are required"),
	};

	let options = ExecuteOptions::default().accept_split_route(args.accept_split_route);
	let snapshot = run_with_progress(options, |options| async move { client.execute(&quote, &wallet, &options).await })
		.await
		.context("Execution failed")?;
	print_json(&snapshot)
}

async fn status(config: RelayConfig, request_id: &str, wait: bool) -> Result<()> {
	let client = RelayClient::new(config.clone()).context("Failed to create relay client")?;

	let status = if wait {
		let mut poller = StatusPoller::new(client.api().clone(), &config.polling);
		if let Some(socket) = StatusSocket::from_config(&config.api) {
			poller = poller.with_socket(Arc::new(socket));
		}
		poller
			.wait_for_status(request_id, |attempt, status| {
				if let Some(status) = status {
					info!(attempt, status = %status.status, "Waiting for request");
				}
			})
			.await
			.map_err(ExecutionError::from)
			.context("Failed to wait for request")?
	} else {
		client
			.api()
			.get_status(request_id)
			.await
			.map_err(ExecutionError::from)
			.context("Failed to get request status")?
	};
	print_json(&status)
}

async fn claim_fees(config: RelayConfig, chain_id: u64, currency: &str, recipient: Option<&str>) -> Result<()> {
	let client = RelayClient::new(config.clone()).context("Failed to create relay client")?;
	let wallet = create_evm_wallet(&config).context("Failed to create wallet")?;

	let snapshot = run_with_progress(ExecuteOptions::default(), |options| async move {
		client
			.claim_app_fees(&wallet, chain_id, currency, recipient, &options)
			.await
	})
	.await
	.context("Failed to claim app fees")?;
	print_json(&snapshot)
}

fn validate(from_file: bool, config: &RelayConfig) -> Result<()> {
	if !from_file {
		anyhow::bail!("No configuration file given, pass --config or set RELAY_CONFIG");
	}

	info!("Configuration is valid");
	info!("API: {}", config.api.base_url);
	info!(
		"Polling: every {}ms, up to {} attempts",
		config.polling.interval_ms, config.polling.max_attempts
	);
	let mut chains: Vec<_> = config.chains.iter().collect();
	chains.sort_by_key(|(id, _)| **id);
	for (chain_id, chain) in chains {
		info!("  Chain {} ({}): {}", chain_id, config.vm_type(*chain_id), chain.name);
	}
	if config.wallet.private_key.is_none() {
		warn!("No wallet configured, only quote and status commands are available");
	}
	Ok(())
}

/// Runs an execution with progress logging, cancelling it on Ctrl+C.
async fn run_with_progress<F, Fut>(options: ExecuteOptions, run: F) -> Result<ProgressSnapshot, ExecutionError>
where
	F: FnOnce(ExecuteOptions) -> Fut,
	Fut: std::future::Future<Output = Result<ProgressSnapshot, ExecutionError>>,
{
	let bus = ProgressBus::default();
	let renderer = tokio::spawn(render_progress(bus.subscribe()));
	let cancel = CancellationToken::new();

	let mut options = options.with_cancel(cancel.clone());
	options.on_progress = Some(bus.callback());

	let result = tokio::select! {
		result = run(options) => result,
		_ = signal::ctrl_c() => {
			warn!("Interrupted, cancelling execution");
			cancel.cancel();
			Err(ExecutionError::Cancelled)
		}
	};

	// the renderer exits once every sender is gone
	drop(bus);
	if let Err(e) = renderer.await {
		debug!(error = %e, "Progress renderer stopped");
	}
	result
}

async fn render_progress(mut updates: broadcast::Receiver<ProgressSnapshot>) {
	loop {
		match updates.recv().await {
			Ok(snapshot) => {
				if let Some(message) = &snapshot.error {
					error!("{}", message);
				} else if let (Some(step), Some(item)) = (&snapshot.current_step, &snapshot.current_step_item) {
					info!(step = %step.id, state = ?item.progress_state, "{}", step.description);
				} else if snapshot.refunded {
					warn!("Request refunded");
				}
			}
			Err(RecvError::Lagged(skipped)) => debug!(skipped, "Progress renderer lagged"),
			Err(RecvError::Closed) => break,
		}
	}
}

fn quote_request(user: String, transfer: &TransferArgs) -> QuoteRequest {
	QuoteRequest {
		user,
		recipient: transfer.recipient.clone(),
		origin_chain_id: transfer.origin_chain_id,
		destination_chain_id: transfer.destination_chain_id,
		origin_currency: transfer.currency.clone(),
		destination_currency: transfer
			.to_currency
			.clone()
			.unwrap_or_else(|| transfer.currency.clone()),
		amount: transfer.amount.clone(),
		trade_type: transfer.trade_type.into(),
		..Default::default()
	}
}

async fn read_quote(path: &Path) -> Result<Quote> {
	let content = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read {}", path.display()))?;
	serde_json::from_str(&content).with_context(|| format!("Invalid quote in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
