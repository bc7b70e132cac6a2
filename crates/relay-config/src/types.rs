//! Configuration types for the relay executor.

use crate::serde_helpers::{deserialize_chain_id_map, serialize_chain_id_map};
use relay_types::{ChainId, VmType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Complete executor configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RelayConfig {
	/// Relay API settings
	#[validate(nested)]
	pub api: ApiConfig,
	/// Check and status polling
	#[serde(default)]
	#[validate(nested)]
	pub polling: PollingConfig,
	/// Bounded retry policy for transient failures
	#[serde(default)]
	#[validate(nested)]
	pub retry: RetryConfig,
	/// Local confirmation polling
	#[serde(default)]
	#[validate(nested)]
	pub confirmation: ConfirmationConfig,
	/// Signing key and default chain
	#[serde(default)]
	pub wallet: WalletConfig,
	/// Chain endpoints keyed by relay chain id
	#[serde(
		default,
		deserialize_with = "deserialize_chain_id_map",
		serialize_with = "serialize_chain_id_map"
	)]
	pub chains: HashMap<ChainId, ChainConfig>,
	/// Hyperliquid exchange relay
	#[serde(default)]
	#[validate(nested)]
	pub hyperliquid: HyperliquidConfig,
	/// Logging
	#[serde(default)]
	pub logging: LoggingConfig,
}

/// Relay API settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ApiConfig {
	/// Base URL of the relay API
	#[validate(url)]
	pub base_url: String,
	/// Value sent in the `x-relay-source` header
	pub source: Option<String>,
	/// Referrer injected into quote requests
	pub referrer: Option<String>,
	/// Optional API key sent as `x-api-key`
	pub api_key: Option<String>,
	/// Websocket endpoint for status push
	#[validate(url)]
	pub websocket_url: Option<String>,
	/// Subscribe to status updates over the websocket
	#[serde(default)]
	pub websocket_enabled: bool,
}

/// Check and status polling
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PollingConfig {
	#[serde(default = "default_polling_interval_ms")]
	#[validate(range(min = 1))]
	pub interval_ms: u64,
	#[serde(default = "default_polling_max_attempts")]
	#[validate(range(min = 1))]
	pub max_attempts: u32,
	/// Attempts after which an item is reported as delayed
	#[serde(default = "default_delayed_after")]
	pub delayed_after: u32,
}

impl PollingConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			interval_ms: default_polling_interval_ms(),
			max_attempts: default_polling_max_attempts(),
			delayed_after: default_delayed_after(),
		}
	}
}

/// Bounded retry policy
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetryConfig {
	#[serde(default = "default_retry_max_attempts")]
	#[validate(range(min = 1))]
	pub max_attempts: u32,
	#[serde(default = "default_retry_interval_ms")]
	pub interval_ms: u64,
}

impl RetryConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: default_retry_max_attempts(),
			interval_ms: default_retry_interval_ms(),
		}
	}
}

/// Local confirmation polling
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ConfirmationConfig {
	#[serde(default = "default_confirmation_interval_ms")]
	#[validate(range(min = 1))]
	pub interval_ms: u64,
	#[serde(default = "default_confirmation_max_attempts")]
	#[validate(range(min = 1))]
	pub max_attempts: u32,
}

impl ConfirmationConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			interval_ms: default_confirmation_interval_ms(),
			max_attempts: default_confirmation_max_attempts(),
		}
	}
}

/// Signing key and default chain
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Hex private key for the EVM wallet
	pub private_key: Option<String>,
	/// Chain the wallet starts on
	pub default_chain: Option<ChainId>,
}

/// Chain-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ChainConfig {
	/// Chain name for logging
	pub name: String,
	/// JSON-RPC endpoint
	#[validate(url)]
	pub rpc_url: String,
	/// Endpoint serving `debug_traceTransaction`, defaults to `rpc_url`
	#[validate(url)]
	pub trace_url: Option<String>,
	/// VM family, derived from the chain id when absent
	pub vm_type: Option<VmType>,
	/// Endpoint speaks EIP-5792 `wallet_sendCalls`
	#[serde(default)]
	pub atomic_batch: bool,
}

/// Hyperliquid exchange relay
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HyperliquidConfig {
	#[serde(default = "default_hyperliquid_exchange_url")]
	#[validate(url)]
	pub exchange_url: String,
	/// `Mainnet` or `Testnet`
	#[serde(default = "default_hyperliquid_chain")]
	pub chain: String,
}

impl Default for HyperliquidConfig {
	fn default() -> Self {
		Self {
			exchange_url: default_hyperliquid_exchange_url(),
			chain: default_hyperliquid_chain(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
	#[serde(default = "default_log_level")]
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: default_log_level(),
		}
	}
}

fn default_polling_interval_ms() -> u64 {
	1000
}

fn default_polling_max_attempts() -> u32 {
	60
}

fn default_delayed_after() -> u32 {
	30
}

fn default_retry_max_attempts() -> u32 {
	3
}

fn default_retry_interval_ms() -> u64 {
	500
}

fn default_confirmation_interval_ms() -> u64 {
	1000
}

fn default_confirmation_max_attempts() -> u32 {
	120
}

fn default_hyperliquid_exchange_url() -> String {
	"https://api.hyperliquid.xyz/exchange".to_string()
}

fn default_hyperliquid_chain() -> String {
	"Mainnet".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

impl RelayConfig {
	/// Minimal configuration pointing at `base_url`, everything else default.
	pub fn with_base_url(base_url: impl Into<String>) -> Self {
		Self {
			api: ApiConfig {
				base_url: base_url.into(),
				source: None,
				referrer: None,
				api_key: None,
				websocket_url: None,
				websocket_enabled: false,
			},
			polling: PollingConfig::default(),
			retry: RetryConfig::default(),
			confirmation: ConfirmationConfig::default(),
			wallet: WalletConfig::default(),
			chains: HashMap::new(),
			hyperliquid: HyperliquidConfig::default(),
			logging: LoggingConfig::default(),
		}
	}

	/// VM family of a configured chain.
	pub fn vm_type(&self, chain_id: ChainId) -> VmType {
		self.chains
			.get(&chain_id)
			.and_then(|c| c.vm_type)
			.unwrap_or_else(|| VmType::for_chain(chain_id))
	}
}
