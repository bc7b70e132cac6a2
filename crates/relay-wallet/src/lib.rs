//! Wallet adapters.
//!
//! A [`WalletAdapter`] is the only way the engine touches a wallet. The
//! required methods cover address, chain, signing, sending and confirming.
//! Optional capabilities (EOA detection, atomic batches, balances) are
//! declared through [`WalletAdapter::capabilities`] and checked before use;
//! adapters that do not support a call fail with [`WalletError::NotImplemented`].

use async_trait::async_trait;
use relay_confirm::ConfirmationError;
use relay_types::{ChainId, ExecutionError, Receipt, Step, StepItem, VmType};
use thiserror::Error;

pub mod implementations;

pub use implementations::{
	create_evm_wallet, BitcoinWallet, EvmChain, EvmWallet, PsbtSigner, SolanaSender, SolanaWallet, SuiSigner,
	SuiWallet,
};

#[derive(Debug, Error)]
pub enum WalletError {
	#[error("Not implemented")]
	NotImplemented,

	#[error("User rejected the request: {0}")]
	Rejected(String),

	#[error("Signing failed: {0}")]
	SigningFailed(String),

	#[error("Invalid key: {0}")]
	InvalidKey(String),

	#[error("Unsupported chain: {0}")]
	UnsupportedChain(ChainId),

	#[error("Invalid payload: {0}")]
	InvalidPayload(String),

	#[error("Provider error: {0}")]
	Provider(String),

	#[error(transparent)]
	Confirmation(#[from] ConfirmationError),
}

impl WalletError {
	pub fn is_not_implemented(&self) -> bool {
		matches!(self, WalletError::NotImplemented)
	}
}

impl From<WalletError> for ExecutionError {
	fn from(err: WalletError) -> Self {
		match err {
			WalletError::Rejected(msg) => ExecutionError::WalletRejected(msg),
			WalletError::Confirmation(e) => e.into(),
			other => ExecutionError::Wallet(other.to_string()),
		}
	}
}

/// Optional capabilities an adapter declares up front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletCapabilities {
	pub atomic_batch: bool,
	pub eoa_detection: bool,
	pub balance: bool,
}

/// Identifier returned by a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
	pub id: String,
	/// `id` is a wallet call-bundle id rather than a transaction hash
	pub is_batch: bool,
}

impl SentTransaction {
	pub fn hash(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			is_batch: false,
		}
	}

	pub fn batch(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			is_batch: true,
		}
	}
}

#[async_trait]
pub trait WalletAdapter: Send + Sync {
	fn vm_type(&self) -> VmType;

	/// Controlling address. Stable for the lifetime of the adapter.
	async fn address(&self) -> Result<String, WalletError>;

	async fn get_chain_id(&self) -> Result<ChainId, WalletError>;

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;

	/// Signs the item's `sign` payload and returns the hex signature.
	async fn handle_sign_message_step(&self, chain_id: ChainId, item: &StepItem) -> Result<String, WalletError>;

	async fn handle_send_transaction_step(
		&self,
		chain_id: ChainId,
		item: &StepItem,
		step: &Step,
	) -> Result<SentTransaction, WalletError>;

	/// Blocks until the transaction is final.
	async fn handle_confirm_transaction_step(&self, tx_hash: &str, chain_id: ChainId) -> Result<Receipt, WalletError>;

	fn capabilities(&self) -> WalletCapabilities {
		WalletCapabilities::default()
	}

	async fn is_eoa(&self, _chain_id: ChainId) -> Result<bool, WalletError> {
		Err(WalletError::NotImplemented)
	}

	async fn supports_atomic_batch(&self, _chain_id: ChainId) -> Result<bool, WalletError> {
		Err(WalletError::NotImplemented)
	}

	/// Balance in base units. `currency` is a token address, `None` for native.
	async fn get_balance(
		&self,
		_chain_id: ChainId,
		_address: &str,
		_currency: Option<&str>,
	) -> Result<String, WalletError> {
		Err(WalletError::NotImplemented)
	}
}
