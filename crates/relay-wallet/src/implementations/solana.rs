//! Solana-family wallet.
//!
//! Transaction assembly and signing stay with an external [`SolanaSender`];
//! this adapter feeds it the item's instructions and confirms the returned
//! signature through the SVM watcher.

use crate::{SentTransaction, WalletAdapter, WalletError};
use async_trait::async_trait;
use relay_confirm::{ConfirmationError, ConfirmationService, ConfirmationWatcher};
use relay_types::{ChainId, Receipt, SignData, Step, StepItem, VmType};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Signs and broadcasts Solana transactions built from relay instructions.
#[async_trait]
pub trait SolanaSender: Send + Sync {
	fn address(&self) -> String;

	/// Builds a versioned transaction from `instructions`, signs and sends it,
	/// returning the base58 signature.
	async fn send_instructions(
		&self,
		instructions: &[Value],
		address_lookup_tables: &[String],
	) -> Result<String, WalletError>;

	async fn sign_message(&self, _message: &[u8]) -> Result<String, WalletError> {
		Err(WalletError::NotImplemented)
	}
}

pub struct SolanaWallet {
	sender: Arc<dyn SolanaSender>,
	chain_id: ChainId,
	watcher: Arc<dyn ConfirmationWatcher>,
}

impl SolanaWallet {
	pub fn new(sender: Arc<dyn SolanaSender>, chain_id: ChainId, watcher: Arc<dyn ConfirmationWatcher>) -> Self {
		Self {
			sender,
			chain_id,
			watcher,
		}
	}

	/// Confirms through the watcher `confirmations` holds for `chain_id`.
	pub fn from_service(
		sender: Arc<dyn SolanaSender>,
		chain_id: ChainId,
		confirmations: &ConfirmationService,
	) -> Result<Self, WalletError> {
		let watcher = confirmations
			.watcher(chain_id)
			.ok_or(ConfirmationError::UnsupportedChain(chain_id))?;
		Ok(Self::new(sender, chain_id, watcher))
	}
}

#[async_trait]
impl WalletAdapter for SolanaWallet {
	fn vm_type(&self) -> VmType {
		VmType::Svm
	}

	async fn address(&self) -> Result<String, WalletError> {
		Ok(self.sender.address())
	}

	async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(self.chain_id)
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		if chain_id == self.chain_id {
			Ok(())
		} else {
			Err(WalletError::NotImplemented)
		}
	}

	async fn handle_sign_message_step(&self, _chain_id: ChainId, item: &StepItem) -> Result<String, WalletError> {
		match &item.data.sign {
			Some(SignData::Eip191 { message }) => self.sender.sign_message(message.as_bytes()).await,
			Some(SignData::Eip712 { .. }) => Err(WalletError::NotImplemented),
			None => Err(WalletError::InvalidPayload(
				"Signature item has no sign data".to_string(),
			)),
		}
	}

	async fn handle_send_transaction_step(
		&self,
		chain_id: ChainId,
		item: &StepItem,
		step: &Step,
	) -> Result<SentTransaction, WalletError> {
		let instructions = item
			.data
			.instructions
			.as_deref()
			.ok_or_else(|| WalletError::InvalidPayload("Transaction item has no instructions".to_string()))?;
		let lookup_tables = item
			.data
			.address_lookup_table_addresses
			.clone()
			.unwrap_or_default();

		let signature = self
			.sender
			.send_instructions(instructions, &lookup_tables)
			.await?;
		info!(chain_id, step = %step.id, signature = %signature, "Submitted Solana transaction");
		Ok(SentTransaction::hash(signature))
	}

	async fn handle_confirm_transaction_step(&self, tx_hash: &str, _chain_id: ChainId) -> Result<Receipt, WalletError> {
		Ok(self.watcher.wait_for_confirmation(tx_hash).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relay_config::{ChainConfig, RelayConfig};
	use relay_types::{ItemData, StepKind, SOLANA_CHAIN_ID};
	use std::sync::Mutex;

	#[derive(Default)]
	struct RecordingSender {
		sent: Mutex<Vec<usize>>,
	}

	#[async_trait]
	impl SolanaSender for RecordingSender {
		fn address(&self) -> String {
			"9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string()
		}

		async fn send_instructions(&self, instructions: &[Value], _tables: &[String]) -> Result<String, WalletError> {
			self.sent.lock().unwrap().push(instructions.len());
			Ok("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb".to_string())
		}
	}

	fn wallet(sender: Arc<RecordingSender>) -> SolanaWallet {
		let mut config = RelayConfig::with_base_url("https://api.relay.link");
		config.chains.insert(
			SOLANA_CHAIN_ID,
			ChainConfig {
				name: "Solana".to_string(),
				rpc_url: "http://127.0.0.1:1".to_string(),
				trace_url: None,
				vm_type: None,
				atomic_batch: false,
			},
		);
		let confirmations = ConfirmationService::from_config(&config).unwrap();
		SolanaWallet::from_service(sender, SOLANA_CHAIN_ID, &confirmations).unwrap()
	}

	#[tokio::test]
	async fn test_sends_instructions() {
		let sender = Arc::new(RecordingSender::default());
		let wallet = wallet(sender.clone());
		let item = StepItem::new(ItemData {
			instructions: Some(vec![serde_json::json!({"programId": "11111111111111111111111111111111"})]),
			..Default::default()
		});
		let step = Step {
			id: "deposit".to_string(),
			kind: StepKind::Transaction,
			action: String::new(),
			description: String::new(),
			request_id: None,
			deposit_address: None,
			items: vec![item.clone()],
			error: None,
			error_data: None,
		};

		let sent = wallet
			.handle_send_transaction_step(SOLANA_CHAIN_ID, &item, &step)
			.await
			.unwrap();
		assert!(!sent.is_batch);
		assert_eq!(*sender.sent.lock().unwrap(), vec![1]);
	}

	#[test]
	fn test_from_service_requires_watcher() {
		let result = SolanaWallet::from_service(
			Arc::new(RecordingSender::default()),
			SOLANA_CHAIN_ID,
			&ConfirmationService::new(),
		);
		assert!(matches!(
			result,
			Err(WalletError::Confirmation(ConfirmationError::UnsupportedChain(SOLANA_CHAIN_ID)))
		));
	}

	#[tokio::test]
	async fn test_cannot_switch_chain() {
		let wallet = wallet(Arc::new(RecordingSender::default()));
		assert!(wallet.switch_chain(SOLANA_CHAIN_ID).await.is_ok());
		assert!(wallet.switch_chain(1).await.unwrap_err().is_not_implemented());
	}
}
