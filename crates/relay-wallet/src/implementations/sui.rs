//! Sui wallet over an external transaction signer.

use crate::{SentTransaction, WalletAdapter, WalletError};
use async_trait::async_trait;
use relay_confirm::{ConfirmationError, ConfirmationService, ConfirmationWatcher};
use relay_types::{ChainId, Receipt, SignData, Step, StepItem, VmType, SUI_CHAIN_ID};
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait SuiSigner: Send + Sync {
	fn address(&self) -> String;

	/// Signs and executes base64 BCS transaction bytes, returning the digest.
	async fn sign_and_execute(&self, tx_bytes: &str) -> Result<String, WalletError>;

	async fn sign_personal_message(&self, _message: &[u8]) -> Result<String, WalletError> {
		Err(WalletError::NotImplemented)
	}
}

pub struct SuiWallet {
	signer: Arc<dyn SuiSigner>,
	watcher: Arc<dyn ConfirmationWatcher>,
}

impl SuiWallet {
	pub fn new(signer: Arc<dyn SuiSigner>, watcher: Arc<dyn ConfirmationWatcher>) -> Self {
		Self { signer, watcher }
	}

	pub fn from_service(signer: Arc<dyn SuiSigner>, confirmations: &ConfirmationService) -> Result<Self, WalletError> {
		let watcher = confirmations
			.watcher(SUI_CHAIN_ID)
			.ok_or(ConfirmationError::UnsupportedChain(SUI_CHAIN_ID))?;
		Ok(Self::new(signer, watcher))
	}
}

#[async_trait]
impl WalletAdapter for SuiWallet {
	fn vm_type(&self) -> VmType {
		VmType::Suivm
	}

	async fn address(&self) -> Result<String, WalletError> {
		Ok(self.signer.address())
	}

	async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(SUI_CHAIN_ID)
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		if chain_id == SUI_CHAIN_ID {
			Ok(())
		} else {
			Err(WalletError::NotImplemented)
		}
	}

	async fn handle_sign_message_step(&self, _chain_id: ChainId, item: &StepItem) -> Result<String, WalletError> {
		match &item.data.sign {
			Some(SignData::Eip191 { message }) => self.signer.sign_personal_message(message.as_bytes()).await,
			_ => Err(WalletError::NotImplemented),
		}
	}

	async fn handle_send_transaction_step(
		&self,
		chain_id: ChainId,
		item: &StepItem,
		step: &Step,
	) -> Result<SentTransaction, WalletError> {
		let tx_bytes = item
			.data
			.data
			.as_deref()
			.ok_or_else(|| WalletError::InvalidPayload("Transaction item has no transaction bytes".to_string()))?;

		let digest = self.signer.sign_and_execute(tx_bytes).await?;
		info!(chain_id, step = %step.id, digest = %digest, "Executed Sui transaction");
		Ok(SentTransaction::hash(digest))
	}

	async fn handle_confirm_transaction_step(&self, tx_hash: &str, _chain_id: ChainId) -> Result<Receipt, WalletError> {
		Ok(self.watcher.wait_for_confirmation(tx_hash).await?)
	}
}
