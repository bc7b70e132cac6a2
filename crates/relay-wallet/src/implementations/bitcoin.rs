//! Bitcoin PSBT wallet.
//!
//! Bitcoin wallets sign and broadcast PSBTs and nothing else. Message
//! signing, chain switching and confirmation are not implemented, which sends
//! the engine to the relay status endpoint for completion.

use crate::{SentTransaction, WalletAdapter, WalletError};
use async_trait::async_trait;
use relay_types::{ChainId, Receipt, Step, StepItem, VmType, BITCOIN_CHAIN_ID};
use tracing::info;

#[async_trait]
pub trait PsbtSigner: Send + Sync {
	fn address(&self) -> String;

	/// Signs the base64 PSBT, broadcasts it and returns the txid.
	async fn sign_and_broadcast(&self, psbt: &str) -> Result<String, WalletError>;
}

pub struct BitcoinWallet<S> {
	signer: S,
}

impl<S: PsbtSigner> BitcoinWallet<S> {
	pub fn new(signer: S) -> Self {
		Self { signer }
	}
}

#[async_trait]
impl<S: PsbtSigner> WalletAdapter for BitcoinWallet<S> {
	fn vm_type(&self) -> VmType {
		VmType::Bvm
	}

	async fn address(&self) -> Result<String, WalletError> {
		Ok(self.signer.address())
	}

	async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(BITCOIN_CHAIN_ID)
	}

	async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), WalletError> {
		Err(WalletError::NotImplemented)
	}

	async fn handle_sign_message_step(&self, _chain_id: ChainId, _item: &StepItem) -> Result<String, WalletError> {
		Err(WalletError::NotImplemented)
	}

	async fn handle_send_transaction_step(
		&self,
		chain_id: ChainId,
		item: &StepItem,
		step: &Step,
	) -> Result<SentTransaction, WalletError> {
		let psbt = item
			.data
			.psbt
			.as_deref()
			.ok_or_else(|| WalletError::InvalidPayload("Transaction item has no psbt".to_string()))?;

		let txid = self.signer.sign_and_broadcast(psbt).await?;
		info!(chain_id, step = %step.id, txid = %txid, "Broadcast PSBT");
		Ok(SentTransaction::hash(txid))
	}

	async fn handle_confirm_transaction_step(&self, _tx_hash: &str, _chain_id: ChainId) -> Result<Receipt, WalletError> {
		Err(WalletError::NotImplemented)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct StaticSigner;

	#[async_trait]
	impl PsbtSigner for StaticSigner {
		fn address(&self) -> String {
			"bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq".to_string()
		}

		async fn sign_and_broadcast(&self, _psbt: &str) -> Result<String, WalletError> {
			Ok("f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16".to_string())
		}
	}

	#[tokio::test]
	async fn test_confirm_is_not_implemented() {
		let wallet = BitcoinWallet::new(StaticSigner);
		let err = wallet
			.handle_confirm_transaction_step("f4184fc5", BITCOIN_CHAIN_ID)
			.await
			.unwrap_err();
		assert!(err.is_not_implemented());
		assert_eq!(err.to_string(), "Not implemented");
	}

	#[tokio::test]
	async fn test_sign_and_switch_are_not_implemented() {
		let wallet = BitcoinWallet::new(StaticSigner);
		assert!(wallet.switch_chain(1).await.unwrap_err().is_not_implemented());
		assert!(wallet
			.handle_sign_message_step(BITCOIN_CHAIN_ID, &StepItem::default())
			.await
			.unwrap_err()
			.is_not_implemented());
		assert!(wallet.is_eoa(BITCOIN_CHAIN_ID).await.unwrap_err().is_not_implemented());
	}
}
