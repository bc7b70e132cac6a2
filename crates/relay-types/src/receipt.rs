//! VM-specific confirmation receipts.

use serde::{Deserialize, Serialize};

use crate::chains::ChainId;

/// Receipt returned by a confirmation watcher once a transaction is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "vm", rename_all = "lowercase")]
pub enum Receipt {
	Evm(EvmReceipt),
	Svm(SvmReceipt),
	Sui(SuiReceipt),
	/// Receipt of an EIP-5792 call bundle.
	Batch(BatchReceipt),
}

impl Receipt {
	/// Transaction hashes covered by the receipt.
	pub fn tx_hashes(&self) -> Vec<String> {
		match self {
			Receipt::Evm(r) => vec![r.tx_hash.clone()],
			Receipt::Svm(r) => vec![r.signature.clone()],
			Receipt::Sui(r) => vec![r.digest.clone()],
			Receipt::Batch(r) => r.tx_hashes.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmReceipt {
	pub tx_hash: String,
	pub chain_id: ChainId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub block_number: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub block_hash: Option<String>,
	pub gas_used: u64,
	/// `false` when the transaction reverted.
	pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvmReceipt {
	pub signature: String,
	pub slot: u64,
	pub confirmation_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiReceipt {
	pub digest: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub checkpoint: Option<String>,
	pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceipt {
	pub id: String,
	pub chain_id: ChainId,
	pub status: u64,
	#[serde(default)]
	pub tx_hashes: Vec<String>,
}
