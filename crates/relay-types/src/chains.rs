//! Chain identifiers and virtual-machine families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric chain identifier as used by the relay service.
///
/// Non-EVM networks get synthetic identifiers assigned by the service.
pub type ChainId = u64;

pub const SOLANA_CHAIN_ID: ChainId = 792_703_809;
pub const ECLIPSE_CHAIN_ID: ChainId = 9_286_185;
pub const BITCOIN_CHAIN_ID: ChainId = 8_253_038;
pub const SUI_CHAIN_ID: ChainId = 103_665_049;
pub const TRON_CHAIN_ID: ChainId = 728_126_428;
pub const HYPERLIQUID_CHAIN_ID: ChainId = 1337;

/// Virtual-machine family of a chain.
///
/// Selects which signing and confirmation semantics apply to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmType {
	Evm,
	Svm,
	Bvm,
	Suivm,
	Tvm,
	Hypevm,
}

impl VmType {
	/// Resolves the VM family for a relay chain id. Unknown ids are EVM.
	pub fn for_chain(chain_id: ChainId) -> Self {
		match chain_id {
			SOLANA_CHAIN_ID | ECLIPSE_CHAIN_ID => VmType::Svm,
			BITCOIN_CHAIN_ID => VmType::Bvm,
			SUI_CHAIN_ID => VmType::Suivm,
			TRON_CHAIN_ID => VmType::Tvm,
			HYPERLIQUID_CHAIN_ID => VmType::Hypevm,
			_ => VmType::Evm,
		}
	}

	/// Whether finality can be observed from the client side.
	///
	/// Bitcoin finality is only ever observed through the relay service.
	pub fn has_local_confirmation(&self) -> bool {
		matches!(self, VmType::Evm | VmType::Svm | VmType::Suivm)
	}

	/// Whether wallets of this family can hold more than one chain.
	pub fn supports_chain_switching(&self) -> bool {
		matches!(self, VmType::Evm | VmType::Hypevm)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			VmType::Evm => "evm",
			VmType::Svm => "svm",
			VmType::Bvm => "bvm",
			VmType::Suivm => "suivm",
			VmType::Tvm => "tvm",
			VmType::Hypevm => "hypevm",
		}
	}
}

impl fmt::Display for VmType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for VmType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"evm" => Ok(VmType::Evm),
			"svm" => Ok(VmType::Svm),
			"bvm" => Ok(VmType::Bvm),
			"suivm" => Ok(VmType::Suivm),
			"tvm" => Ok(VmType::Tvm),
			"hypevm" => Ok(VmType::Hypevm),
			other => Err(format!("unknown vm type: {}", other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_vm_type_for_chain() {
		assert_eq!(VmType::for_chain(8453), VmType::Evm);
		assert_eq!(VmType::for_chain(SOLANA_CHAIN_ID), VmType::Svm);
		assert_eq!(VmType::for_chain(BITCOIN_CHAIN_ID), VmType::Bvm);
		assert_eq!(VmType::for_chain(SUI_CHAIN_ID), VmType::Suivm);
		assert_eq!(VmType::for_chain(HYPERLIQUID_CHAIN_ID), VmType::Hypevm);
	}

	#[test]
	fn test_vm_type_parsing() {
		assert_eq!("EVM".parse::<VmType>().unwrap(), VmType::Evm);
		assert_eq!("suivm".parse::<VmType>().unwrap(), VmType::Suivm);
		assert!("cosmos".parse::<VmType>().is_err());

		let json = serde_json::to_string(&VmType::Hypevm).unwrap();
		assert_eq!(json, "\"hypevm\"");
	}

	#[test]
	fn test_bitcoin_has_no_local_confirmation() {
		assert!(!VmType::Bvm.has_local_confirmation());
		assert!(VmType::Evm.has_local_confirmation());
		assert!(!VmType::Bvm.supports_chain_switching());
	}
}
