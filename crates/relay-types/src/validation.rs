//! Pre-flight validation of quotes.
//!
//! Runs before any wallet or network interaction.

use crate::chains::VmType;
use crate::errors::ExecutionError;
use crate::quote::{Quote, StepKind};

/// Canonical burn address for a VM family.
pub fn dead_address(vm: VmType) -> &'static str {
	match vm {
		VmType::Evm | VmType::Hypevm => "0x000000000000000000000000000000000000dead",
		VmType::Svm => "CbKGgVKLJFb8bBrf58DnAkdryX6ubewVytn7X957YwNr",
		VmType::Bvm => "bc1q4vxn43l44h30nkluqfxd9eckf45vr2awz38lwa",
		VmType::Suivm => "0x000000000000000000000000000000000000000000000000000000000000dead",
		VmType::Tvm => "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb",
	}
}

const ALL_VMS: [VmType; 6] = [
	VmType::Evm,
	VmType::Svm,
	VmType::Bvm,
	VmType::Suivm,
	VmType::Tvm,
	VmType::Hypevm,
];

/// Whether `address` is the burn address of any VM family.
///
/// Hex addresses compare case-insensitively, base58 ones exactly.
pub fn is_dead_address(address: &str) -> bool {
	ALL_VMS.iter().any(|vm| {
		let dead = dead_address(*vm);
		if dead.starts_with("0x") || dead.starts_with("bc1") {
			dead.eq_ignore_ascii_case(address)
		} else {
			dead == address
		}
	})
}

/// Rejects quotes that must never reach a wallet.
pub fn validate_quote(quote: &Quote) -> Result<(), ExecutionError> {
	if let Some(recipient) = quote.recipient() {
		if is_dead_address(&recipient) {
			return Err(ExecutionError::Validation(format!(
				"Recipient {} is a dead address",
				recipient
			)));
		}
	}

	if quote.origin_chain_id().is_none() {
		return Err(ExecutionError::Validation(
			"Quote is missing an origin chain id".to_string(),
		));
	}

	for step in &quote.steps {
		if step.kind != StepKind::Transaction {
			continue;
		}
		for item in step.items.iter().filter(|i| !i.is_complete()) {
			if item.data.chain_id.is_none() {
				return Err(ExecutionError::Validation(format!(
					"Transaction item of step '{}' is missing a chain id",
					step.id
				)));
			}
		}
	}

	Ok(())
}
