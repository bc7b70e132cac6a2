//! Remote request status as reported by the relay service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chains::ChainId;
use crate::serde_helpers::chain_id_lenient;

/// Normalized status of a relay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
	Pending,
	Waiting,
	Delayed,
	Received,
	Submitted,
	Success,
	Failure,
	#[serde(alias = "refunded", alias = "fallback")]
	Refund,
	/// Any status string this client does not know. Never terminal.
	#[serde(other)]
	Unknown,
}

impl RequestStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			RequestStatus::Success | RequestStatus::Failure | RequestStatus::Refund
		)
	}
}

impl fmt::Display for RequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			RequestStatus::Pending => "pending",
			RequestStatus::Waiting => "waiting",
			RequestStatus::Delayed => "delayed",
			RequestStatus::Received => "received",
			RequestStatus::Submitted => "submitted",
			RequestStatus::Success => "success",
			RequestStatus::Failure => "failure",
			RequestStatus::Refund => "refund",
			RequestStatus::Unknown => "unknown",
		};
		f.write_str(s)
	}
}

/// Payload of the status endpoint, the check endpoints and websocket
/// `request.status.updated` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
	pub status: RequestStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
	#[serde(default)]
	pub in_tx_hashes: Vec<String>,
	#[serde(default)]
	pub tx_hashes: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<u64>,
	#[serde(
		default,
		deserialize_with = "chain_id_lenient",
		skip_serializing_if = "Option::is_none"
	)]
	pub origin_chain_id: Option<ChainId>,
	#[serde(
		default,
		deserialize_with = "chain_id_lenient",
		skip_serializing_if = "Option::is_none"
	)]
	pub destination_chain_id: Option<ChainId>,
}
