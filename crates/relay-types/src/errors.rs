//! Error taxonomy for quote execution.

use serde_json::{json, Value};
use thiserror::Error;

use crate::phase::InvalidTransition;
use crate::receipt::Receipt;

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Every way a quote execution can fail.
///
/// Component crates keep their own error enums and convert into this one at
/// the engine boundary.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Wallet error: {0}")]
	Wallet(String),

	#[error("User rejected the request: {0}")]
	WalletRejected(String),

	#[error("Deposit transaction {tx_hash} not confirmed after {attempts} attempt(s)")]
	DepositTransactionTimeout { tx_hash: String, attempts: u32 },

	#[error("Solver status for request {request_id} not final after {attempts} attempt(s)")]
	SolverStatusTimeout { request_id: String, attempts: u32 },

	#[error("Transaction confirmation failed: {message}")]
	TransactionConfirmation {
		message: String,
		receipt: Option<Box<Receipt>>,
		trace: Option<Value>,
	},

	#[error("API error {status} from {endpoint}: {body}")]
	Api {
		status: u16,
		body: String,
		endpoint: String,
	},

	#[error("Network error: {0}")]
	Network(String),

	#[error("Request failed{}", fmt_request_failed(.request_id, .details))]
	RequestFailed {
		request_id: Option<String>,
		details: Option<String>,
	},

	#[error("User confirmation required: {0}")]
	ConfirmationRequired(String),

	#[error("Execution cancelled")]
	Cancelled,

	#[error(transparent)]
	State(#[from] InvalidTransition),
}

fn fmt_request_failed(request_id: &Option<String>, details: &Option<String>) -> String {
	let mut out = String::new();
	if let Some(id) = request_id {
		out.push_str(&format!(" ({})", id));
	}
	if let Some(details) = details {
		out.push_str(&format!(": {}", details));
	}
	out
}

impl ExecutionError {
	/// Whether retrying the failed operation may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			ExecutionError::Network(_) => true,
			ExecutionError::Api { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}

	/// Short machine-readable name of the variant.
	pub fn kind(&self) -> &'static str {
		match self {
			ExecutionError::Configuration(_) => "configuration",
			ExecutionError::Validation(_) => "validation",
			ExecutionError::Wallet(_) => "wallet",
			ExecutionError::WalletRejected(_) => "wallet_rejected",
			ExecutionError::DepositTransactionTimeout { .. } => "deposit_transaction_timeout",
			ExecutionError::SolverStatusTimeout { .. } => "solver_status_timeout",
			ExecutionError::TransactionConfirmation { .. } => "transaction_confirmation",
			ExecutionError::Api { .. } => "api",
			ExecutionError::Network(_) => "network",
			ExecutionError::RequestFailed { .. } => "request_failed",
			ExecutionError::ConfirmationRequired(_) => "confirmation_required",
			ExecutionError::Cancelled => "cancelled",
			ExecutionError::State(_) => "state",
		}
	}

	/// Structured payload stored in an item's `errorData`.
	pub fn error_data(&self) -> Value {
		let mut data = match self {
			ExecutionError::DepositTransactionTimeout { tx_hash, attempts } => {
				json!({ "txHash": tx_hash, "attempts": attempts })
			}
			ExecutionError::SolverStatusTimeout {
				request_id,
				attempts,
			} => json!({ "requestId": request_id, "attempts": attempts }),
			ExecutionError::TransactionConfirmation { receipt, trace, .. } => {
				json!({ "receipt": receipt, "trace": trace })
			}
			ExecutionError::Api {
				status,
				body,
				endpoint,
			} => json!({ "status": status, "body": body, "endpoint": endpoint }),
			ExecutionError::RequestFailed {
				request_id,
				details,
			} => json!({ "requestId": request_id, "details": details }),
			_ => json!({}),
		};
		data["kind"] = Value::String(self.kind().to_string());
		data["message"] = Value::String(self.to_string());
		data
	}
}
