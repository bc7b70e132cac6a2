//! # Relay status
//!
//! HTTP access to the relay service and completion tracking for submitted
//! requests.
//!
//! ## Key Components
//!
//! - [`RelayApiClient`] - quote, status, app-fee, signature post and check endpoints
//! - [`StatusPoller`] - waits for a terminal request status over pull and push transports
//! - [`StatusSocket`] - websocket subscription to `request.status.updated`
//! - [`Attempts`] / [`repeat_until_ok`] / [`retry_transient`] - bounded fixed-interval retries

use relay_types::ExecutionError;
use thiserror::Error;

pub mod client;
pub mod poller;
pub mod retry;
pub mod socket;
pub mod types;

pub use client::RelayApiClient;
pub use poller::StatusPoller;
pub use retry::{repeat_until_ok, retry_transient, Attempts};
pub use socket::StatusSocket;
pub use types::{AppFeeBalances, CallTx, ClaimAppFeesRequest, QuoteRequest, TradeType};

#[derive(Debug, Error)]
pub enum StatusError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("API error {status} from {endpoint}: {body}")]
	Api {
		status: u16,
		body: String,
		endpoint: String,
	},

	#[error("Invalid response from {endpoint}: {message}")]
	InvalidResponse { endpoint: String, message: String },

	#[error("Invalid URL: {0}")]
	InvalidUrl(String),

	#[error("Invalid request: {0}")]
	InvalidRequest(String),

	#[error("Websocket error: {0}")]
	Socket(String),

	#[error("Failed to get an ok response after {attempts} attempt(s), aborting")]
	RetriesExhausted { attempts: u32 },

	#[error("Solver status for request {request_id} not final after {attempts} attempt(s)")]
	Timeout { request_id: String, attempts: u32 },
}

impl StatusError {
	/// Failures worth another poll. Client errors other than 404 and 429 are
	/// final; a 404 usually means the service has not indexed the request yet.
	pub fn is_retryable(&self) -> bool {
		match self {
			StatusError::Http(_) | StatusError::InvalidResponse { .. } | StatusError::Socket(_) => true,
			StatusError::Api { status, .. } => *status == 404 || *status == 429 || *status >= 500,
			_ => false,
		}
	}
}

impl From<StatusError> for ExecutionError {
	fn from(err: StatusError) -> Self {
		match err {
			StatusError::Api {
				status,
				body,
				endpoint,
			} => ExecutionError::Api {
				status,
				body,
				endpoint,
			},
			StatusError::Timeout {
				request_id,
				attempts,
			} => ExecutionError::SolverStatusTimeout {
				request_id,
				attempts,
			},
			StatusError::InvalidUrl(msg) => ExecutionError::Configuration(format!("Invalid URL: {}", msg)),
			StatusError::InvalidRequest(msg) => ExecutionError::Validation(msg),
			other => ExecutionError::Network(other.to_string()),
		}
	}
}
