//! Minimal JSON-RPC 2.0 client for chains without an alloy provider.

use crate::ConfirmationError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
	result: Option<T>,
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
	pub code: i64,
	pub message: String,
}

/// Error returned by a JSON-RPC call: either the transport failed or the
/// node answered with an error object.
#[derive(Debug)]
pub enum RpcFailure {
	Transport(String),
	Node(RpcErrorObject),
}

impl From<RpcFailure> for ConfirmationError {
	fn from(err: RpcFailure) -> Self {
		match err {
			RpcFailure::Transport(msg) => ConfirmationError::Network(msg),
			RpcFailure::Node(e) => ConfirmationError::Network(format!("RPC error {}: {}", e.code, e.message)),
		}
	}
}

pub struct JsonRpcClient {
	http: reqwest::Client,
	url: String,
	next_id: AtomicU64,
}

impl JsonRpcClient {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			http: reqwest::Client::new(),
			url: url.into(),
			next_id: AtomicU64::new(1),
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, RpcFailure> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let body = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		let response = self
			.http
			.post(&self.url)
			.json(&body)
			.send()
			.await
			.map_err(|e| RpcFailure::Transport(format!("{} request failed: {}", method, e)))?;

		if !response.status().is_success() {
			return Err(RpcFailure::Transport(format!(
				"{} returned HTTP {}",
				method,
				response.status()
			)));
		}

		let parsed: RpcResponse<T> = response
			.json()
			.await
			.map_err(|e| RpcFailure::Transport(format!("{} response invalid: {}", method, e)))?;

		match parsed.error {
			Some(err) => Err(RpcFailure::Node(err)),
			None => Ok(parsed.result),
		}
	}
}
