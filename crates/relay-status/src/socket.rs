//! Websocket push channel for request status updates.
//!
//! One connection per subscription. The connection task forwards every
//! `request.status.updated` message for the subscribed request id and ends
//! when the socket closes or the subscription is dropped.

use crate::StatusError;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use relay_config::ApiConfig;
use relay_types::StatusResponse;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info};

pub const STATUS_EVENT: &str = "request.status.updated";

/// Upper bound on the websocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SocketMessage {
	event: Option<String>,
	data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct StatusSocket {
	url: String,
	subscriptions: Arc<DashMap<String, JoinHandle<()>>>,
}

impl StatusSocket {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			subscriptions: Arc::new(DashMap::new()),
		}
	}

	/// A socket for the configured endpoint, if push updates are enabled.
	pub fn from_config(config: &ApiConfig) -> Option<Self> {
		match (&config.websocket_url, config.websocket_enabled) {
			(Some(url), true) => Some(Self::new(url.clone())),
			_ => None,
		}
	}

	pub fn active_subscriptions(&self) -> usize {
		self.subscriptions.len()
	}

	/// Opens a connection and subscribes to updates for `request_id`.
	pub async fn subscribe(&self, request_id: &str) -> Result<mpsc::UnboundedReceiver<StatusResponse>, StatusError> {
		let (stream, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str()))
			.await
			.map_err(|_| StatusError::Socket(format!("Connection to {} timed out", self.url)))?
			.map_err(|e| StatusError::Socket(e.to_string()))?;
		let (mut write, mut read) = stream.split();

		let subscribe = json!({
			"type": "subscribe",
			"event": STATUS_EVENT,
			"filters": { "id": request_id },
		});
		write
			.send(Message::Text(subscribe.to_string().into()))
			.await
			.map_err(|e| StatusError::Socket(e.to_string()))?;
		info!(request_id, "Subscribed to status updates");

		let (tx, rx) = mpsc::unbounded_channel();
		let id = request_id.to_string();
		let handle = tokio::spawn(async move {
			// dropping the sink closes the connection
			let _write = write;
			while let Some(message) = read.next().await {
				let text = match message {
					Ok(Message::Text(text)) => text,
					Ok(Message::Close(_)) => break,
					Ok(_) => continue,
					Err(e) => {
						debug!(request_id = %id, error = %e, "Status socket failed");
						break;
					}
				};
				if let Some(update) = parse_update(text.as_str(), &id) {
					if tx.send(update).is_err() {
						break;
					}
				}
			}
		});

		if let Some(previous) = self.subscriptions.insert(request_id.to_string(), handle) {
			previous.abort();
		}
		Ok(rx)
	}

	pub fn unsubscribe(&self, request_id: &str) {
		if let Some((_, handle)) = self.subscriptions.remove(request_id) {
			handle.abort();
		}
	}
}

/// Extracts the status payload of a message addressed to `request_id`.
fn parse_update(text: &str, request_id: &str) -> Option<StatusResponse> {
	let message: SocketMessage = serde_json::from_str(text).ok()?;
	if message.event.as_deref() != Some(STATUS_EVENT) {
		return None;
	}
	let data = message.data?;
	let id = data
		.get("id")
		.or_else(|| data.get("requestId"))
		.and_then(Value::as_str);
	if id.is_some_and(|id| !id.eq_ignore_ascii_case(request_id)) {
		return None;
	}
	serde_json::from_value(data).ok()
}
