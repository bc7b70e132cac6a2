//! Remote status poller.
//!
//! Pull polling is the source of truth; the optional websocket only shortens
//! the wait. Whichever transport sees a terminal status first wins, and a
//! push channel that cannot be opened is ignored.

use crate::{Attempts, RelayApiClient, StatusError, StatusSocket};
use relay_config::PollingConfig;
use relay_types::{CheckDescriptor, StatusResponse};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct StatusPoller {
	client: RelayApiClient,
	interval: Duration,
	max_attempts: u32,
	socket: Option<Arc<StatusSocket>>,
}

impl StatusPoller {
	pub fn new(client: RelayApiClient, polling: &PollingConfig) -> Self {
		Self {
			client,
			interval: polling.interval(),
			max_attempts: polling.max_attempts.max(1),
			socket: None,
		}
	}

	pub fn with_socket(mut self, socket: Arc<StatusSocket>) -> Self {
		self.socket = Some(socket);
		self
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Calls `fetch` until it yields a terminal status, at most
	/// `max_attempts` times. `on_attempt` sees every attempt, with the status
	/// when the fetch succeeded.
	pub async fn poll<F, Fut, A>(&self, request_id: &str, mut fetch: F, mut on_attempt: A) -> Result<StatusResponse, StatusError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<StatusResponse, StatusError>>,
		A: FnMut(u32, Option<&StatusResponse>),
	{
		let mut attempts = Attempts::new(self.max_attempts, self.interval);
		while let Some(attempt) = attempts.next().await {
			match fetch().await {
				Ok(status) => {
					debug!(request_id, attempt, status = %status.status, "Polled request status");
					on_attempt(attempt, Some(&status));
					if status.status.is_terminal() {
						return Ok(status);
					}
				}
				Err(e) if e.is_retryable() => {
					warn!(request_id, attempt, error = %e, "Status poll failed");
					on_attempt(attempt, None);
				}
				Err(e) => return Err(e),
			}
		}

		Err(StatusError::Timeout {
			request_id: request_id.to_string(),
			attempts: self.max_attempts,
		})
	}

	/// Waits for the request to reach a terminal status on the status endpoint.
	pub async fn wait_for_status<A>(&self, request_id: &str, on_attempt: A) -> Result<StatusResponse, StatusError>
	where
		A: FnMut(u32, Option<&StatusResponse>),
	{
		let pull = self.poll(request_id, || self.client.get_status(request_id), on_attempt);
		self.race_with_push(Some(request_id), pull).await
	}

	/// Waits on an item's own check endpoint. Push updates are used when the
	/// step has a request id to subscribe to.
	pub async fn wait_for_check<A>(
		&self,
		request_id: Option<&str>,
		check: &CheckDescriptor,
		on_attempt: A,
	) -> Result<StatusResponse, StatusError>
	where
		A: FnMut(u32, Option<&StatusResponse>),
	{
		let label = request_id.unwrap_or(check.endpoint.as_str());
		let pull = self.poll(label, || self.client.check(check), on_attempt);
		self.race_with_push(request_id, pull).await
	}

	/// Runs `pull` to completion while a push subscription is opened
	/// alongside it. Pull starts immediately; the socket can only shorten the
	/// wait.
	async fn race_with_push<P>(&self, request_id: Option<&str>, pull: P) -> Result<StatusResponse, StatusError>
	where
		P: Future<Output = Result<StatusResponse, StatusError>>,
	{
		let (Some(socket), Some(request_id)) = (&self.socket, request_id) else {
			return pull.await;
		};

		let _subscription = Subscription {
			socket: socket.as_ref(),
			request_id,
		};
		let push = async {
			let mut updates = match socket.subscribe(request_id).await {
				Ok(updates) => updates,
				Err(e) => {
					debug!(request_id, error = %e, "Status push unavailable, polling only");
					return std::future::pending::<StatusResponse>().await;
				}
			};
			while let Some(update) = updates.recv().await {
				if update.status.is_terminal() {
					return update;
				}
			}
			// socket closed; leave it to the pull side
			std::future::pending::<StatusResponse>().await
		};

		tokio::select! {
			result = pull => result,
			update = push => {
				info!(request_id, status = %update.status, "Terminal status received over websocket");
				Ok(update)
			}
		}
	}
}

/// Unsubscribes when the wait ends, including when its future is dropped.
struct Subscription<'a> {
	socket: &'a StatusSocket,
	request_id: &'a str,
}

impl Drop for Subscription<'_> {
	fn drop(&mut self) {
		self.socket.unsubscribe(self.request_id);
	}
}
