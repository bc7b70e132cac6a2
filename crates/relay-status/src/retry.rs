//! Bounded fixed-interval retries.

use crate::StatusError;
use relay_types::ExecutionError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt counter of a bounded fixed-interval loop.
///
/// [`Attempts::next`] yields attempt numbers `1..=max_attempts`, sleeping
/// `interval` before every attempt but the first.
#[derive(Debug, Clone)]
pub struct Attempts {
	max_attempts: u32,
	interval: Duration,
	attempt: u32,
}

impl Attempts {
	pub fn new(max_attempts: u32, interval: Duration) -> Self {
		Self {
			max_attempts,
			interval,
			attempt: 0,
		}
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	pub async fn next(&mut self) -> Option<u32> {
		if self.attempt >= self.max_attempts {
			return None;
		}
		if self.attempt > 0 {
			tokio::time::sleep(self.interval).await;
		}
		self.attempt += 1;
		Some(self.attempt)
	}
}

/// Calls `f` until it reports success, at most `max_attempts` times with
/// `interval` between attempts.
pub async fn repeat_until_ok<F, Fut>(max_attempts: u32, interval: Duration, mut f: F) -> Result<(), StatusError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = bool>,
{
	let mut attempts = Attempts::new(max_attempts, interval);
	while let Some(attempt) = attempts.next().await {
		if f().await {
			debug!(attempt, "Got an ok response");
			return Ok(());
		}
	}

	Err(StatusError::RetriesExhausted {
		attempts: max_attempts,
	})
}

/// Runs `op` again while it fails with a transient error, up to
/// `max_attempts` runs in total. The last error is returned unchanged.
pub async fn retry_transient<T, F, Fut>(max_attempts: u32, interval: Duration, mut op: F) -> Result<T, ExecutionError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, ExecutionError>>,
{
	let max_attempts = max_attempts.max(1);
	let mut attempt = 1;
	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(e) if e.is_transient() && attempt < max_attempts => {
				warn!(attempt, max_attempts, error = %e, "Transient failure, retrying");
				attempt += 1;
				tokio::time::sleep(interval).await;
			}
			Err(e) => return Err(e),
		}
	}
}
