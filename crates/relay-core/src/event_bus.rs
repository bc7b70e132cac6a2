//! Broadcast channel for progress snapshots.
//!
//! The engine reports progress through a single callback. [`ProgressBus`]
//! turns that callback into a broadcast channel so that several consumers (a
//! CLI renderer, a log sink, a test) can follow the same execution.

use crate::engine::ProgressCallback;
use relay_types::ProgressSnapshot;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fan-out of [`ProgressSnapshot`]s to any number of subscribers.
///
/// Slow subscribers lag rather than block the engine: once `capacity`
/// snapshots are buffered the oldest are dropped for that subscriber.
#[derive(Clone)]
pub struct ProgressBus {
	sender: broadcast::Sender<ProgressSnapshot>,
}

impl ProgressBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribers only see snapshots published after they subscribed.
	pub fn subscribe(&self) -> broadcast::Receiver<ProgressSnapshot> {
		self.sender.subscribe()
	}

	/// Publishes a snapshot. Returns the number of subscribers reached.
	pub fn publish(&self, snapshot: ProgressSnapshot) -> usize {
		// no subscribers is not an error here
		self.sender.send(snapshot).unwrap_or(0)
	}

	/// A callback suitable for [`crate::ExecuteOptions::on_progress`].
	pub fn callback(&self) -> ProgressCallback {
		let bus = self.clone();
		Arc::new(move |snapshot| {
			bus.publish(snapshot);
		})
	}
}

impl Default for ProgressBus {
	fn default() -> Self {
		Self::new(256)
	}
}
