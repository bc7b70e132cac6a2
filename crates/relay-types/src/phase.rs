//! Per-item execution phases.
//!
//! The engine drives every item through
//! `Pending -> Signing | Sending -> Submitted -> Confirming -> Complete`.
//! `Error` is reachable from every non-terminal phase and `Refunded` from
//! `Submitted` and `Confirming` (deposit-style flows where the solver
//! returns the funds).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPhase {
	#[default]
	Pending,
	Signing,
	Sending,
	Submitted,
	Confirming,
	Complete,
	Refunded,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid item transition from {from} to {to}")]
pub struct InvalidTransition {
	pub from: ItemPhase,
	pub to: ItemPhase,
}

impl ItemPhase {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			ItemPhase::Complete | ItemPhase::Refunded | ItemPhase::Error
		)
	}

	pub fn can_transition_to(&self, next: ItemPhase) -> bool {
		use ItemPhase::*;

		if *self == next {
			// Re-entering the same phase happens on retries of a poll loop.
			return !self.is_terminal() || next == Complete;
		}

		match (self, next) {
			(Pending, Signing | Sending) => true,
			(Signing | Sending, Submitted) => true,
			// Signature items without a check endpoint complete right after posting.
			(Submitted, Confirming | Complete | Refunded) => true,
			(Confirming, Complete | Refunded) => true,
			// Items already submitted by an earlier run resume at confirmation.
			(Pending, Confirming) => true,
			(from, Error) => !from.is_terminal(),
			_ => false,
		}
	}

	/// Validates and returns the next phase.
	pub fn advance(self, next: ItemPhase) -> Result<ItemPhase, InvalidTransition> {
		if self.can_transition_to(next) {
			Ok(next)
		} else {
			Err(InvalidTransition {
				from: self,
				to: next,
			})
		}
	}
}

impl fmt::Display for ItemPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ItemPhase::Pending => "pending",
			ItemPhase::Signing => "signing",
			ItemPhase::Sending => "sending",
			ItemPhase::Submitted => "submitted",
			ItemPhase::Confirming => "confirming",
			ItemPhase::Complete => "complete",
			ItemPhase::Refunded => "refunded",
			ItemPhase::Error => "error",
		};
		f.write_str(name)
	}
}
