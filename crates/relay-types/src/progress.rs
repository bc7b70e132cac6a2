//! Progress snapshots published by the engine.

use serde::Serialize;

use crate::quote::{BreakdownEntry, Fees, Quote, QuoteDetails, Step, StepItem, TxHashEntry};

/// Immutable view of an execution after a state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
	pub steps: Vec<Step>,
	pub fees: Option<Fees>,
	pub breakdown: Option<Vec<BreakdownEntry>>,
	pub details: Option<QuoteDetails>,
	pub current_step: Option<Step>,
	pub current_step_item: Option<StepItem>,
	pub tx_hashes: Vec<TxHashEntry>,
	pub error: Option<String>,
	pub refunded: bool,
}

impl ProgressSnapshot {
	pub fn from_quote(quote: &Quote, error: Option<String>) -> Self {
		let (current_step, current_step_item) = match current_position(&quote.steps) {
			Some((s, i)) => (
				Some(quote.steps[s].clone()),
				Some(quote.steps[s].items[i].clone()),
			),
			None => (None, None),
		};

		Self {
			steps: quote.steps.clone(),
			fees: quote.fees.clone(),
			breakdown: quote.breakdown.clone(),
			details: quote.details.clone(),
			current_step,
			current_step_item,
			tx_hashes: aggregate_tx_hashes(&quote.steps),
			error,
			refunded: quote.refunded,
		}
	}

	pub fn is_complete(&self) -> bool {
		self.current_step_item.is_none() && self.error.is_none()
	}
}

/// Scans steps top to bottom and items in order, stopping at the first
/// incomplete item.
pub fn current_position(steps: &[Step]) -> Option<(usize, usize)> {
	steps.iter().enumerate().find_map(|(s, step)| {
		step.items
			.iter()
			.position(|item| !item.is_complete())
			.map(|i| (s, i))
	})
}

/// All transaction identifiers recorded on the quote, in step order.
pub fn aggregate_tx_hashes(steps: &[Step]) -> Vec<TxHashEntry> {
	let mut out: Vec<TxHashEntry> = Vec::new();
	for entry in steps
		.iter()
		.flat_map(|s| s.items.iter())
		.flat_map(|i| i.tx_hashes.iter())
	{
		if !out.contains(entry) {
			out.push(entry.clone());
		}
	}
	out
}
