//! Batch transaction preparer.
//!
//! An `approve` step followed by a `deposit` or `swap` step can be sent as a
//! single atomic call bundle. [`prepare_batch`] only describes the merge;
//! whether it is applied depends on the wallet's capabilities.

use relay_types::{BatchCall, ChainId, ItemStatus, ProgressState, Step, StepItem, StepKind};

const LEADING_STEP: &str = "approve";
const FOLLOWING_STEPS: [&str; 2] = ["deposit", "swap"];

fn incomplete(step: &Step) -> impl DoubleEndedIterator<Item = &StepItem> {
	step.items.iter().filter(|item| !item.is_complete())
}

/// Chain shared by every incomplete item of both steps, if there is one.
pub fn batch_chain_id(first: &Step, second: &Step) -> Option<ChainId> {
	let mut chains = incomplete(first)
		.chain(incomplete(second))
		.map(|item| item.data.chain_id);
	let chain_id = chains.next()??;
	chains
		.all(|c| c == Some(chain_id))
		.then_some(chain_id)
}

pub fn is_batchable(first: &Step, second: &Step) -> bool {
	first.id == LEADING_STEP
		&& FOLLOWING_STEPS.contains(&second.id.as_str())
		&& first.kind == StepKind::Transaction
		&& second.kind == StepKind::Transaction
		&& first.has_incomplete_items()
		&& second.has_incomplete_items()
		&& incomplete(first)
			.chain(incomplete(second))
			.all(|item| item.data.to.is_some() && item.data.calls.is_none())
		&& batch_chain_id(first, second).is_some()
}

/// Merges `first` and `second` into one step.
///
/// The merged step's items are `first`'s followed by `second`'s. The first
/// incomplete item (the leader) carries a `calls` payload covering every
/// incomplete item of both steps; all other incomplete items are pre-marked
/// complete. Returns `None` when the pair is not batchable.
pub fn prepare_batch(first: &Step, second: &Step) -> Option<Step> {
	if !is_batchable(first, second) {
		return None;
	}

	let calls: Vec<BatchCall> = incomplete(first)
		.chain(incomplete(second))
		.filter_map(|item| {
			Some(BatchCall {
				to: item.data.to.clone()?,
				data: item.data.data.clone(),
				value: item.data.value.clone(),
			})
		})
		.collect();
	let leader = first.first_incomplete_item()?;
	let follower_check = incomplete(second).rev().find_map(|item| item.check.clone());

	let mut items: Vec<StepItem> = first.items.iter().chain(second.items.iter()).cloned().collect();
	for (index, item) in items.iter_mut().enumerate() {
		if item.is_complete() {
			continue;
		}
		if index == leader {
			item.data.calls = Some(calls.clone());
			if item.check.is_none() {
				item.check = follower_check.clone();
			}
		} else {
			item.status = ItemStatus::Complete;
			item.progress_state = Some(ProgressState::Complete);
		}
	}

	Some(Step {
		id: second.id.clone(),
		kind: StepKind::Transaction,
		action: second.action.clone(),
		description: second.description.clone(),
		request_id: second.request_id.clone().or_else(|| first.request_id.clone()),
		deposit_address: second.deposit_address.clone(),
		items,
		error: None,
		error_data: None,
	})
}
