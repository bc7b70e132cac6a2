//! Quote data model.
//!
//! A [`Quote`] is the execution plan returned by the relay service: an
//! ordered list of [`Step`]s, each made of [`StepItem`]s the wallet signs or
//! sends. The layout mirrors the service's camelCase JSON so quotes can be
//! deserialized straight from the HTTP response and handed back unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chains::ChainId;
use crate::phase::{InvalidTransition, ItemPhase};
use crate::serde_helpers::{chain_id_lenient, string_or_number};

/// Execution plan returned by the relay service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	#[serde(default)]
	pub steps: Vec<Step>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fees: Option<Fees>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub breakdown: Option<Vec<BreakdownEntry>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<QuoteDetails>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<QuoteError>>,
	#[serde(default)]
	pub refunded: bool,
	/// The HTTP request that produced this quote.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request: Option<RequestDescriptor>,
}

impl Quote {
	/// Origin chain of the quote, taken from the details or, failing that, from
	/// the first transaction item that declares one.
	pub fn origin_chain_id(&self) -> Option<ChainId> {
		self.details
			.as_ref()
			.and_then(|d| d.currency_in.as_ref())
			.and_then(|c| c.currency.as_ref())
			.map(|c| c.chain_id)
			.or_else(|| {
				self.request
					.as_ref()
					.and_then(|r| r.body.as_ref())
					.and_then(|b| b.get("originChainId"))
					.and_then(Value::as_u64)
			})
			.or_else(|| {
				self.steps
					.iter()
					.flat_map(|s| s.items.iter())
					.find_map(|i| i.data.chain_id)
			})
	}

	/// Recipient of the transfer as declared by the quote details or request.
	pub fn recipient(&self) -> Option<String> {
		self.details
			.as_ref()
			.and_then(|d| d.recipient.clone())
			.or_else(|| {
				self.request
					.as_ref()
					.and_then(|r| r.body.as_ref())
					.and_then(|b| b.get("recipient"))
					.and_then(Value::as_str)
					.map(str::to_string)
			})
	}

	pub fn is_split_route(&self) -> bool {
		self.details.as_ref().map(|d| d.split_route).unwrap_or(false)
	}

	pub fn is_complete(&self) -> bool {
		self.steps.iter().all(Step::is_complete)
	}

	/// Index of the first step that still has incomplete items.
	pub fn first_incomplete_step(&self) -> Option<usize> {
		self.steps.iter().position(|s| !s.is_complete())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relayer: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relayer_gas: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relayer_service: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app: Option<CurrencyAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
	#[serde(deserialize_with = "deserialize_chain_id")]
	pub chain_id: ChainId,
	pub address: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub symbol: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub decimals: Option<u8>,
}

fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<ChainId, D::Error>
where
	D: serde::Deserializer<'de>,
{
	chain_id_lenient(deserializer)?
		.ok_or_else(|| serde::de::Error::custom("missing chain id"))
}

/// An amount of some currency, as used by fees and quote details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency: Option<Currency>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub amount: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount_formatted: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount_usd: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
	#[serde(default, deserialize_with = "string_or_number")]
	pub value: Option<String>,
	#[serde(default)]
	pub time_estimate: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetails {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sender: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency_in: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency_out: Option<CurrencyAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_estimate: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rate: Option<String>,
	/// Set when the solver routes the order through more than one path.
	#[serde(default)]
	pub split_route: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteError {
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
	pub url: String,
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
	Transaction,
	Signature,
}

/// One unit of wallet interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
	pub id: String,
	pub kind: StepKind,
	#[serde(default)]
	pub action: String,
	#[serde(default)]
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deposit_address: Option<String>,
	#[serde(default)]
	pub items: Vec<StepItem>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_data: Option<Value>,
}

impl Step {
	pub fn is_complete(&self) -> bool {
		self.items.iter().all(|i| i.status == ItemStatus::Complete)
	}

	pub fn has_incomplete_items(&self) -> bool {
		!self.is_complete()
	}

	pub fn first_incomplete_item(&self) -> Option<usize> {
		self.items
			.iter()
			.position(|i| i.status == ItemStatus::Incomplete)
	}

	/// Chain targeted by the step's first item.
	pub fn chain_id(&self) -> Option<ChainId> {
		self.items.iter().find_map(|i| i.data.chain_id)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
	#[default]
	Incomplete,
	Complete,
}

/// Fine-grained progress of an item, as rendered by UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
	Signing,
	Posting,
	Confirming,
	Validating,
	ValidatingDelayed,
	Complete,
}

/// The atomic signable or sendable unit within a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepItem {
	#[serde(default)]
	pub status: ItemStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress_state: Option<ProgressState>,
	#[serde(default)]
	pub data: ItemData,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub check: Option<CheckDescriptor>,
	#[serde(default)]
	pub tx_hashes: Vec<TxHashEntry>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub internal_tx_hashes: Vec<TxHashEntry>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_data: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_data: Option<Vec<OrderData>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_ids: Option<Vec<String>>,
	/// Engine-side phase. Not part of the wire format.
	#[serde(skip)]
	pub phase: ItemPhase,
}

impl StepItem {
	pub fn new(data: ItemData) -> Self {
		Self {
			data,
			..Default::default()
		}
	}

	pub fn is_complete(&self) -> bool {
		self.status == ItemStatus::Complete
	}

	/// Current phase. Items that arrive already complete report `Complete`.
	pub fn current_phase(&self) -> ItemPhase {
		if self.is_complete() && !self.phase.is_terminal() {
			ItemPhase::Complete
		} else {
			self.phase
		}
	}

	/// Moves the item to `next`, keeping `status` and `progress_state` in
	/// step with the phase. `status` never leaves `complete` once set.
	pub fn transition(&mut self, kind: StepKind, next: ItemPhase) -> Result<(), InvalidTransition> {
		self.phase = self.current_phase().advance(next)?;

		let progress = match (kind, next) {
			(_, ItemPhase::Pending) | (_, ItemPhase::Error) => self.progress_state,
			(StepKind::Signature, ItemPhase::Signing | ItemPhase::Sending) => {
				Some(ProgressState::Signing)
			}
			(StepKind::Transaction, ItemPhase::Signing | ItemPhase::Sending) => {
				Some(ProgressState::Confirming)
			}
			(StepKind::Signature, ItemPhase::Submitted) => Some(ProgressState::Posting),
			(StepKind::Transaction, ItemPhase::Submitted) => Some(ProgressState::Validating),
			(_, ItemPhase::Confirming) => match self.progress_state {
				Some(ProgressState::ValidatingDelayed) => Some(ProgressState::ValidatingDelayed),
				_ => Some(ProgressState::Validating),
			},
			(_, ItemPhase::Complete) | (_, ItemPhase::Refunded) => Some(ProgressState::Complete),
		};
		self.progress_state = progress;

		if matches!(next, ItemPhase::Complete | ItemPhase::Refunded) {
			self.status = ItemStatus::Complete;
		}
		Ok(())
	}

	/// Flags a confirming item whose validation is taking longer than usual.
	pub fn mark_delayed(&mut self) {
		if !self.is_complete() {
			self.progress_state = Some(ProgressState::ValidatingDelayed);
		}
	}

	/// Records a new transaction identifier ahead of earlier attempts.
	///
	/// Identical entries are not duplicated; nothing is ever removed.
	pub fn record_tx_hash(&mut self, entry: TxHashEntry) {
		if !self.tx_hashes.contains(&entry) {
			self.tx_hashes.insert(0, entry);
		}
	}

	pub fn record_internal_tx_hash(&mut self, entry: TxHashEntry) {
		if !self.internal_tx_hashes.contains(&entry) {
			self.internal_tx_hashes.insert(0, entry);
		}
	}
}

/// Payload of an item, interpreted by the wallet adapter of the item's VM.
///
/// EVM transactions use `from`/`to`/`data`/`value` and the gas fields, batched
/// EVM calls use `calls`, Bitcoin uses `psbt`, Solana uses `instructions`, Sui
/// carries base64 transaction bytes in `data`. Signature items carry `sign`
/// and optionally `post`. Hyperliquid deposits carry `action`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub value: Option<String>,
	#[serde(
		default,
		deserialize_with = "chain_id_lenient",
		skip_serializing_if = "Option::is_none"
	)]
	pub chain_id: Option<ChainId>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub gas: Option<String>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub max_fee_per_gas: Option<String>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub max_priority_fee_per_gas: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub calls: Option<Vec<BatchCall>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub psbt: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub instructions: Option<Vec<Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_lookup_table_addresses: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sign: Option<SignData>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub post: Option<PostData>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<HyperliquidAction>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// A single call inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCall {
	pub to: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
	#[serde(
		default,
		deserialize_with = "string_or_number",
		skip_serializing_if = "Option::is_none"
	)]
	pub value: Option<String>,
}

/// Off-chain signing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
	tag = "signatureKind",
	rename_all = "lowercase",
	rename_all_fields = "camelCase"
)]
pub enum SignData {
	Eip191 {
		message: String,
	},
	Eip712 {
		domain: Value,
		types: Value,
		primary_type: String,
		value: Value,
	},
}

impl SignData {
	/// EIP-712 payload in the JSON shape accepted by typed-data signers.
	pub fn typed_data_json(&self) -> Option<Value> {
		match self {
			SignData::Eip712 {
				domain,
				types,
				primary_type,
				value,
			} => Some(serde_json::json!({
				"domain": domain,
				"types": types,
				"primaryType": primary_type,
				"message": value,
			})),
			SignData::Eip191 { .. } => None,
		}
	}
}

/// Where a produced signature must be posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostData {
	pub endpoint: String,
	#[serde(default = "default_post_method")]
	pub method: String,
	#[serde(default)]
	pub body: Value,
}

fn default_post_method() -> String {
	"POST".to_string()
}

/// Endpoint to poll for completion of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDescriptor {
	pub endpoint: String,
	#[serde(default = "default_check_method")]
	pub method: String,
}

fn default_check_method() -> String {
	"GET".to_string()
}

/// Hyperliquid exchange action carried by deposit items on Hyperliquid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperliquidAction {
	#[serde(rename = "type")]
	pub kind: String,
	pub parameters: HyperliquidParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperliquidParameters {
	pub destination: String,
	#[serde(deserialize_with = "deserialize_amount")]
	pub amount: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_dex: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub destination_dex: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from_sub_account: Option<String>,
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	string_or_number(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing amount"))
}

/// A transaction identifier recorded against an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHashEntry {
	pub tx_hash: String,
	pub chain_id: ChainId,
	/// Set when the identifier is a wallet batch id rather than a transaction hash.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub is_batch_tx: bool,
}

impl TxHashEntry {
	pub fn new(tx_hash: impl Into<String>, chain_id: ChainId) -> Self {
		Self {
			tx_hash: tx_hash.into(),
			chain_id,
			is_batch_tx: false,
		}
	}

	pub fn batch(id: impl Into<String>, chain_id: ChainId) -> Self {
		Self {
			tx_hash: id.into(),
			chain_id,
			is_batch_tx: true,
		}
	}
}

/// Solver order correlation ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
	pub order_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cross_posting_order_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_index: Option<u32>,
}
