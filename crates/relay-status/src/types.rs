//! Request and response bodies of the relay HTTP API.

use relay_types::{ChainId, CurrencyAmount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
	#[default]
	ExactInput,
	ExactOutput,
	ExpectedOutput,
}

/// Arbitrary call executed on the destination chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTx {
	pub to: String,
	#[serde(default)]
	pub value: String,
	#[serde(default)]
	pub data: String,
}

/// Body of `POST /quote`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
	pub user: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient: Option<String>,
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	pub origin_currency: String,
	pub destination_currency: String,
	pub amount: String,
	pub trade_type: TradeType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub referrer: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub txs: Option<Vec<CallTx>>,
	/// Extra service options passed through untouched.
	#[serde(flatten)]
	pub options: Map<String, Value>,
}

/// Body of `POST /app-fees/{wallet}/claim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAppFeesRequest {
	pub chain_id: ChainId,
	pub currency: String,
	pub recipient: String,
}

/// Response of `GET /app-fees/{wallet}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFeeBalances {
	#[serde(default)]
	pub balances: Vec<CurrencyAmount>,
}
