//! Hyperliquid relay.
//!
//! Hyperliquid deposits arrive as an exchange `action` rather than a
//! transaction. The engine turns the action into an EIP-712
//! `HyperliquidTransaction:*` payload, has the wallet sign it and posts the
//! signed action to the exchange endpoint.

use relay_config::HyperliquidConfig;
use relay_types::{ChainId, ExecutionError, HyperliquidAction, SignData};
use serde_json::{json, Value};
use tracing::{debug, info};

const DOMAIN_NAME: &str = "HyperliquidSignTransaction";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A signable Hyperliquid action and the body the exchange expects with it.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperliquidSignRequest {
	pub sign: SignData,
	pub action: Value,
	pub nonce: u64,
}

#[derive(Debug, Clone)]
pub struct HyperliquidRelay {
	http: reqwest::Client,
	exchange_url: String,
	chain: String,
}

impl HyperliquidRelay {
	pub fn new(config: &HyperliquidConfig) -> Self {
		Self::with_client(reqwest::Client::new(), config)
	}

	pub fn with_client(http: reqwest::Client, config: &HyperliquidConfig) -> Self {
		Self {
			http,
			exchange_url: config.exchange_url.clone(),
			chain: config.chain.clone(),
		}
	}

	/// Builds the typed-data payload for `action`, signed on
	/// `signature_chain_id` with `nonce` (milliseconds since the epoch).
	pub fn sign_request(
		&self,
		action: &HyperliquidAction,
		signature_chain_id: ChainId,
		nonce: u64,
	) -> Result<HyperliquidSignRequest, ExecutionError> {
		let params = &action.parameters;
		let signature_chain_hex = format!("0x{:x}", signature_chain_id);

		let (primary_type, fields, message, action_body) = match action.kind.to_ascii_lowercase().as_str() {
			"usdsend" => (
				"HyperliquidTransaction:UsdSend",
				json!([
					{ "name": "hyperliquidChain", "type": "string" },
					{ "name": "destination", "type": "string" },
					{ "name": "amount", "type": "string" },
					{ "name": "time", "type": "uint64" },
				]),
				json!({
					"hyperliquidChain": self.chain,
					"destination": params.destination,
					"amount": params.amount,
					"time": nonce,
				}),
				json!({
					"type": "usdSend",
					"signatureChainId": signature_chain_hex,
					"hyperliquidChain": self.chain,
					"destination": params.destination,
					"amount": params.amount,
					"time": nonce,
				}),
			),
			"sendasset" => {
				let token = params.token.clone().ok_or_else(|| {
					ExecutionError::Validation("Hyperliquid sendAsset action is missing a token".to_string())
				})?;
				let source_dex = params.source_dex.clone().unwrap_or_default();
				let destination_dex = params.destination_dex.clone().unwrap_or_default();
				let from_sub_account = params.from_sub_account.clone().unwrap_or_default();
				(
					"HyperliquidTransaction:SendAsset",
					json!([
						{ "name": "hyperliquidChain", "type": "string" },
						{ "name": "destination", "type": "string" },
						{ "name": "sourceDex", "type": "string" },
						{ "name": "destinationDex", "type": "string" },
						{ "name": "token", "type": "string" },
						{ "name": "amount", "type": "string" },
						{ "name": "fromSubAccount", "type": "string" },
						{ "name": "nonce", "type": "uint64" },
					]),
					json!({
						"hyperliquidChain": self.chain,
						"destination": params.destination,
						"sourceDex": source_dex,
						"destinationDex": destination_dex,
						"token": token,
						"amount": params.amount,
						"fromSubAccount": from_sub_account,
						"nonce": nonce,
					}),
					json!({
						"type": "sendAsset",
						"signatureChainId": signature_chain_hex,
						"hyperliquidChain": self.chain,
						"destination": params.destination,
						"sourceDex": source_dex,
						"destinationDex": destination_dex,
						"token": token,
						"amount": params.amount,
						"fromSubAccount": from_sub_account,
						"nonce": nonce,
					}),
				)
			}
			other => {
				return Err(ExecutionError::Validation(format!(
					"Unsupported Hyperliquid action: {}",
					other
				)))
			}
		};

		let mut types = json!({
			"EIP712Domain": [
				{ "name": "name", "type": "string" },
				{ "name": "version", "type": "string" },
				{ "name": "chainId", "type": "uint256" },
				{ "name": "verifyingContract", "type": "address" },
			],
		});
		types[primary_type] = fields;

		let sign = SignData::Eip712 {
			domain: json!({
				"name": DOMAIN_NAME,
				"version": "1",
				"chainId": signature_chain_id,
				"verifyingContract": ZERO_ADDRESS,
			}),
			types,
			primary_type: primary_type.to_string(),
			value: message,
		};

		Ok(HyperliquidSignRequest {
			sign,
			action: action_body,
			nonce,
		})
	}

	/// Posts a signed action to the exchange.
	pub async fn submit(&self, request: &HyperliquidSignRequest, signature: &str) -> Result<Value, ExecutionError> {
		let body = json!({
			"action": request.action,
			"nonce": request.nonce,
			"signature": split_signature(signature)?,
		});

		let response = self
			.http
			.post(&self.exchange_url)
			.json(&body)
			.send()
			.await
			.map_err(|e| ExecutionError::Network(e.to_string()))?;
		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| ExecutionError::Network(e.to_string()))?;

		if !status.is_success() {
			return Err(ExecutionError::Api {
				status: status.as_u16(),
				body: text,
				endpoint: self.exchange_url.clone(),
			});
		}

		let parsed: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
		if parsed.get("status").and_then(Value::as_str) == Some("err") {
			return Err(ExecutionError::RequestFailed {
				request_id: None,
				details: parsed
					.get("response")
					.map(|r| r.as_str().map(str::to_string).unwrap_or_else(|| r.to_string())),
			});
		}

		debug!(response = %parsed, "Hyperliquid exchange response");
		info!(nonce = request.nonce, "Relayed Hyperliquid action");
		Ok(parsed)
	}
}

/// Splits a 65-byte hex signature into `{r, s, v}`.
pub fn split_signature(signature: &str) -> Result<Value, ExecutionError> {
	let raw = signature.strip_prefix("0x").unwrap_or(signature);
	if raw.len() != 130 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(ExecutionError::Wallet(format!(
			"Expected a 65 byte signature, got {}",
			signature
		)));
	}

	let v = u8::from_str_radix(&raw[128..130], 16)
		.map_err(|e| ExecutionError::Wallet(format!("Invalid signature recovery id: {}", e)))?;
	// some signers return the raw recovery id
	let v = if v < 27 { v + 27 } else { v };

	Ok(json!({
		"r": format!("0x{}", &raw[..64]),
		"s": format!("0x{}", &raw[64..128]),
		"v": v,
	}))
}
