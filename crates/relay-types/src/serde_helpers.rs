//! Serde helpers for relay API payloads.
//!
//! The relay service is not consistent about numeric encodings: amounts, gas
//! values and chain ids arrive as JSON numbers or as decimal/hex strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes an optional value that may be a JSON string or number into
/// `Option<String>`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(s)),
		Some(Value::Number(n)) => Ok(Some(n.to_string())),
		Some(other) => Err(serde::de::Error::custom(format!(
			"expected string or number, got {}",
			other
		))),
	}
}

/// Deserializes an optional chain id encoded as a number, a decimal string or
/// a `0x` prefixed hex string.
pub fn chain_id_lenient<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(n)) => n
			.as_u64()
			.map(Some)
			.ok_or_else(|| serde::de::Error::custom(format!("Invalid chain ID: {}", n))),
		Some(Value::String(s)) => parse_chain_id(&s)
			.map(Some)
			.ok_or_else(|| serde::de::Error::custom(format!("Invalid chain ID: {}", s))),
		Some(other) => Err(serde::de::Error::custom(format!(
			"Invalid chain ID: {}",
			other
		))),
	}
}

/// Parses a decimal or `0x` prefixed hex chain id.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
	match raw.strip_prefix("0x") {
		Some(hex) => u64::from_str_radix(hex, 16).ok(),
		None => raw.parse().ok(),
	}
}
