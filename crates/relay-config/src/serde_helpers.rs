//! Serde helpers for configuration deserialization

use relay_types::serde_helpers::parse_chain_id;
use relay_types::ChainId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Deserializes a map keyed by chain id. TOML and YAML keys arrive as
/// strings, decimal or `0x` hex.
pub fn deserialize_chain_id_map<'de, D, T>(deserializer: D) -> Result<HashMap<ChainId, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			parse_chain_id(&k)
				.map(|id| (id, v))
				.ok_or_else(|| serde::de::Error::custom(format!("Invalid chain ID: {}", k)))
		})
		.collect()
}

/// Serializes a chain id map with decimal string keys.
pub fn serialize_chain_id_map<S, T>(map: &HashMap<ChainId, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: HashMap<String, &T> = map.iter().map(|(k, v)| (k.to_string(), v)).collect();

	string_map.serialize(serializer)
}
