//! Configuration loading from files and environment.

use crate::types::RelayConfig;
use crate::ConfigError;
use regex::Regex;
use relay_types::serde_helpers::parse_chain_id;
use std::env;
use std::path::Path;
use tracing::{debug, info};
use validator::Validate;

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	/// Picks the format from a file extension. Unknown extensions are TOML.
	pub fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|s| s.to_str()) {
			Some("json") => ConfigFormat::Json,
			Some("yaml") | Some("yml") => ConfigFormat::Yaml,
			_ => ConfigFormat::Toml,
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "RELAY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<RelayConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		info!("Loading configuration from {}", file_path);
		let content = tokio::fs::read_to_string(file_path)
			.await
			.map_err(|e| ConfigError::FileNotFound(format!("{}: {}", file_path, e)))?;

		let mut config = self.parse(&content, ConfigFormat::from_path(Path::new(file_path)))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	/// Parses configuration text after `${VAR}` substitution.
	pub fn parse(&self, content: &str, format: ConfigFormat) -> Result<RelayConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => serde_json::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn apply_env_overrides(&self, config: &mut RelayConfig) -> Result<(), ConfigError> {
		let prefix = &self.env_prefix;

		if let Ok(url) = env::var(format!("{}API_URL", prefix)) {
			debug!("Overriding API base URL from environment");
			config.api.base_url = url;
		}

		if let Ok(key) = env::var(format!("{}API_KEY", prefix)) {
			debug!("Overriding API key from environment");
			config.api.api_key = Some(key);
		}

		if let Ok(level) = env::var(format!("{}LOG_LEVEL", prefix)) {
			config.logging.level = level;
		}

		if let Ok(key) = env::var(format!("{}PRIVATE_KEY", prefix)) {
			debug!("Overriding private key from environment");
			config.wallet.private_key = Some(key);
		}

		if let Ok(attempts) = env::var(format!("{}POLLING_MAX_ATTEMPTS", prefix)) {
			config.polling.max_attempts = attempts.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid polling max attempts: {}", e))
			})?;
		}

		let rpc_prefix = format!("{}RPC_URL_", prefix);
		for (name, url) in env::vars() {
			let Some(raw_id) = name.strip_prefix(&rpc_prefix) else {
				continue;
			};
			let Some(chain_id) = parse_chain_id(raw_id) else {
				continue;
			};
			if let Some(chain) = config.chains.get_mut(&chain_id) {
				debug!(chain_id, "Overriding RPC URL from environment");
				chain.rpc_url = url;
			}
		}

		Ok(())
	}
}

/// Replaces `${VAR_NAME}` patterns with the variable's value.
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Field-level checks through `validator` plus cross-field checks.
pub fn validate_config(config: &RelayConfig) -> Result<(), ConfigError> {
	config
		.validate()
		.map_err(|e| ConfigError::ValidationError(e.to_string()))?;

	for (chain_id, chain) in &config.chains {
		chain.validate().map_err(|e| {
			ConfigError::ValidationError(format!("chains.{}: {}", chain_id, e))
		})?;
	}

	if config.api.websocket_enabled && config.api.websocket_url.is_none() {
		return Err(ConfigError::ValidationError(
			"websocket_enabled requires api.websocket_url".to_string(),
		));
	}

	if config.polling.delayed_after > config.polling.max_attempts {
		return Err(ConfigError::ValidationError(format!(
			"polling.delayed_after ({}) exceeds polling.max_attempts ({})",
			config.polling.delayed_after, config.polling.max_attempts
		)));
	}

	if let Some(key) = &config.wallet.private_key {
		if !key.starts_with("0x") {
			return Err(ConfigError::ValidationError(
				"Private key must start with 0x".to_string(),
			));
		}
	}

	if let Some(chain_id) = config.wallet.default_chain {
		if !config.chains.contains_key(&chain_id) {
			return Err(ConfigError::ValidationError(format!(
				"Default chain {} is not configured",
				chain_id
			)));
		}
	}

	Ok(())
}
