//! Configuration for the relay executor.
//!
//! Files are TOML (or JSON/YAML by extension) with `${VAR}` substitution,
//! followed by `RELAY_` prefixed environment overrides and validation.

use thiserror::Error;

pub mod loader;
pub mod serde_helpers;
pub mod types;

pub use loader::{substitute_env_vars, validate_config, ConfigFormat, ConfigLoader};
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),
}

impl From<ConfigError> for relay_types::ExecutionError {
	fn from(err: ConfigError) -> Self {
		relay_types::ExecutionError::Configuration(err.to_string())
	}
}
