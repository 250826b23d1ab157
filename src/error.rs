//! Error types for the transport layer and client configuration.

use thiserror::Error;

/// Failures while talking to the backend. Always rendered as a status string.
#[derive(Error, Debug)]
pub enum TransportError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("server responded with status {0}")]
	Status(u16),

	#[error("No data received from server.")]
	EmptyResponse,

	#[error("invalid response body: {0}")]
	Json(#[from] serde_json::Error),

	#[error("socket error: {0}")]
	Socket(String),

	#[error("could not read file: {0}")]
	File(String),
}

/// Rejected base address.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
	#[error("expected one of {expected} for {field}, got `{value}`")]
	Scheme {
		field: &'static str,
		expected: &'static str,
		value: String,
	},
}
