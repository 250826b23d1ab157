//! Backend base addresses.
//!
//! Values come from the build environment (`SYLLABUS_API_URL`,
//! `SYLLABUS_WS_URL`) because a CSR bundle has no runtime environment.

use log::error;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	pub api_url: String,
	pub ws_url: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_url: DEFAULT_API_URL.into(),
			ws_url: DEFAULT_WS_URL.into(),
		}
	}
}

impl ClientConfig {
	/// Validate both base addresses and strip trailing slashes.
	pub fn new(api_url: &str, ws_url: &str) -> Result<Self, ConfigError> {
		Ok(Self {
			api_url: checked("api_url", api_url, &["http://", "https://"], "http(s)")?,
			ws_url: checked("ws_url", ws_url, &["ws://", "wss://"], "ws(s)")?,
		})
	}

	/// Read the compile-time overrides, deriving the socket base from the API
	/// base when only the latter is set.
	pub fn from_build_env() -> Self {
		Self::resolve(option_env!("SYLLABUS_API_URL"), option_env!("SYLLABUS_WS_URL"))
	}

	fn resolve(api: Option<&str>, ws: Option<&str>) -> Self {
		let api_url = api.unwrap_or(DEFAULT_API_URL);
		let ws_url = match (api, ws) {
			(_, Some(ws)) => ws.to_string(),
			(Some(api), None) => derive_ws_url(api),
			(None, None) => DEFAULT_WS_URL.to_string(),
		};
		Self::new(api_url, &ws_url).unwrap_or_else(|e| {
			error!("Invalid backend address, using defaults: {}", e);
			Self::default()
		})
	}
}

/// `http://host` -> `ws://host`, `https://host` -> `wss://host`.
pub fn derive_ws_url(api_url: &str) -> String {
	if let Some(rest) = api_url.strip_prefix("https://") {
		format!("wss://{}", rest)
	} else if let Some(rest) = api_url.strip_prefix("http://") {
		format!("ws://{}", rest)
	} else {
		api_url.to_string()
	}
}

fn checked(
	field: &'static str,
	value: &str,
	schemes: &[&str],
	expected: &'static str,
) -> Result<String, ConfigError> {
	let value = value.trim().trim_end_matches('/');
	if schemes.iter().any(|s| value.starts_with(s) && value.len() > s.len()) {
		Ok(value.to_string())
	} else {
		Err(ConfigError::Scheme {
			field,
			expected,
			value: value.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn trims_trailing_slashes() {
		let cfg = ClientConfig::new("https://api.example.com/", "wss://api.example.com//").unwrap();
		assert_eq!(cfg.api_url, "https://api.example.com");
		assert_eq!(cfg.ws_url, "wss://api.example.com");
	}

	#[test]
	fn rejects_mismatched_schemes() {
		let err = ClientConfig::new("ws://host", "ws://host").unwrap_err();
		assert!(matches!(err, ConfigError::Scheme { field: "api_url", .. }));
		assert!(ClientConfig::new("http://host", "http://host").is_err());
		assert!(ClientConfig::new("http://", "ws://host").is_err());
	}

	#[test]
	fn socket_base_follows_api_base() {
		assert_eq!(derive_ws_url("https://tutor.run.app"), "wss://tutor.run.app");
		assert_eq!(derive_ws_url("http://localhost:9000"), "ws://localhost:9000");

		let cfg = ClientConfig::resolve(Some("https://tutor.run.app"), None);
		assert_eq!(cfg.ws_url, "wss://tutor.run.app");
	}

	#[test]
	fn explicit_socket_base_wins() {
		let cfg = ClientConfig::resolve(Some("http://a:1"), Some("ws://b:2"));
		assert_eq!(cfg, ClientConfig::new("http://a:1", "ws://b:2").unwrap());
	}

	#[test]
	fn invalid_build_values_fall_back() {
		assert_eq!(ClientConfig::resolve(Some("ftp://x"), None), ClientConfig::default());
		assert_eq!(ClientConfig::resolve(None, None), ClientConfig::default());
	}
}
