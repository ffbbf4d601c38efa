// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket signing key and session cookie settings.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_COOKIE_NAME: &str = "auth_pubtkt";
pub const DEFAULT_COOKIE_PERIOD_SECS: u64 = 43_200;
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "/etc/tollgate/privkey.pem";

/// Session configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// PEM encoded RSA private key used to sign tickets.
	pub private_key_path: PathBuf,
	pub cookie_name: String,
	pub cookie_domain: String,
	/// Cookie `Max-Age` and ticket validity window.
	pub cookie_period_secs: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
			cookie_name: DEFAULT_COOKIE_NAME.to_string(),
			cookie_domain: "localhost".to_string(),
			cookie_period_secs: DEFAULT_COOKIE_PERIOD_SECS,
		}
	}
}

/// Session configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfigLayer {
	#[serde(default)]
	pub private_key_path: Option<PathBuf>,
	#[serde(default)]
	pub cookie_name: Option<String>,
	#[serde(default)]
	pub cookie_domain: Option<String>,
	#[serde(default)]
	pub cookie_period_secs: Option<u64>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: SessionConfigLayer) {
		if other.private_key_path.is_some() {
			self.private_key_path = other.private_key_path;
		}
		if other.cookie_name.is_some() {
			self.cookie_name = other.cookie_name;
		}
		if other.cookie_domain.is_some() {
			self.cookie_domain = other.cookie_domain;
		}
		if other.cookie_period_secs.is_some() {
			self.cookie_period_secs = other.cookie_period_secs;
		}
	}

	pub fn finalize(self) -> Result<SessionConfig, ConfigError> {
		let defaults = SessionConfig::default();
		let config = SessionConfig {
			private_key_path: self.private_key_path.unwrap_or(defaults.private_key_path),
			cookie_name: self.cookie_name.unwrap_or(defaults.cookie_name),
			cookie_domain: self.cookie_domain.unwrap_or(defaults.cookie_domain),
			cookie_period_secs: self.cookie_period_secs.unwrap_or(defaults.cookie_period_secs),
		};

		if config.cookie_period_secs == 0 {
			return Err(ConfigError::Validation(
				"session.cookie_period_secs must be greater than zero".to_string(),
			));
		}
		if config.cookie_name.is_empty()
			|| config
				.cookie_name
				.chars()
				.any(|c| c.is_whitespace() || matches!(c, ';' | '=' | ','))
		{
			return Err(ConfigError::InvalidValue {
				key: "session.cookie_name".to_string(),
				message: format!("'{}' is not a valid cookie name", config.cookie_name),
			});
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = SessionConfigLayer::default().finalize().unwrap();
		assert_eq!(config.cookie_name, "auth_pubtkt");
		assert_eq!(config.cookie_period_secs, 43_200);
		assert_eq!(
			config.private_key_path,
			PathBuf::from("/etc/tollgate/privkey.pem")
		);
	}

	#[test]
	fn test_zero_period_rejected() {
		let layer = SessionConfigLayer {
			cookie_period_secs: Some(0),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_invalid_cookie_name_rejected() {
		let layer = SessionConfigLayer {
			cookie_name: Some("auth pubtkt".to_string()),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_deserialize() {
		let layer: SessionConfigLayer = toml::from_str(
			r#"
private_key_path = "/srv/keys/privkey.pem"
cookie_domain = "tests.dom"
cookie_period_secs = 3600
"#,
		)
		.unwrap();
		let config = layer.finalize().unwrap();
		assert_eq!(config.cookie_domain, "tests.dom");
		assert_eq!(config.cookie_period_secs, 3600);
		assert_eq!(config.private_key_path, PathBuf::from("/srv/keys/privkey.pem"));
	}
}
