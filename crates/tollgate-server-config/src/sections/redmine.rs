// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redmine provisioning section.

use serde::Deserialize;
use tollgate_common_secret::SecretString;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct RedmineConfig {
	/// Base URL of the Redmine REST API.
	pub api_url: String,
	pub api_key: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedmineConfigLayer {
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(default)]
	pub api_key: Option<SecretString>,
}

impl RedmineConfigLayer {
	pub fn merge(&mut self, other: RedmineConfigLayer) {
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
	}

	pub fn build(self) -> Result<Option<RedmineConfig>, ConfigError> {
		let Some(api_url) = self.api_url.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};
		let api_key = self.api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
			ConfigError::Validation(
				"redmine.api_key is required when redmine.api_url is set".to_string(),
			)
		})?;
		Ok(Some(RedmineConfig {
			api_url: api_url.trim_end_matches('/').to_string(),
			api_key,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_requires_key() {
		let layer = RedmineConfigLayer {
			api_url: Some("http://redmine.tests.dom".to_string()),
			api_key: None,
		};
		assert!(layer.build().is_err());
	}

	#[test]
	fn test_build() {
		let layer = RedmineConfigLayer {
			api_url: Some("http://redmine.tests.dom/".to_string()),
			api_key: Some(SecretString::from("XXX")),
		};
		let config = layer.build().unwrap().unwrap();
		assert_eq!(config.api_url, "http://redmine.tests.dom");
	}
}
