// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Downstream services notified on logout.

use serde::Deserialize;

use crate::error::ConfigError;

/// A service with its own session that should be ended on logout.
///
/// Absolute `http(s)://` URLs are called server-side; anything else is a
/// path handed back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutServiceConfig {
	pub name: String,
	pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutConfig {
	pub services: Vec<LogoutServiceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutConfigLayer {
	#[serde(default)]
	pub services: Option<Vec<LogoutServiceConfig>>,
}

impl LogoutConfigLayer {
	pub fn merge(&mut self, other: LogoutConfigLayer) {
		if other.services.is_some() {
			self.services = other.services;
		}
	}

	pub fn finalize(self) -> Result<LogoutConfig, ConfigError> {
		let services = self.services.unwrap_or_default();
		if let Some(bad) = services
			.iter()
			.find(|s| s.name.is_empty() || s.url.is_empty())
		{
			return Err(ConfigError::Validation(format!(
				"logout service entries need a name and a url (got name '{}', url '{}')",
				bad.name, bad.url
			)));
		}
		Ok(LogoutConfig { services })
	}
}
