// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! LDAP directory credential backend section.

use serde::Deserialize;

use crate::error::ConfigError;

/// Placeholder substituted with the (escaped) username in the bind DN template.
pub const USERNAME_PLACEHOLDER: &str = "%username%";

/// Validated directory configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryConfig {
	/// `ldap://` or `ldaps://` URL.
	pub url: String,
	/// e.g. `uid=%username%,ou=Users,dc=example,dc=com`
	pub bind_dn_template: String,
	pub surname_attr: String,
	pub mail_attr: String,
	pub timeout_secs: u64,
}

/// Directory configuration layer (all fields optional for layering).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub bind_dn_template: Option<String>,
	#[serde(default)]
	pub surname_attr: Option<String>,
	#[serde(default)]
	pub mail_attr: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl DirectoryConfigLayer {
	pub fn merge(&mut self, other: DirectoryConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.bind_dn_template.is_some() {
			self.bind_dn_template = other.bind_dn_template;
		}
		if other.surname_attr.is_some() {
			self.surname_attr = other.surname_attr;
		}
		if other.mail_attr.is_some() {
			self.mail_attr = other.mail_attr;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	/// Build the final config, returning `None` when no URL is set.
	pub fn build(self) -> Result<Option<DirectoryConfig>, ConfigError> {
		let Some(url) = self.url.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};

		if !(url.starts_with("ldap://") || url.starts_with("ldaps://") || url.starts_with("ldapi://")) {
			return Err(ConfigError::InvalidValue {
				key: "auth.directory.url".to_string(),
				message: format!("'{url}' is not an ldap:// or ldaps:// URL"),
			});
		}

		let bind_dn_template = self.bind_dn_template.ok_or_else(|| {
			ConfigError::Validation(
				"auth.directory.bind_dn_template is required when the directory url is set".to_string(),
			)
		})?;
		if !bind_dn_template.contains(USERNAME_PLACEHOLDER) {
			return Err(ConfigError::Validation(format!(
				"auth.directory.bind_dn_template must contain {USERNAME_PLACEHOLDER}"
			)));
		}

		Ok(Some(DirectoryConfig {
			url,
			bind_dn_template,
			surname_attr: self.surname_attr.unwrap_or_else(|| "sn".to_string()),
			mail_attr: self.mail_attr.unwrap_or_else(|| "mail".to_string()),
			timeout_secs: self.timeout_secs.unwrap_or(10),
		}))
	}
}
