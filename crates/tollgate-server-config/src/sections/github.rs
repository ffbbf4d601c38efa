// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub OAuth section.

use serde::Deserialize;
use tollgate_common_secret::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Configuration layer for GitHub OAuth (all fields optional for layering).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfigLayer {
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub client_secret: Option<SecretString>,
	/// The callback URL where GitHub redirects after authorization.
	#[serde(default)]
	pub redirect_uri: Option<String>,
	/// Comma separated organization logins. Empty means every GitHub user is accepted.
	#[serde(default)]
	pub allowed_organizations: Option<String>,
	#[serde(default)]
	pub auth_url: Option<String>,
	#[serde(default)]
	pub token_url: Option<String>,
	#[serde(default)]
	pub api_url: Option<String>,
}

impl GitHubConfigLayer {
	/// Merge with another layer, preferring values from `other`.
	pub fn merge(&mut self, other: GitHubConfigLayer) {
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.redirect_uri.is_some() {
			self.redirect_uri = other.redirect_uri;
		}
		if other.allowed_organizations.is_some() {
			self.allowed_organizations = other.allowed_organizations;
		}
		if other.auth_url.is_some() {
			self.auth_url = other.auth_url;
		}
		if other.token_url.is_some() {
			self.token_url = other.token_url;
		}
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
	}

	/// Build the final config, returning `None` if no client id is set.
	pub fn build(self) -> Result<Option<GitHubConfig>, ConfigError> {
		let Some(client_id) = self.client_id.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};

		let client_secret = self.client_secret.ok_or_else(|| {
			ConfigError::Validation(
				"GitHub client_secret is required when client_id is set".to_string(),
			)
		})?;
		if client_secret.is_empty() {
			return Err(ConfigError::Validation(
				"GitHub client_secret cannot be empty".to_string(),
			));
		}

		let redirect_uri = self.redirect_uri.filter(|s| !s.is_empty()).ok_or_else(|| {
			ConfigError::Validation(
				"GitHub redirect_uri is required when client_id is set".to_string(),
			)
		})?;

		Ok(Some(GitHubConfig {
			client_id,
			client_secret,
			redirect_uri,
			allowed_organizations: self.allowed_organizations.unwrap_or_default(),
			auth_url: self
				.auth_url
				.unwrap_or_else(|| DEFAULT_GITHUB_AUTH_URL.to_string()),
			token_url: self
				.token_url
				.unwrap_or_else(|| DEFAULT_GITHUB_TOKEN_URL.to_string()),
			api_url: self
				.api_url
				.unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
				.trim_end_matches('/')
				.to_string(),
		}))
	}
}

/// Validated GitHub OAuth configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	pub redirect_uri: String,
	pub allowed_organizations: String,
	pub auth_url: String,
	pub token_url: String,
	pub api_url: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn layer() -> GitHubConfigLayer {
		GitHubConfigLayer {
			client_id: Some("your_github_app_id".to_string()),
			client_secret: Some(SecretString::from("your_github_app_secret")),
			redirect_uri: Some("http://tests.dom/auth/login/github/callback".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_not_configured_without_client_id() {
		assert!(GitHubConfigLayer::default().build().unwrap().is_none());
	}

	#[test]
	fn test_endpoints_default_to_github() {
		let config = layer().build().unwrap().unwrap();
		assert_eq!(config.auth_url, DEFAULT_GITHUB_AUTH_URL);
		assert_eq!(config.token_url, DEFAULT_GITHUB_TOKEN_URL);
		assert_eq!(config.api_url, "https://api.github.com");
		assert!(config.allowed_organizations.is_empty());
	}

	#[test]
	fn test_missing_secret_rejected() {
		let layer = GitHubConfigLayer {
			client_secret: None,
			..layer()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_empty_secret_rejected() {
		let layer = GitHubConfigLayer {
			client_secret: Some(SecretString::from("")),
			..layer()
		};
		assert!(layer.build().is_err());
	}

	#[test]
	fn test_secret_not_in_debug() {
		let config = layer().build().unwrap().unwrap();
		assert!(!format!("{config:?}").contains("your_github_app_secret"));
	}
}
