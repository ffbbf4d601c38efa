// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential backends, backend priority and OAuth state settings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sections::directory::{DirectoryConfig, DirectoryConfigLayer};
use crate::sections::github::{GitHubConfig, GitHubConfigLayer};
use crate::sections::user_store::{RemoteUserStoreConfig, RemoteUserStoreConfigLayer};

pub const DEFAULT_OAUTH_STATE_TTL_SECS: u64 = 600;
pub const DEFAULT_OAUTH_STATE_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Password-checking backends that can take part in the credential chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendName {
	Static,
	Directory,
	RemoteUserStore,
}

impl BackendName {
	pub const DEFAULT_ORDER: [BackendName; 3] = [
		BackendName::Static,
		BackendName::Directory,
		BackendName::RemoteUserStore,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			BackendName::Static => "static",
			BackendName::Directory => "directory",
			BackendName::RemoteUserStore => "remote_user_store",
		}
	}
}

impl fmt::Display for BackendName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BackendName {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"static" => Ok(BackendName::Static),
			"directory" | "ldap" => Ok(BackendName::Directory),
			"remote_user_store" | "localdb" => Ok(BackendName::RemoteUserStore),
			other => Err(ConfigError::InvalidValue {
				key: "auth.backend_order".to_string(),
				message: format!("unknown credential backend '{other}'"),
			}),
		}
	}
}

/// A locally configured user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaticUserConfig {
	/// PHC string: `$argon2id$...` or SHA-512 crypt `$6$salt$hash`.
	pub password_hash: String,
	#[serde(default)]
	pub fullname: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

/// Auth configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Enabled credential backends in the order they are consulted.
	pub backend_order: Vec<BackendName>,
	pub static_users: BTreeMap<String, StaticUserConfig>,
	pub directory: Option<DirectoryConfig>,
	pub remote_user_store: Option<RemoteUserStoreConfig>,
	pub github: Option<GitHubConfig>,
	pub oauth_state_ttl_secs: u64,
	pub oauth_state_cleanup_interval_secs: u64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			backend_order: Vec::new(),
			static_users: BTreeMap::new(),
			directory: None,
			remote_user_store: None,
			github: None,
			oauth_state_ttl_secs: DEFAULT_OAUTH_STATE_TTL_SECS,
			oauth_state_cleanup_interval_secs: DEFAULT_OAUTH_STATE_CLEANUP_INTERVAL_SECS,
		}
	}
}

impl AuthConfig {
	pub fn is_enabled(&self, backend: BackendName) -> bool {
		match backend {
			BackendName::Static => !self.static_users.is_empty(),
			BackendName::Directory => self.directory.is_some(),
			BackendName::RemoteUserStore => self.remote_user_store.is_some(),
		}
	}
}

/// Auth configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub backend_order: Option<Vec<BackendName>>,
	#[serde(default)]
	pub static_users: Option<BTreeMap<String, StaticUserConfig>>,
	#[serde(default)]
	pub directory: Option<DirectoryConfigLayer>,
	#[serde(default)]
	pub remote_user_store: Option<RemoteUserStoreConfigLayer>,
	#[serde(default)]
	pub github: Option<GitHubConfigLayer>,
	#[serde(default)]
	pub oauth_state_ttl_secs: Option<u64>,
	#[serde(default)]
	pub oauth_state_cleanup_interval_secs: Option<u64>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.backend_order.is_some() {
			self.backend_order = other.backend_order;
		}
		if let Some(users) = other.static_users {
			self.static_users.get_or_insert_with(BTreeMap::new).extend(users);
		}
		merge_section(&mut self.directory, other.directory, DirectoryConfigLayer::merge);
		merge_section(
			&mut self.remote_user_store,
			other.remote_user_store,
			RemoteUserStoreConfigLayer::merge,
		);
		merge_section(&mut self.github, other.github, GitHubConfigLayer::merge);
		if other.oauth_state_ttl_secs.is_some() {
			self.oauth_state_ttl_secs = other.oauth_state_ttl_secs;
		}
		if other.oauth_state_cleanup_interval_secs.is_some() {
			self.oauth_state_cleanup_interval_secs = other.oauth_state_cleanup_interval_secs;
		}
	}

	pub fn finalize(self) -> Result<AuthConfig, ConfigError> {
		let static_users = self.static_users.unwrap_or_default();
		for (username, user) in &static_users {
			if username.is_empty() {
				return Err(ConfigError::Validation(
					"auth.static_users contains an empty username".to_string(),
				));
			}
			if user.password_hash.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"auth.static_users.{username}.password_hash must not be empty"
				)));
			}
		}

		let mut config = AuthConfig {
			backend_order: Vec::new(),
			static_users,
			directory: self.directory.map(|l| l.build()).transpose()?.flatten(),
			remote_user_store: self.remote_user_store.and_then(|l| l.build()),
			github: self.github.map(|l| l.build()).transpose()?.flatten(),
			oauth_state_ttl_secs: self
				.oauth_state_ttl_secs
				.unwrap_or(DEFAULT_OAUTH_STATE_TTL_SECS),
			oauth_state_cleanup_interval_secs: self
				.oauth_state_cleanup_interval_secs
				.unwrap_or(DEFAULT_OAUTH_STATE_CLEANUP_INTERVAL_SECS),
		};

		if config.oauth_state_ttl_secs == 0 {
			return Err(ConfigError::Validation(
				"auth.oauth_state_ttl_secs must be greater than zero".to_string(),
			));
		}
		if config.oauth_state_cleanup_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"auth.oauth_state_cleanup_interval_secs must be greater than zero".to_string(),
			));
		}

		config.backend_order = match self.backend_order {
			Some(order) => {
				let mut seen = Vec::with_capacity(order.len());
				for backend in order {
					if seen.contains(&backend) {
						return Err(ConfigError::Validation(format!(
							"auth.backend_order lists '{backend}' more than once"
						)));
					}
					if !config.is_enabled(backend) {
						return Err(ConfigError::Validation(format!(
							"auth.backend_order lists '{backend}' but that backend is not configured"
						)));
					}
					seen.push(backend);
				}
				seen
			}
			None => BackendName::DEFAULT_ORDER
				.into_iter()
				.filter(|b| config.is_enabled(*b))
				.collect(),
		};

		Ok(config)
	}
}

fn merge_section<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
