// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Tollgate SSO broker.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`TOLLGATE_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use tollgate_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod secret_env;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use secret_env::load_secret_env;
pub use sections::*;
pub use sources::{
	parse_backend_order, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource,
	SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub logging: LoggingConfig,
	pub session: SessionConfig,
	pub auth: AuthConfig,
	pub gerrit: Option<GerritConfig>,
	pub redmine: Option<RedmineConfig>,
	pub logout: LogoutConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`TOLLGATE_SERVER_*`)
/// 2. Config file (`/etc/tollgate/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let session = layer.session.unwrap_or_default().finalize()?;
	let auth = layer.auth.unwrap_or_default().finalize()?;
	let gerrit = layer.gerrit.map(|l| l.build()).transpose()?.flatten();
	let redmine = layer.redmine.map(|l| l.build()).transpose()?.flatten();
	let logout = layer.logout.unwrap_or_default().finalize()?;

	validate_config(&auth)?;

	info!(
		host = %http.host,
		port = http.port,
		cookie_domain = %session.cookie_domain,
		backends = ?auth.backend_order,
		github_configured = auth.github.is_some(),
		gerrit_configured = gerrit.is_some(),
		redmine_configured = redmine.is_some(),
		logout_services = logout.services.len(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		logging,
		session,
		auth,
		gerrit,
		redmine,
		logout,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(auth: &AuthConfig) -> Result<(), ConfigError> {
	if auth.backend_order.is_empty() && auth.github.is_none() {
		return Err(ConfigError::Validation(
			"no login method configured: set up at least one of auth.static_users, \
			 auth.directory, auth.remote_user_store or auth.github"
				.to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const FULL_TOML: &str = r#"
[http]
port = 9000

[logging]
level = "debug"
format = "json"

[session]
private_key_path = "/srv/tollgate/privkey.pem"
cookie_domain = "tests.dom"
cookie_period_secs = 3600

[auth]
backend_order = ["static", "remote_user_store"]

[auth.static_users.user1]
password_hash = "$6$salt$hash"
fullname = "Demo user1"
email = "user1@tests.dom"

[auth.remote_user_store]
url = "http://manage.tests.dom/manage"

[auth.github]
client_id = "your_github_app_id"
client_secret = "your_github_app_secret"
redirect_uri = "http://tests.dom/auth/login/github/callback"
allowed_organizations = "acme, tests"

[gerrit]
url = "http://gerrit.tests.dom/r"
admin_user = "admin"
admin_password = "wxcvbn"

[[logout.services]]
name = "redmine"
url = "/redmine/logout"
"#;

	fn toml_file(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn test_full_file_loads() {
		let file = toml_file(FULL_TOML);
		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.socket_addr(), "0.0.0.0:9000");
		assert_eq!(config.logging.format, LogFormat::Json);
		assert_eq!(config.session.cookie_domain, "tests.dom");
		assert_eq!(
			config.auth.backend_order,
			vec![BackendName::Static, BackendName::RemoteUserStore]
		);
		assert_eq!(
			config.auth.github.as_ref().unwrap().allowed_organizations,
			"acme, tests"
		);
		assert!(config.gerrit.is_some());
		assert!(config.redmine.is_none());
		assert_eq!(config.logout.services.len(), 1);
	}

	#[test]
	fn test_later_source_overrides_file() {
		struct Override;
		impl ConfigSource for Override {
			fn name(&self) -> &'static str {
				"override"
			}
			fn precedence(&self) -> Precedence {
				Precedence::Environment
			}
			fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
				Ok(ServerConfigLayer {
					http: Some(HttpConfigLayer {
						port: Some(7000),
						..Default::default()
					}),
					..Default::default()
				})
			}
		}

		let file = toml_file(FULL_TOML);
		// Out of order on purpose: sources are sorted by precedence.
		let config = load_from_sources(vec![
			Box::new(Override),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.http.port, 7000);
		assert_eq!(config.session.cookie_period_secs, 3600);
	}

	#[test]
	fn test_no_login_method_rejected() {
		let result = finalize(ServerConfigLayer::default());
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_github_only_is_enough() {
		let file = toml_file(
			r#"
[auth.github]
client_id = "id"
client_secret = "secret"
redirect_uri = "http://tests.dom/auth/login/github/callback"
"#,
		);
		let config = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap();
		assert!(config.auth.backend_order.is_empty());
		assert!(config.auth.github.is_some());
	}
}
