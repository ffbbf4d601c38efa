// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::secret_env::load_secret_env;
use crate::sections::{
	AuthConfigLayer, BackendName, DirectoryConfigLayer, GerritConfigLayer, GitHubConfigLayer,
	HttpConfigLayer, LogFormat, LoggingConfigLayer, RedmineConfigLayer,
	RemoteUserStoreConfigLayer, SessionConfigLayer,
};

/// Default location of the TOML config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tollgate/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: TOLLGATE_SERVER_<SECTION>_<FIELD>. Secrets also accept a
/// `_FILE` suffixed variant pointing at a file holding the value.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			logging: Some(load_logging_from_env()?),
			session: Some(load_session_from_env()?),
			auth: Some(load_auth_from_env()?),
			gerrit: Some(load_gerrit_from_env()?),
			redmine: Some(load_redmine_from_env()?),
			logout: None,
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_backend_order(name: &str) -> Result<Option<Vec<BackendName>>, ConfigError> {
	match env_var(name) {
		Some(v) => parse_backend_order(&v).map(Some),
		None => Ok(None),
	}
}

/// Parse a comma separated backend list such as `static,directory`.
pub fn parse_backend_order(value: &str) -> Result<Vec<BackendName>, ConfigError> {
	value
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::parse)
		.collect()
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("TOLLGATE_SERVER_HOST"),
		port: env_u16("TOLLGATE_SERVER_PORT")?,
		outbound_timeout_secs: env_u64("TOLLGATE_SERVER_HTTP_TIMEOUT_SECS")?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("TOLLGATE_SERVER_LOG_FORMAT") {
		Some(v) => Some(LogFormat::parse(&v).ok_or_else(|| ConfigError::InvalidValue {
			key: "TOLLGATE_SERVER_LOG_FORMAT".to_string(),
			message: format!("expected 'text' or 'json', got '{v}'"),
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("TOLLGATE_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_session_from_env() -> Result<SessionConfigLayer, ConfigError> {
	Ok(SessionConfigLayer {
		private_key_path: env_var("TOLLGATE_SERVER_PRIVATE_KEY_PATH").map(PathBuf::from),
		cookie_name: env_var("TOLLGATE_SERVER_COOKIE_NAME"),
		cookie_domain: env_var("TOLLGATE_SERVER_COOKIE_DOMAIN"),
		cookie_period_secs: env_u64("TOLLGATE_SERVER_COOKIE_PERIOD_SECS")?,
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	let directory = DirectoryConfigLayer {
		url: env_var("TOLLGATE_SERVER_LDAP_URL"),
		bind_dn_template: env_var("TOLLGATE_SERVER_LDAP_BIND_DN_TEMPLATE"),
		surname_attr: env_var("TOLLGATE_SERVER_LDAP_SURNAME_ATTR"),
		mail_attr: env_var("TOLLGATE_SERVER_LDAP_MAIL_ATTR"),
		timeout_secs: env_u64("TOLLGATE_SERVER_LDAP_TIMEOUT_SECS")?,
	};

	let remote_user_store = RemoteUserStoreConfigLayer {
		url: env_var("TOLLGATE_SERVER_USER_STORE_URL"),
	};

	let github = GitHubConfigLayer {
		client_id: env_var("TOLLGATE_SERVER_GITHUB_CLIENT_ID"),
		client_secret: load_secret_env("TOLLGATE_SERVER_GITHUB_CLIENT_SECRET")?,
		redirect_uri: env_var("TOLLGATE_SERVER_GITHUB_REDIRECT_URI"),
		allowed_organizations: env_var("TOLLGATE_SERVER_GITHUB_ALLOWED_ORGANIZATIONS"),
		auth_url: env_var("TOLLGATE_SERVER_GITHUB_AUTH_URL"),
		token_url: env_var("TOLLGATE_SERVER_GITHUB_TOKEN_URL"),
		api_url: env_var("TOLLGATE_SERVER_GITHUB_API_URL"),
	};

	Ok(AuthConfigLayer {
		backend_order: env_backend_order("TOLLGATE_SERVER_AUTH_BACKEND_ORDER")?,
		static_users: None,
		directory: Some(directory),
		remote_user_store: Some(remote_user_store),
		github: Some(github),
		oauth_state_ttl_secs: env_u64("TOLLGATE_SERVER_OAUTH_STATE_TTL_SECS")?,
		oauth_state_cleanup_interval_secs: env_u64(
			"TOLLGATE_SERVER_OAUTH_STATE_CLEANUP_INTERVAL_SECS",
		)?,
	})
}

fn load_gerrit_from_env() -> Result<GerritConfigLayer, ConfigError> {
	Ok(GerritConfigLayer {
		url: env_var("TOLLGATE_SERVER_GERRIT_URL"),
		admin_user: env_var("TOLLGATE_SERVER_GERRIT_ADMIN_USER"),
		admin_password: load_secret_env("TOLLGATE_SERVER_GERRIT_ADMIN_PASSWORD")?,
		database_url: load_secret_env("TOLLGATE_SERVER_GERRIT_DATABASE_URL")?,
	})
}

fn load_redmine_from_env() -> Result<RedmineConfigLayer, ConfigError> {
	Ok(RedmineConfigLayer {
		api_url: env_var("TOLLGATE_SERVER_REDMINE_API_URL"),
		api_key: load_secret_env("TOLLGATE_SERVER_REDMINE_API_KEY")?,
	})
}
