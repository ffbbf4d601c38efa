// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! LDAP directory backend: simple bind as the user, then read name and mail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tollgate_common_secret::SecretString;
use tollgate_server_config::{DirectoryConfig, USERNAME_PLACEHOLDER};
use tracing::{debug, instrument};

use crate::backend::CredentialBackend;
use crate::error::BackendError;
use crate::user::{BackendKind, UserRecord};

/// Outcome of a bind attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryBind {
	/// The server refused the credentials.
	Rejected,
	/// Bind succeeded; attributes read from the bound entry.
	Accepted(HashMap<String, Vec<String>>),
}

/// The LDAP operations the backend needs.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
	/// Bind as `dn` and read `attrs` from that entry.
	async fn bind_and_read(
		&self,
		dn: &str,
		password: &SecretString,
		attrs: &[String],
	) -> Result<DirectoryBind, BackendError>;
}

pub struct DirectoryBackend {
	config: DirectoryConfig,
	connector: Arc<dyn DirectoryConnector>,
}

impl DirectoryBackend {
	pub fn new(config: DirectoryConfig, connector: Arc<dyn DirectoryConnector>) -> Self {
		Self { config, connector }
	}

	/// Backend talking to the configured server with `ldap3`.
	#[cfg(feature = "ldap")]
	pub fn ldap(config: DirectoryConfig) -> Self {
		let connector = Arc::new(LdapConnector::new(
			config.url.clone(),
			Duration::from_secs(config.timeout_secs),
		));
		Self::new(config, connector)
	}

	pub fn bind_dn(&self, username: &str) -> String {
		self
			.config
			.bind_dn_template
			.replace(USERNAME_PLACEHOLDER, &escape_dn_value(username))
	}
}

#[async_trait]
impl CredentialBackend for DirectoryBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Directory
	}

	#[instrument(skip(self, password), name = "directory_backend.validate")]
	async fn validate(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<Option<UserRecord>, BackendError> {
		// An empty password turns a simple bind into an anonymous bind, which succeeds.
		if password.is_empty() {
			return Ok(None);
		}

		let dn = self.bind_dn(username);
		let attrs = vec![self.config.surname_attr.clone(), self.config.mail_attr.clone()];
		let timeout = Duration::from_secs(self.config.timeout_secs);

		let outcome = tokio::time::timeout(
			timeout,
			self.connector.bind_and_read(&dn, password, &attrs),
		)
		.await
		.map_err(|_| BackendError::Timeout(self.config.timeout_secs))??;

		let attrs = match outcome {
			DirectoryBind::Rejected => {
				debug!("directory bind rejected");
				return Ok(None);
			}
			DirectoryBind::Accepted(attrs) => attrs,
		};

		let first = |name: &str| {
			attrs
				.get(name)
				.and_then(|values| values.first())
				.filter(|v| !v.is_empty())
				.cloned()
		};

		let fullname = first(&self.config.surname_attr).unwrap_or_else(|| username.to_string());
		let email = first(&self.config.mail_attr);

		Ok(UserRecord::new(username, fullname, email, Vec::new(), BackendKind::Directory).ok())
	}
}

/// Escape a value for use inside a DN attribute value (RFC 4514, section 2.4).
pub fn escape_dn_value(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	let last = value.chars().count().saturating_sub(1);
	for (i, c) in value.chars().enumerate() {
		match c {
			',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
				out.push('\\');
				out.push(c);
			}
			'\0' => out.push_str("\\00"),
			' ' if i == 0 || i == last => out.push_str("\\ "),
			'#' if i == 0 => out.push_str("\\#"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(feature = "ldap")]
pub use ldap_impl::LdapConnector;

#[cfg(feature = "ldap")]
mod ldap_impl {
	use super::*;
	use ldap3::{LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
	use tracing::warn;

	/// LDAP result code for a refused simple bind.
	const INVALID_CREDENTIALS: u32 = 49;

	/// [`DirectoryConnector`] backed by a fresh `ldap3` connection per attempt.
	#[derive(Debug, Clone)]
	pub struct LdapConnector {
		url: String,
		timeout: Duration,
	}

	impl LdapConnector {
		pub fn new(url: String, timeout: Duration) -> Self {
			Self { url, timeout }
		}
	}

	fn unreachable(e: LdapError) -> BackendError {
		BackendError::Unreachable(e.to_string())
	}

	#[async_trait]
	impl DirectoryConnector for LdapConnector {
		async fn bind_and_read(
			&self,
			dn: &str,
			password: &SecretString,
			attrs: &[String],
		) -> Result<DirectoryBind, BackendError> {
			let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
			let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.url)
				.await
				.map_err(unreachable)?;
			ldap3::drive!(conn);

			let bind = ldap
				.simple_bind(dn, password.expose())
				.await
				.map_err(unreachable)?;
			if bind.rc == INVALID_CREDENTIALS {
				let _ = ldap.unbind().await;
				return Ok(DirectoryBind::Rejected);
			}
			if bind.rc != 0 {
				let _ = ldap.unbind().await;
				return Err(BackendError::InvalidResponse(format!(
					"bind returned result code {}",
					bind.rc
				)));
			}

			let (entries, _) = ldap
				.search(dn, Scope::Base, "(objectClass=*)", attrs.to_vec())
				.await
				.and_then(|r| r.success())
				.map_err(unreachable)?;

			let mut found = HashMap::new();
			for entry in entries {
				found.extend(SearchEntry::construct(entry).attrs);
			}

			if let Err(e) = ldap.unbind().await {
				warn!(error = %e, "LDAP unbind failed");
			}
			Ok(DirectoryBind::Accepted(found))
		}
	}
}
