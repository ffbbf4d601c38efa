// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated identity handed from a backend to provisioning and ticket issuance.

use std::fmt;

use serde::Serialize;

use crate::error::AuthError;

/// Where an identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	Static,
	Directory,
	RemoteUserStore,
	Github,
	GithubPersonalToken,
}

impl BackendKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			BackendKind::Static => "static",
			BackendKind::Directory => "directory",
			BackendKind::RemoteUserStore => "remote_user_store",
			BackendKind::Github => "github",
			BackendKind::GithubPersonalToken => "github_personal_token",
		}
	}
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<tollgate_server_config::BackendName> for BackendKind {
	fn from(name: tollgate_server_config::BackendName) -> Self {
		use tollgate_server_config::BackendName;
		match name {
			BackendName::Static => BackendKind::Static,
			BackendName::Directory => BackendKind::Directory,
			BackendName::RemoteUserStore => BackendKind::RemoteUserStore,
		}
	}
}

/// An authenticated user. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
	username: String,
	fullname: String,
	email: Option<String>,
	ssh_keys: Vec<String>,
	source: BackendKind,
}

impl UserRecord {
	/// Build a record. The username must be non-empty and must not contain
	/// `;` or control characters, since it travels as the ticket `uid`. An
	/// empty full name falls back to the username and empty emails or keys
	/// are dropped.
	pub fn new(
		username: impl Into<String>,
		fullname: impl Into<String>,
		email: Option<String>,
		ssh_keys: Vec<String>,
		source: BackendKind,
	) -> Result<Self, AuthError> {
		let username = username.into();
		if username.trim().is_empty() {
			return Err(AuthError::Internal(format!(
				"{source} backend produced an empty username"
			)));
		}
		if username.chars().any(|c| c == ';' || c.is_control()) {
			return Err(AuthError::Internal(format!(
				"{source} backend produced a username that cannot be carried in a ticket"
			)));
		}
		let fullname = fullname.into();
		let fullname = if fullname.trim().is_empty() {
			username.clone()
		} else {
			fullname
		};

		Ok(Self {
			username,
			fullname,
			email: email.filter(|e| !e.trim().is_empty()),
			ssh_keys: ssh_keys
				.into_iter()
				.filter(|k| !k.trim().is_empty())
				.collect(),
			source,
		})
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn fullname(&self) -> &str {
		&self.fullname
	}

	pub fn email(&self) -> Option<&str> {
		self.email.as_deref()
	}

	pub fn ssh_keys(&self) -> &[String] {
		&self.ssh_keys
	}

	pub fn source(&self) -> BackendKind {
		self.source
	}
}
