// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use tollgate_common_secret::SecretString;
use tollgate_server_config::StaticUserConfig;
use tracing::{debug, instrument};

use crate::backend::CredentialBackend;
use crate::error::BackendError;
use crate::password::verify_password_hash;
use crate::user::{BackendKind, UserRecord};

/// Users declared in the configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
	users: BTreeMap<String, StaticUserConfig>,
}

impl StaticBackend {
	pub fn new(users: BTreeMap<String, StaticUserConfig>) -> Self {
		Self { users }
	}

	pub fn len(&self) -> usize {
		self.users.len()
	}

	pub fn is_empty(&self) -> bool {
		self.users.is_empty()
	}
}

#[async_trait]
impl CredentialBackend for StaticBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Static
	}

	#[instrument(skip(self, password), name = "static_backend.validate")]
	async fn validate(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<Option<UserRecord>, BackendError> {
		let Some(user) = self.users.get(username) else {
			debug!("unknown static user");
			return Ok(None);
		};

		if !verify_password_hash(password.expose(), &user.password_hash) {
			debug!("static password mismatch");
			return Ok(None);
		}

		let fullname = user.fullname.clone().unwrap_or_default();
		Ok(UserRecord::new(
			username,
			fullname,
			user.email.clone(),
			Vec::new(),
			BackendKind::Static,
		)
		.ok())
	}
}
