// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning orchestration run after every successful login.

use std::sync::Arc;

use serde::Serialize;
use tollgate_server_auth::UserRecord;
use tollgate_server_config::{GerritConfig, RedmineConfig};
use tracing::{info, instrument, warn};

use crate::error::ProvisioningError;
use crate::external_id::{ExternalIdStore, SqlExternalIdStore};
use crate::gerrit::{GerritProvisioner, GerritReport};
use crate::redmine::RedmineProvisioner;

/// Outcome of provisioning one user. `None` means the target is not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
	pub gerrit: Option<GerritReport>,
	pub redmine: Option<bool>,
}

pub struct ProvisioningService {
	gerrit: Option<GerritProvisioner>,
	redmine: Option<RedmineProvisioner>,
	cookie_domain: String,
}

impl ProvisioningService {
	pub fn new(
		gerrit: Option<GerritProvisioner>,
		redmine: Option<RedmineProvisioner>,
		cookie_domain: impl Into<String>,
	) -> Self {
		Self {
			gerrit,
			redmine,
			cookie_domain: cookie_domain.into(),
		}
	}

	/// A service that provisions nothing.
	pub fn disabled(cookie_domain: impl Into<String>) -> Self {
		Self::new(None, None, cookie_domain)
	}

	/// Build the configured provisioners around a shared HTTP client.
	///
	/// The review database pool connects lazily; only a malformed URL fails here.
	pub fn from_config(
		gerrit: Option<&GerritConfig>,
		redmine: Option<&RedmineConfig>,
		cookie_domain: &str,
		client: reqwest::Client,
	) -> Result<Self, ProvisioningError> {
		let gerrit = match gerrit {
			Some(config) => {
				let external_ids = match &config.database_url {
					Some(url) => Some(
						Arc::new(SqlExternalIdStore::connect_lazy(url)?) as Arc<dyn ExternalIdStore>
					),
					None => None,
				};
				Some(GerritProvisioner::new(config, client.clone(), external_ids))
			}
			None => None,
		};
		let redmine = redmine.map(|config| RedmineProvisioner::new(config, client));

		info!(
			gerrit = gerrit.is_some(),
			redmine = redmine.is_some(),
			"provisioning configured"
		);
		Ok(Self::new(gerrit, redmine, cookie_domain))
	}

	pub fn is_enabled(&self) -> bool {
		self.gerrit.is_some() || self.redmine.is_some()
	}

	/// Address used when the identity carries no email.
	pub fn fallback_email(&self, username: &str) -> String {
		format!("{username}@{}", self.cookie_domain)
	}

	/// Provision `user` in every configured target. Never fails; each
	/// step's outcome is reported.
	#[instrument(skip(self, user), fields(username = %user.username(), source = %user.source()))]
	pub async fn provision(&self, user: &UserRecord) -> ProvisioningReport {
		let email = user
			.email()
			.map(str::to_string)
			.unwrap_or_else(|| self.fallback_email(user.username()));
		self
			.run(user.username(), user.fullname(), &email, user.ssh_keys())
			.await
	}

	/// Create placeholder accounts for a user who has not logged in yet.
	#[instrument(skip(self))]
	pub async fn pre_register(&self, username: &str) -> ProvisioningReport {
		if username.trim().is_empty() {
			warn!("refusing to pre-register an empty username");
			return ProvisioningReport::default();
		}
		let fullname = format!("User {username}");
		let email = self.fallback_email(username);
		self.run(username, &fullname, &email, &[]).await
	}

	async fn run(
		&self,
		username: &str,
		fullname: &str,
		email: &str,
		keys: &[String],
	) -> ProvisioningReport {
		let mut report = ProvisioningReport::default();

		if let Some(gerrit) = &self.gerrit {
			report.gerrit = Some(gerrit.provision(username, fullname, email, keys).await);
		}
		if let Some(redmine) = &self.redmine {
			report.redmine = Some(redmine.create_user(username, fullname, email).await);
		}

		info!(?report, "provisioning finished");
		report
	}
}
