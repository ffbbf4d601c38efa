// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gerrit account provisioning over the authenticated REST API (`/a/`).

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use tollgate_common_secret::SecretString;
use tollgate_server_config::GerritConfig;
use tracing::{debug, info, instrument, warn};

use crate::error::ProvisioningError;
use crate::external_id::ExternalIdStore;
use crate::lenient_json;

/// What happened to a user's Gerrit account during one login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GerritReport {
	pub account_created: bool,
	pub account_id: Option<i64>,
	pub linked: bool,
	pub keys_installed: usize,
}

#[derive(Serialize)]
struct AccountInput<'a> {
	name: &'a str,
	email: &'a str,
}

pub struct GerritProvisioner {
	url: String,
	admin_user: String,
	admin_password: SecretString,
	client: reqwest::Client,
	external_ids: Option<Arc<dyn ExternalIdStore>>,
}

impl GerritProvisioner {
	/// `client` should carry the outbound timeout. Without an external id
	/// store the link step is skipped.
	pub fn new(
		config: &GerritConfig,
		client: reqwest::Client,
		external_ids: Option<Arc<dyn ExternalIdStore>>,
	) -> Self {
		Self {
			url: config.url.trim_end_matches('/').to_string(),
			admin_user: config.admin_user.clone(),
			admin_password: config.admin_password.clone(),
			client,
			external_ids,
		}
	}

	fn account_url(&self, username: &str) -> String {
		format!("{}/a/accounts/{}", self.url, urlencoding::encode(username))
	}

	/// Look up the numeric account id, `None` when unknown or on any failure.
	#[instrument(skip(self))]
	pub async fn get_account_id(&self, username: &str) -> Option<i64> {
		match self.fetch_account_id(username).await {
			Ok(id) => id,
			Err(e) => {
				warn!(error = %e, "Gerrit account lookup failed");
				None
			}
		}
	}

	async fn fetch_account_id(&self, username: &str) -> Result<Option<i64>, ProvisioningError> {
		let response = self
			.client
			.get(self.account_url(username))
			.basic_auth(&self.admin_user, Some(self.admin_password.expose()))
			.send()
			.await?;

		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !response.status().is_success() {
			return Err(ProvisioningError::from_response(response).await);
		}

		let body = response.text().await?;
		let account = lenient_json::parse_object(&body)
			.ok_or_else(|| ProvisioningError::Parse("no JSON object in account response".into()))?;
		Ok(account.get("_account_id").and_then(|id| id.as_i64()))
	}

	/// Create the account. Returns whether Gerrit accepted the request.
	#[instrument(skip(self, email))]
	pub async fn create_account(&self, username: &str, fullname: &str, email: &str) -> bool {
		let result = async {
			let response = self
				.client
				.put(self.account_url(username))
				.basic_auth(&self.admin_user, Some(self.admin_password.expose()))
				.json(&AccountInput {
					name: fullname,
					email,
				})
				.send()
				.await?;
			if !response.status().is_success() {
				return Err(ProvisioningError::from_response(response).await);
			}
			Ok::<_, ProvisioningError>(())
		}
		.await;

		match result {
			Ok(()) => {
				info!("Gerrit account created");
				true
			}
			Err(e) => {
				warn!(error = %e, "Gerrit account creation failed");
				false
			}
		}
	}

	/// Upload each key; a failing key does not stop the rest.
	///
	/// Returns the number of keys Gerrit accepted.
	#[instrument(skip(self, keys), fields(keys = keys.len()))]
	pub async fn install_ssh_keys(&self, username: &str, keys: &[String]) -> usize {
		let url = format!("{}/sshkeys", self.account_url(username));
		let mut installed = 0;

		for (index, key) in keys.iter().enumerate() {
			let result = async {
				let response = self
					.client
					.post(&url)
					.basic_auth(&self.admin_user, Some(self.admin_password.expose()))
					.header(CONTENT_TYPE, "text/plain")
					.body(key.clone())
					.send()
					.await?;
				if !response.status().is_success() {
					return Err(ProvisioningError::from_response(response).await);
				}
				Ok::<_, ProvisioningError>(())
			}
			.await;

			match result {
				Ok(()) => installed += 1,
				Err(e) => warn!(index, error = %e, "could not install SSH key"),
			}
		}

		debug!(installed, "SSH keys installed");
		installed
	}

	/// Make sure the account exists, is linked to its external id and
	/// carries the user's keys.
	#[instrument(skip(self, fullname, email, keys), name = "gerrit.provision")]
	pub async fn provision(
		&self,
		username: &str,
		fullname: &str,
		email: &str,
		keys: &[String],
	) -> GerritReport {
		let mut report = GerritReport::default();

		let mut account_id = self.get_account_id(username).await;
		if account_id.is_none() {
			report.account_created = self.create_account(username, fullname, email).await;
			account_id = self.get_account_id(username).await;
		}
		report.account_id = account_id;

		match (account_id, &self.external_ids) {
			(Some(id), Some(store)) => {
				report.linked = store.add_external_id(id, username).await;
			}
			(None, _) => warn!("no Gerrit account id, skipping external id link"),
			(Some(_), None) => debug!("no review database configured, skipping external id link"),
		}

		report.keys_installed = self.install_ssh_keys(username, keys).await;
		report
	}
}
