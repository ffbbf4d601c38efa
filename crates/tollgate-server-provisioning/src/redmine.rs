// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redmine user creation through the REST API.

use reqwest::StatusCode;
use serde::Serialize;
use tollgate_common_secret::SecretString;
use tollgate_server_config::RedmineConfig;
use tracing::{debug, info, instrument, warn};

use crate::error::ProvisioningError;

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

#[derive(Debug, Serialize)]
struct NewUser<'a> {
	login: &'a str,
	firstname: &'a str,
	lastname: &'a str,
	mail: &'a str,
}

#[derive(Debug, Serialize)]
struct NewUserRequest<'a> {
	user: NewUser<'a>,
}

/// Split a display name into Redmine's first and last name, both non-empty.
pub fn split_name(fullname: &str) -> (&str, &str) {
	let fullname = fullname.trim();
	match fullname.split_once(char::is_whitespace) {
		Some((first, last)) if !last.trim().is_empty() => (first, last.trim()),
		_ => (fullname, fullname),
	}
}

pub struct RedmineProvisioner {
	users_url: String,
	api_key: SecretString,
	client: reqwest::Client,
}

impl RedmineProvisioner {
	/// `client` should carry the outbound timeout.
	pub fn new(config: &RedmineConfig, client: reqwest::Client) -> Self {
		Self {
			users_url: format!("{}/users.json", config.api_url.trim_end_matches('/')),
			api_key: config.api_key.clone(),
			client,
		}
	}

	/// Create the user. An existing login counts as success.
	#[instrument(skip(self, fullname, email), name = "redmine.create_user")]
	pub async fn create_user(&self, username: &str, fullname: &str, email: &str) -> bool {
		match self.post_user(username, fullname, email).await {
			Ok(created) => {
				if created {
					info!("Redmine user created");
				} else {
					debug!("Redmine user already exists");
				}
				true
			}
			Err(e) => {
				warn!(error = %e, "Redmine user creation failed");
				false
			}
		}
	}

	/// `Ok(true)` when created, `Ok(false)` when the login was already taken.
	async fn post_user(
		&self,
		username: &str,
		fullname: &str,
		email: &str,
	) -> Result<bool, ProvisioningError> {
		let (firstname, lastname) = split_name(fullname);
		let response = self
			.client
			.post(&self.users_url)
			.header(API_KEY_HEADER, self.api_key.expose())
			.json(&NewUserRequest {
				user: NewUser {
					login: username,
					firstname,
					lastname,
					mail: email,
				},
			})
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			return Ok(true);
		}
		if status == StatusCode::UNPROCESSABLE_ENTITY {
			let body = response.text().await.unwrap_or_default();
			if body.contains("already been taken") {
				return Ok(false);
			}
			return Err(ProvisioningError::Status {
				status: status.as_u16(),
				body,
			});
		}
		Err(ProvisioningError::from_response(response).await)
	}
}
