// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential check against a remote user store over HTTP basic auth.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tollgate_common_secret::SecretString;
use tollgate_server_config::RemoteUserStoreConfig;
use tracing::{debug, instrument};

use crate::backend::CredentialBackend;
use crate::error::BackendError;
use crate::user::{BackendKind, UserRecord};

/// Body returned by `GET <url>/bind` on success.
#[derive(Debug, Deserialize)]
struct BindResponse {
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	fullname: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	sshkey: Option<String>,
}

pub struct RemoteUserStoreBackend {
	bind_url: String,
	client: reqwest::Client,
}

impl RemoteUserStoreBackend {
	/// `client` should carry the outbound timeout.
	pub fn new(config: &RemoteUserStoreConfig, client: reqwest::Client) -> Self {
		Self {
			bind_url: format!("{}/bind", config.url.trim_end_matches('/')),
			client,
		}
	}
}

#[async_trait]
impl CredentialBackend for RemoteUserStoreBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::RemoteUserStore
	}

	#[instrument(skip(self, password), name = "remote_user_store.validate")]
	async fn validate(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<Option<UserRecord>, BackendError> {
		let response = self
			.client
			.get(&self.bind_url)
			.basic_auth(username, Some(password.expose()))
			.send()
			.await?;

		if response.status() != StatusCode::OK {
			debug!(status = %response.status(), "user store refused credentials");
			return Ok(None);
		}

		let body: BindResponse = response
			.json()
			.await
			.map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

		// The store may canonicalize the login; trust its answer when present.
		let username = body
			.username
			.filter(|u| !u.is_empty())
			.unwrap_or_else(|| username.to_string());
		let ssh_keys = body.sshkey.into_iter().collect();

		Ok(UserRecord::new(
			username,
			body.fullname.unwrap_or_default(),
			body.email,
			ssh_keys,
			BackendKind::RemoteUserStore,
		)
		.ok())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{basic_auth, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn backend(server: &MockServer) -> RemoteUserStoreBackend {
		let config = RemoteUserStoreConfig {
			url: format!("{}/manage", server.uri()),
		};
		RemoteUserStoreBackend::new(&config, reqwest::Client::new())
	}

	#[tokio::test]
	async fn accepted_credentials_build_record() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/manage/bind"))
			.and(basic_auth("john", "userpass"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"username": "john",
				"fullname": "John Doe",
				"email": "john@tests.dom",
				"sshkey": "ssh-rsa AAAA john@host",
			})))
			.expect(1)
			.mount(&server)
			.await;

		let user = backend(&server)
			.await
			.validate("john", &SecretString::from("userpass"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(user.username(), "john");
		assert_eq!(user.fullname(), "John Doe");
		assert_eq!(user.email(), Some("john@tests.dom"));
		assert_eq!(user.ssh_keys(), ["ssh-rsa AAAA john@host"]);
		assert_eq!(user.source(), BackendKind::RemoteUserStore);
	}

	#[tokio::test]
	async fn empty_sshkey_gives_no_keys() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/manage/bind"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"username": "john",
				"fullname": "John Doe",
				"email": "john@tests.dom",
				"sshkey": "",
			})))
			.mount(&server)
			.await;

		let user = backend(&server)
			.await
			.validate("john", &SecretString::from("userpass"))
			.await
			.unwrap()
			.unwrap();
		assert!(user.ssh_keys().is_empty());
	}

	#[tokio::test]
	async fn canonical_login_with_semicolon_is_not_applicable() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/manage/bind"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"username": "john;admin",
				"fullname": "John Doe",
			})))
			.mount(&server)
			.await;

		let result = backend(&server)
			.await
			.validate("john", &SecretString::from("userpass"))
			.await
			.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn unauthorized_is_not_applicable() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/manage/bind"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let result = backend(&server)
			.await
			.validate("john", &SecretString::from("badpass"))
			.await
			.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn garbage_body_is_an_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/manage/bind"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
			.mount(&server)
			.await;

		let result = backend(&server)
			.await
			.validate("john", &SecretString::from("userpass"))
			.await;
		assert!(matches!(result, Err(BackendError::InvalidResponse(_))));
	}

	#[tokio::test]
	async fn unreachable_store_is_an_error() {
		let config = RemoteUserStoreConfig {
			url: "http://127.0.0.1:1".to_string(),
		};
		let backend = RemoteUserStoreBackend::new(&config, reqwest::Client::new());
		let result = backend
			.validate("john", &SecretString::from("userpass"))
			.await;
		assert!(matches!(result, Err(BackendError::Unreachable(_))));
	}
}
