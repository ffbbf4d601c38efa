// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered credential chain.

use tollgate_common_secret::SecretString;
use tollgate_server_config::{AuthConfig, BackendName};
use tracing::{debug, info, instrument, warn};

use crate::backend::CredentialBackend;
use crate::error::AuthError;
use crate::remote_store::RemoteUserStoreBackend;
use crate::static_backend::StaticBackend;
use crate::user::{BackendKind, UserRecord};

#[cfg(feature = "ldap")]
use crate::directory::DirectoryBackend;

/// Tries each backend in order until one accepts the credentials.
///
/// Backends are consulted one at a time; results are never merged.
#[derive(Default)]
pub struct CredentialAuthenticator {
	backends: Vec<Box<dyn CredentialBackend>>,
}

impl CredentialAuthenticator {
	pub fn new(backends: Vec<Box<dyn CredentialBackend>>) -> Self {
		Self { backends }
	}

	/// Build the chain described by `auth.backend_order`.
	///
	/// `client` is shared by the HTTP-based backends and should carry the
	/// outbound timeout.
	pub fn from_config(auth: &AuthConfig, client: reqwest::Client) -> Result<Self, AuthError> {
		let mut backends: Vec<Box<dyn CredentialBackend>> = Vec::new();

		for name in &auth.backend_order {
			match name {
				BackendName::Static => {
					backends.push(Box::new(StaticBackend::new(auth.static_users.clone())));
				}
				BackendName::Directory => {
					let config = auth.directory.clone().ok_or_else(|| {
						AuthError::Configuration("directory backend enabled without settings".into())
					})?;
					#[cfg(feature = "ldap")]
					backends.push(Box::new(DirectoryBackend::ldap(config)));
					#[cfg(not(feature = "ldap"))]
					{
						let _ = config;
						return Err(AuthError::Configuration(
							"directory backend requires the `ldap` feature".into(),
						));
					}
				}
				BackendName::RemoteUserStore => {
					let config = auth.remote_user_store.as_ref().ok_or_else(|| {
						AuthError::Configuration(
							"remote user store backend enabled without settings".into(),
						)
					})?;
					backends.push(Box::new(RemoteUserStoreBackend::new(config, client.clone())));
				}
			}
		}

		info!(
			backends = ?backends.iter().map(|b| b.kind().as_str()).collect::<Vec<_>>(),
			"credential chain configured"
		);
		Ok(Self::new(backends))
	}

	/// Kinds of the configured backends, in consultation order.
	pub fn kinds(&self) -> Vec<BackendKind> {
		self.backends.iter().map(|b| b.kind()).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.backends.is_empty()
	}

	/// Validate `username`/`password` against the chain.
	///
	/// Empty credentials fail without consulting any backend. Backend
	/// infrastructure errors are logged and treated as "not applicable".
	#[instrument(skip(self, password), name = "credential_chain.authenticate")]
	pub async fn authenticate(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<UserRecord, AuthError> {
		if username.is_empty() || password.is_empty() {
			debug!("empty username or password");
			return Err(AuthError::AuthenticationFailed);
		}

		for backend in &self.backends {
			let kind = backend.kind();
			match backend.validate(username, password).await {
				Ok(Some(user)) => {
					info!(backend = %kind, "user authenticated");
					return Ok(user);
				}
				Ok(None) => {
					debug!(backend = %kind, "backend did not accept credentials");
				}
				Err(e) => {
					warn!(backend = %kind, error = %e, "credential backend failed, skipping");
				}
			}
		}

		info!("no credential backend accepted the login");
		Err(AuthError::AuthenticationFailed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::BackendError;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	enum Behaviour {
		Accept,
		Decline,
		Fail,
	}

	struct FakeBackend {
		kind: BackendKind,
		behaviour: Behaviour,
		calls: Arc<AtomicUsize>,
	}

	impl FakeBackend {
		fn boxed(kind: BackendKind, behaviour: Behaviour) -> (Box<dyn CredentialBackend>, Arc<AtomicUsize>) {
			let calls = Arc::new(AtomicUsize::new(0));
			(
				Box::new(FakeBackend {
					kind,
					behaviour,
					calls: calls.clone(),
				}),
				calls,
			)
		}
	}

	#[async_trait]
	impl CredentialBackend for FakeBackend {
		fn kind(&self) -> BackendKind {
			self.kind
		}

		async fn validate(
			&self,
			username: &str,
			_password: &SecretString,
		) -> Result<Option<UserRecord>, BackendError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			match self.behaviour {
				Behaviour::Accept => Ok(Some(
					UserRecord::new(username, "Fake", None, vec![], self.kind).unwrap(),
				)),
				Behaviour::Decline => Ok(None),
				Behaviour::Fail => Err(BackendError::Unreachable("down".into())),
			}
		}
	}

	fn password() -> SecretString {
		SecretString::from("userpass")
	}

	#[tokio::test]
	async fn first_success_wins_and_stops_chain() {
		let (a, a_calls) = FakeBackend::boxed(BackendKind::Static, Behaviour::Decline);
		let (b, b_calls) = FakeBackend::boxed(BackendKind::Directory, Behaviour::Accept);
		let (c, c_calls) = FakeBackend::boxed(BackendKind::RemoteUserStore, Behaviour::Accept);
		let chain = CredentialAuthenticator::new(vec![a, b, c]);

		let user = chain.authenticate("john", &password()).await.unwrap();
		assert_eq!(user.source(), BackendKind::Directory);
		assert_eq!(a_calls.load(Ordering::SeqCst), 1);
		assert_eq!(b_calls.load(Ordering::SeqCst), 1);
		assert_eq!(c_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn backend_failure_is_skipped() {
		let (a, _) = FakeBackend::boxed(BackendKind::Directory, Behaviour::Fail);
		let (b, _) = FakeBackend::boxed(BackendKind::RemoteUserStore, Behaviour::Accept);
		let chain = CredentialAuthenticator::new(vec![a, b]);

		let user = chain.authenticate("john", &password()).await.unwrap();
		assert_eq!(user.source(), BackendKind::RemoteUserStore);
	}

	#[tokio::test]
	async fn all_declining_fails() {
		let (a, _) = FakeBackend::boxed(BackendKind::Static, Behaviour::Decline);
		let (b, _) = FakeBackend::boxed(BackendKind::Directory, Behaviour::Fail);
		let chain = CredentialAuthenticator::new(vec![a, b]);

		assert!(matches!(
			chain.authenticate("john", &password()).await,
			Err(AuthError::AuthenticationFailed)
		));
	}

	#[tokio::test]
	async fn empty_credentials_skip_backends() {
		let (a, calls) = FakeBackend::boxed(BackendKind::Static, Behaviour::Accept);
		let chain = CredentialAuthenticator::new(vec![a]);

		assert!(chain.authenticate("", &password()).await.is_err());
		assert!(chain
			.authenticate("john", &SecretString::from(""))
			.await
			.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn empty_chain_fails() {
		let chain = CredentialAuthenticator::default();
		assert!(chain.is_empty());
		assert!(chain.authenticate("john", &password()).await.is_err());
	}

	#[test]
	fn from_config_follows_backend_order() {
		let config = AuthConfig {
			backend_order: vec![BackendName::RemoteUserStore, BackendName::Static],
			remote_user_store: Some(tollgate_server_config::RemoteUserStoreConfig {
				url: "http://manage.tests.dom/manage".to_string(),
			}),
			..Default::default()
		};
		let chain = CredentialAuthenticator::from_config(&config, reqwest::Client::new()).unwrap();
		assert_eq!(
			chain.kinds(),
			vec![BackendKind::RemoteUserStore, BackendKind::Static]
		);
	}

	#[test]
	fn from_config_rejects_order_without_settings() {
		let config = AuthConfig {
			backend_order: vec![BackendName::RemoteUserStore],
			..Default::default()
		};
		assert!(matches!(
			CredentialAuthenticator::from_config(&config, reqwest::Client::new()),
			Err(AuthError::Configuration(_))
		));
	}
}
