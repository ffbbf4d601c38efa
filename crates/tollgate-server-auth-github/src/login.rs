// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The two GitHub login flows: authorization code and personal access token.

use tollgate_common_secret::SecretString;
use tollgate_server_auth::{
	generate_state, sanitize_redirect, AuthError, OAuthStateStore, UserRecord,
};
use tracing::{info, instrument, warn};

use crate::client::{GitHubOAuthClient, GitHubToken, OAuthError};

/// Ties the OAuth client to the nonce store.
#[derive(Debug, Clone)]
pub struct GitHubLogin {
	client: GitHubOAuthClient,
	states: OAuthStateStore,
}

impl GitHubLogin {
	pub fn new(client: GitHubOAuthClient, states: OAuthStateStore) -> Self {
		Self { client, states }
	}

	pub fn client(&self) -> &GitHubOAuthClient {
		&self.client
	}

	pub fn states(&self) -> &OAuthStateStore {
		&self.states
	}

	/// Store a fresh nonce with the sanitized return URL and build the
	/// provider URL to redirect the browser to.
	#[instrument(skip(self, back))]
	pub async fn build_authorize_redirect(&self, back: Option<&str>) -> String {
		let state = generate_state();
		let return_url = sanitize_redirect(back);
		self.states.put(state.clone(), return_url).await;
		self.client.authorization_url(&state)
	}

	/// Finish the code flow. Returns the identity and the stored return URL.
	///
	/// The nonce is consumed before anything else happens, so a replayed
	/// callback fails even if the first attempt failed later on.
	#[instrument(skip(self, state, code), name = "github_login.complete_callback")]
	pub async fn complete_callback(
		&self,
		state: &str,
		code: &str,
	) -> Result<(UserRecord, String), AuthError> {
		let return_url = self.states.consume(state).await?;

		if code.is_empty() {
			warn!("GitHub callback without a code");
			return Err(AuthError::AuthenticationFailed);
		}

		let token = self.client.exchange_code(code).await.map_err(rejected)?;
		let token = GitHubToken::header(token);
		let user = self.verify(&token).await?;
		Ok((user, return_url))
	}

	/// Authenticate with a personal access token presented as basic auth.
	#[instrument(skip(self, token), name = "github_login.personal_token")]
	pub async fn authenticate_personal_token(
		&self,
		token: &SecretString,
	) -> Result<UserRecord, AuthError> {
		if token.is_empty() {
			return Err(AuthError::AuthenticationFailed);
		}
		self.verify(&GitHubToken::basic(token.clone())).await
	}

	async fn verify(&self, token: &GitHubToken) -> Result<UserRecord, AuthError> {
		if !self.client.organization_allowed(token).await.map_err(rejected)? {
			info!("GitHub user is outside the allowed organizations");
			return Err(AuthError::OrganizationNotAllowed);
		}

		let user = self.client.fetch_identity(token).await.map_err(rejected)?;
		info!(username = %user.username(), source = %user.source(), "GitHub login accepted");
		Ok(user)
	}
}

/// Provider failures are reported to the user as a failed login.
fn rejected(e: OAuthError) -> AuthError {
	warn!(error = %e, "GitHub request failed");
	AuthError::AuthenticationFailed
}
