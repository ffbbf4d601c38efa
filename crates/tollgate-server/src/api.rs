// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
	routing::{get, post},
	Router,
};
use tollgate_server_auth::{CredentialAuthenticator, OAuthStateStore};
use tollgate_server_auth_github::{GitHubLogin, GitHubOAuthClient};
use tollgate_server_config::ServerConfig;
use tollgate_server_provisioning::ProvisioningService;

use crate::error::ServerError;
use crate::logout::LogoutCoordinator;
use crate::routes;
use crate::session::SessionIssuer;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub authenticator: Arc<CredentialAuthenticator>,
	pub github: Option<Arc<GitHubLogin>>,
	pub oauth_state_store: OAuthStateStore,
	pub sessions: Arc<SessionIssuer>,
	pub provisioning: Arc<ProvisioningService>,
	pub logout: Arc<LogoutCoordinator>,
}

/// Build the state from configuration.
///
/// Fails when the signing key cannot be loaded or a configured component
/// cannot be constructed. Nothing is generated on the fly.
#[tracing::instrument(skip(config))]
pub fn create_app_state(config: &ServerConfig) -> Result<AppState, ServerError> {
	let client =
		tollgate_common_http::client_with_timeout(Duration::from_secs(config.http.outbound_timeout_secs))?;

	let sessions = SessionIssuer::from_config(&config.session)?;
	tracing::info!(path = %config.session.private_key_path.display(), "ticket signing key loaded");

	let authenticator = CredentialAuthenticator::from_config(&config.auth, client.clone())?;

	let oauth_state_store =
		OAuthStateStore::with_ttl(Duration::from_secs(config.auth.oauth_state_ttl_secs));

	let github = match &config.auth.github {
		Some(github) => {
			let client = GitHubOAuthClient::new(github.clone(), client.clone())?;
			tracing::info!(
				allowed_organizations = ?client.allowed_organizations(),
				"GitHub login enabled"
			);
			Some(Arc::new(GitHubLogin::new(client, oauth_state_store.clone())))
		}
		None => None,
	};

	let provisioning = ProvisioningService::from_config(
		config.gerrit.as_ref(),
		config.redmine.as_ref(),
		&config.session.cookie_domain,
		client.clone(),
	)?;

	let logout = LogoutCoordinator::new(&config.session, &config.logout, client);

	Ok(AppState {
		authenticator: Arc::new(authenticator),
		github,
		oauth_state_store,
		sessions: Arc::new(sessions),
		provisioning: Arc::new(provisioning),
		logout: Arc::new(logout),
	})
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/login",
			get(routes::login::login_page).post(routes::login::login_password),
		)
		.route("/login/github/index", get(routes::github::login_github))
		.route("/login/github/callback", get(routes::github::callback_github))
		.route(
			"/login/githubAPIkey",
			post(routes::github::login_github_personal_token),
		)
		.route("/logout", get(routes::logout::logout))
		.with_state(state)
}
