// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub login routes: authorize redirect, callback and personal access token.

use axum::{
	extract::{Query, State},
	http::{header::LOCATION, StatusCode},
	response::{IntoResponse, Response},
	Form,
};
use serde::Deserialize;
use tollgate_common_secret::SecretString;
use tollgate_server_auth::{sanitize_redirect, AuthError};
use tollgate_server_auth_github::GitHubLogin;

use crate::api::AppState;
use crate::error::ServerError;
use crate::routes::finish_login;
use crate::routes::login::BackQuery;

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonalTokenForm {
	#[serde(default)]
	pub token: SecretString,
	pub back: Option<String>,
}

fn github(state: &AppState) -> Result<&GitHubLogin, ServerError> {
	state
		.github
		.as_deref()
		.ok_or(ServerError::NotConfigured("GitHub"))
}

/// GET /login/github/index - send the browser to GitHub.
#[tracing::instrument(skip(state, query), fields(provider = "github"))]
pub async fn login_github(
	State(state): State<AppState>,
	Query(query): Query<BackQuery>,
) -> Result<Response, ServerError> {
	let github = github(&state)?;
	let url = github.build_authorize_redirect(query.back.as_deref()).await;
	Ok((StatusCode::FOUND, [(LOCATION, url)]).into_response())
}

/// GET /login/github/callback - finish the authorization code flow.
///
/// Never log the code or the state.
#[tracing::instrument(skip(state, query), fields(provider = "github"))]
pub async fn callback_github(
	State(state): State<AppState>,
	Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, ServerError> {
	let github = github(&state)?;

	let Some(oauth_state) = query.state.as_deref() else {
		return Err(AuthError::InvalidOAuthState.into());
	};

	if let Some(error) = &query.error {
		tracing::warn!(error = %error, "GitHub authorization refused");
		// Burn the nonce so the flow cannot be resumed.
		github.states().consume(oauth_state).await?;
		return Err(AuthError::AuthenticationFailed.into());
	}

	let code = query.code.as_deref().unwrap_or_default();
	let (user, back) = github.complete_callback(oauth_state, code).await?;
	finish_login(&state, user, back).await
}

/// POST /login/githubAPIkey - log in with a GitHub personal access token.
#[tracing::instrument(skip(state, form), fields(provider = "github"))]
pub async fn login_github_personal_token(
	State(state): State<AppState>,
	Form(form): Form<PersonalTokenForm>,
) -> Result<Response, ServerError> {
	let github = github(&state)?;
	let back = sanitize_redirect(form.back.as_deref());
	let user = github.authenticate_personal_token(&form.token).await?;
	finish_login(&state, user, back).await
}
