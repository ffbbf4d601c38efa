// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Username/password login.

use axum::{
	extract::{Query, State},
	http::HeaderMap,
	response::Response,
	Form, Json,
};
use serde::{Deserialize, Serialize};
use tollgate_common_secret::SecretString;
use tollgate_server_auth::sanitize_redirect;

use crate::api::AppState;
use crate::error::ServerError;
use crate::routes::finish_login;

#[derive(Debug, Deserialize)]
pub struct BackQuery {
	pub back: Option<String>,
}

/// Login methods offered by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
	Password,
	Github,
	GithubPersonalToken,
}

/// Body of `GET /login`: what a login page needs to render itself.
#[derive(Debug, Serialize)]
pub struct LoginPageResponse {
	pub back: String,
	pub methods: Vec<LoginMethod>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub github_url: Option<String>,
	/// User of a still-valid session cookie, if the browser sent one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordLoginForm {
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub password: SecretString,
	pub back: Option<String>,
}

/// GET /login - describe the available login methods.
#[tracing::instrument(skip(state, query, headers))]
pub async fn login_page(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(query): Query<BackQuery>,
) -> Json<LoginPageResponse> {
	let back = sanitize_redirect(query.back.as_deref());

	let mut methods = Vec::new();
	if !state.authenticator.is_empty() {
		methods.push(LoginMethod::Password);
	}
	let github_url = state.github.as_ref().map(|_| {
		methods.push(LoginMethod::Github);
		methods.push(LoginMethod::GithubPersonalToken);
		format!("login/github/index?back={}", urlencoding::encode(&back))
	});

	Json(LoginPageResponse {
		back,
		methods,
		github_url,
		user: state.sessions.current_user(&headers),
	})
}

/// POST /login - validate credentials against the backend chain.
///
/// 303 to `back` with the ticket cookie on success, 401 otherwise.
#[tracing::instrument(skip(state, form), fields(username = %form.username))]
pub async fn login_password(
	State(state): State<AppState>,
	Form(form): Form<PasswordLoginForm>,
) -> Result<Response, ServerError> {
	let back = sanitize_redirect(form.back.as_deref());
	let user = state
		.authenticator
		.authenticate(&form.username, &form.password)
		.await?;
	finish_login(&state, user, back).await
}
