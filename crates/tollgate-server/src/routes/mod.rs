// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod github;
pub mod health;
pub mod login;
pub mod logout;

use axum::{
	http::{
		header::{LOCATION, SET_COOKIE},
		StatusCode,
	},
	response::{IntoResponse, Response},
};
use tollgate_server_auth::UserRecord;

use crate::api::AppState;
use crate::error::ServerError;

/// Shared tail of every login flow: provision, issue the ticket cookie and
/// send the browser back to `back` (already sanitized).
pub(crate) async fn finish_login(
	state: &AppState,
	user: UserRecord,
	back: String,
) -> Result<Response, ServerError> {
	let report = state.provisioning.provision(&user).await;
	tracing::debug!(?report, "provisioning report");

	let cookie = state.sessions.issue_cookie(user.username())?;
	tracing::info!(username = %user.username(), source = %user.source(), "session issued");

	Ok((StatusCode::SEE_OTHER, [(LOCATION, back), (SET_COOKIE, cookie)]).into_response())
}
