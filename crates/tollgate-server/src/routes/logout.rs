// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::State,
	http::header::SET_COOKIE,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;

use crate::api::AppState;
use crate::logout::ServiceLogout;

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
	pub message: String,
	pub services: Vec<ServiceLogout>,
}

/// GET /logout - clear the ticket cookie and end downstream sessions.
#[tracing::instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
	let outcome = state.logout.logout().await;

	(
		[(SET_COOKIE, outcome.clear_cookie)],
		Json(LogoutResponse {
			message: "logged out".to_string(),
			services: outcome.services,
		}),
	)
		.into_response()
}
