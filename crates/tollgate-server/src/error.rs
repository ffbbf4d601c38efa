// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;
use tollgate_common_ticket::TicketError;
use tollgate_server_auth::AuthError;
use tollgate_server_auth_github::OAuthError;
use tollgate_server_config::ConfigError;
use tollgate_server_provisioning::ProvisioningError;

/// Errors raised while starting the server or handling a request.
///
/// Startup errors are fatal. At request time only the login failures of
/// [`AuthError`] are shown to the user; everything else becomes a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("ticket error: {0}")]
	Ticket(#[from] TicketError),

	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error("GitHub client error: {0}")]
	GitHub(#[from] OAuthError),

	#[error("provisioning setup failed: {0}")]
	Provisioning(#[from] ProvisioningError),

	#[error("HTTP client error: {0}")]
	HttpClient(#[from] reqwest::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The requested login method is not set up on this server.
	#[error("{0} login is not configured")]
	NotConfigured(&'static str),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error, message) = match &self {
			ServerError::Auth(e) if !e.is_internal() => {
				let code = match e {
					AuthError::OrganizationNotAllowed => "organization_not_allowed",
					AuthError::InvalidOAuthState => "invalid_state",
					_ => "authentication_failed",
				};
				(StatusCode::UNAUTHORIZED, code, e.to_string())
			}
			ServerError::NotConfigured(_) => {
				(StatusCode::NOT_IMPLEMENTED, "not_configured", self.to_string())
			}
			_ => {
				tracing::error!(error = %self, "request failed");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"internal server error".to_string(),
				)
			}
		};

		(
			status,
			Json(ErrorResponse {
				error: error.to_string(),
				message,
			}),
		)
			.into_response()
	}
}
