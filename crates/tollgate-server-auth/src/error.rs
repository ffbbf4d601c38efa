// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication error types.

use thiserror::Error;

/// Errors surfaced by the login flows.
///
/// Only the first three variants are ever shown to a user; the rest are
/// operator problems and map to a 500.
#[derive(Debug, Error)]
pub enum AuthError {
	/// No credential backend (or the OAuth provider) accepted the identity.
	#[error("authentication failed")]
	AuthenticationFailed,

	/// The GitHub user is not a member of any allowed organization.
	#[error("user is not a member of an allowed organization")]
	OrganizationNotAllowed,

	/// The OAuth `state` is unknown, expired or already used.
	#[error("invalid or expired OAuth state")]
	InvalidOAuthState,

	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl AuthError {
	/// HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			AuthError::AuthenticationFailed
			| AuthError::OrganizationNotAllowed
			| AuthError::InvalidOAuthState => 401,
			AuthError::Configuration(_) | AuthError::Internal(_) => 500,
		}
	}

	/// Whether the details of this error must stay out of responses.
	pub fn is_internal(&self) -> bool {
		matches!(self, AuthError::Configuration(_) | AuthError::Internal(_))
	}
}

/// Infrastructure failure inside a single credential backend.
///
/// The authenticator logs these and moves on to the next backend.
#[derive(Debug, Error)]
pub enum BackendError {
	#[error("backend unreachable: {0}")]
	Unreachable(String),

	#[error("backend timed out after {0} seconds")]
	Timeout(u64),

	#[error("unexpected backend response: {0}")]
	InvalidResponse(String),
}

impl From<reqwest::Error> for BackendError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			BackendError::Unreachable(format!("request timed out: {e}"))
		} else if e.is_decode() {
			BackendError::InvalidResponse(e.to_string())
		} else {
			BackendError::Unreachable(e.to_string())
		}
	}
}
