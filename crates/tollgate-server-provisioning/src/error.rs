// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors from a single provisioning step.
///
/// These never leave the crate's public operations; each step logs its
/// error and reports a boolean instead.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("unexpected status {status}: {body}")]
	Status { status: u16, body: String },

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("failed to parse response: {0}")]
	Parse(String),
}

impl ProvisioningError {
	/// Build a [`ProvisioningError::Status`] from a non-success response.
	pub(crate) async fn from_response(response: reqwest::Response) -> Self {
		let status = response.status().as_u16();
		let body = response.text().await.unwrap_or_default();
		ProvisioningError::Status { status, body }
	}
}
