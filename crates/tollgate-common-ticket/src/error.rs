// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

/// Errors produced while building, signing or verifying tickets.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
	/// The signature is missing, malformed, or does not match the fields.
	#[error("ticket signature invalid")]
	SignatureInvalid,

	/// The signature is valid but the `validuntil` window has elapsed.
	#[error("ticket expired")]
	TicketExpired,

	/// A field name or value cannot be represented in the ticket format.
	#[error("invalid ticket field {name:?}: {reason}")]
	InvalidField { name: String, reason: &'static str },

	/// The signing key file could not be read.
	#[error("failed to read signing key {path}: {source}")]
	KeyRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The key material is not a usable RSA key.
	#[error("invalid RSA key: {0}")]
	KeyLoad(String),

	/// The RSA signing operation failed.
	#[error("signing failed: {0}")]
	Signing(String),
}

impl TicketError {
	/// True for failures that mean "the presented ticket is not a session".
	///
	/// Callers treat these as an anonymous request and force a new login.
	pub fn is_rejection(&self) -> bool {
		matches!(self, TicketError::SignatureInvalid | TicketError::TicketExpired)
	}
}
