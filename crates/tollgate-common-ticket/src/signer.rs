// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::error::TicketError;
use crate::fields::{TicketFields, SIG_FIELD, UID_FIELD, VALID_UNTIL_FIELD};

/// Default validity window of an issued ticket (12 hours).
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(43_200);

const SIG_SEPARATOR: &str = ";sig=";

/// Current time as unix seconds.
pub fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// Issues tickets with the broker's private key.
///
/// Constructed once at process start and shared read-only (`Arc`) between
/// request handlers.
pub struct TicketSigner {
	signing_key: SigningKey<Sha256>,
	verifier: TicketVerifier,
	validity: Duration,
}

impl fmt::Debug for TicketSigner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TicketSigner")
			.field("signing_key", &"[REDACTED]")
			.field("validity", &self.validity)
			.finish()
	}
}

impl TicketSigner {
	/// Load a PEM encoded RSA private key (PKCS#8 or PKCS#1) from disk.
	///
	/// A missing file is an error: keys are provisioned by the operator and
	/// never generated at runtime.
	#[instrument(skip_all, fields(path = %path.as_ref().display()))]
	pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, TicketError> {
		let path = path.as_ref();
		let pem = std::fs::read_to_string(path).map_err(|source| TicketError::KeyRead {
			path: path.to_path_buf(),
			source,
		})?;
		let signer = Self::from_pem(&pem)?;
		debug!("loaded ticket signing key");
		Ok(signer)
	}

	/// Parse a PEM encoded RSA private key (PKCS#8 or PKCS#1).
	pub fn from_pem(pem: &str) -> Result<Self, TicketError> {
		let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
			.or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
			.map_err(|e| TicketError::KeyLoad(e.to_string()))?;
		Ok(Self::from_key(private_key))
	}

	pub fn from_key(private_key: RsaPrivateKey) -> Self {
		let verifier = TicketVerifier::from_key(private_key.to_public_key());
		Self {
			signing_key: SigningKey::<Sha256>::new(private_key),
			verifier,
			validity: DEFAULT_VALIDITY,
		}
	}

	/// Override the validity window used by [`issue`](Self::issue).
	pub fn with_validity(mut self, validity: Duration) -> Self {
		self.validity = validity;
		self
	}

	pub fn validity(&self) -> Duration {
		self.validity
	}

	/// Verifier holding the public half of this signer's key.
	pub fn verifier(&self) -> &TicketVerifier {
		&self.verifier
	}

	/// Serialize `fields` canonically, sign them and append `sig=<base64>`.
	pub fn create_ticket(&self, fields: &TicketFields) -> Result<String, TicketError> {
		let payload = fields.canonical();
		let signature: Signature = self
			.signing_key
			.try_sign(payload.as_bytes())
			.map_err(|e| TicketError::Signing(e.to_string()))?;
		let encoded = STANDARD.encode(signature.to_bytes());

		if payload.is_empty() {
			Ok(format!("{SIG_FIELD}={encoded}"))
		} else {
			Ok(format!("{payload}{SIG_SEPARATOR}{encoded}"))
		}
	}

	/// Issue a ticket for `username` valid from `now` for the configured window.
	#[instrument(skip(self), fields(validity_secs = self.validity.as_secs()))]
	pub fn issue(&self, username: &str, now: u64) -> Result<String, TicketError> {
		let valid_until = now.saturating_add(self.validity.as_secs());
		let fields = TicketFields::new()
			.with(UID_FIELD, username)?
			.with(VALID_UNTIL_FIELD, valid_until.to_string())?;
		let ticket = self.create_ticket(&fields)?;
		debug!(valid_until, "issued ticket");
		Ok(ticket)
	}
}

/// Verifies tickets with the broker's public key.
#[derive(Clone)]
pub struct TicketVerifier {
	verifying_key: VerifyingKey<Sha256>,
}

impl fmt::Debug for TicketVerifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TicketVerifier").finish_non_exhaustive()
	}
}

impl TicketVerifier {
	/// Parse a PEM encoded RSA public key (SubjectPublicKeyInfo or PKCS#1).
	pub fn from_public_pem(pem: &str) -> Result<Self, TicketError> {
		let public_key = RsaPublicKey::from_public_key_pem(pem)
			.or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
			.map_err(|e| TicketError::KeyLoad(e.to_string()))?;
		Ok(Self::from_key(public_key))
	}

	pub fn from_key(public_key: RsaPublicKey) -> Self {
		Self {
			verifying_key: VerifyingKey::<Sha256>::new(public_key),
		}
	}

	/// Check the signature and validity window of `ticket`.
	///
	/// Returns the signed fields in their original order. Any framing,
	/// encoding, ordering or content change yields
	/// [`TicketError::SignatureInvalid`]; a correctly signed ticket whose
	/// `validuntil` is not after `now` yields [`TicketError::TicketExpired`].
	pub fn verify_ticket(&self, ticket: &str, now: u64) -> Result<TicketFields, TicketError> {
		let (payload, encoded) = split_signature(ticket)?;
		let fields = TicketFields::parse_canonical(payload)?;

		let raw = STANDARD
			.decode(encoded)
			.map_err(|_| TicketError::SignatureInvalid)?;
		let signature = Signature::try_from(raw.as_slice()).map_err(|_| TicketError::SignatureInvalid)?;
		self
			.verifying_key
			.verify(fields.canonical().as_bytes(), &signature)
			.map_err(|_| TicketError::SignatureInvalid)?;

		if let Some(valid_until) = fields.get(VALID_UNTIL_FIELD) {
			let valid_until: u64 = valid_until.parse().map_err(|_| TicketError::TicketExpired)?;
			if valid_until <= now {
				return Err(TicketError::TicketExpired);
			}
		}

		Ok(fields)
	}
}

/// Split `payload;sig=<b64>` into its two halves. `sig` must appear exactly once, last.
fn split_signature(ticket: &str) -> Result<(&str, &str), TicketError> {
	let (payload, encoded) = match ticket.rfind(SIG_SEPARATOR) {
		Some(idx) => (&ticket[..idx], &ticket[idx + SIG_SEPARATOR.len()..]),
		None => match ticket.strip_prefix("sig=") {
			Some(encoded) => ("", encoded),
			None => return Err(TicketError::SignatureInvalid),
		},
	};
	if encoded.is_empty() || encoded.contains(';') {
		return Err(TicketError::SignatureInvalid);
	}
	Ok((payload, encoded))
}
