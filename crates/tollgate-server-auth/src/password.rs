// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stored password hash verification.
//!
//! Two PHC-style formats are accepted:
//! - Argon2 (`$argon2id$v=19$...`), the format [`hash_password`] produces;
//! - SHA-512 crypt (`$6$salt$hash`, optionally `$6$rounds=N$...`), as written
//!   by `mkpasswd -m sha-512` and found in older deployments.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AuthError;

const SHA512_CRYPT_PREFIX: &str = "$6$";

/// True if `password` matches `stored`. Unparseable hashes never match.
pub fn verify_password_hash(password: &str, stored: &str) -> bool {
	if stored.starts_with(SHA512_CRYPT_PREFIX) {
		return sha_crypt::sha512_check(password, stored).is_ok();
	}

	match PasswordHash::new(stored) {
		Ok(parsed) => Argon2::default()
			.verify_password(password.as_bytes(), &parsed)
			.is_ok(),
		Err(_) => false,
	}
}

/// Hash a password with Argon2id default parameters and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|h| h.to_string())
		.map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use sha_crypt::{sha512_simple, Sha512Params};

	#[test]
	fn argon2_round_trip() {
		let hash = hash_password("userpass").unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password_hash("userpass", &hash));
		assert!(!verify_password_hash("badpass", &hash));
	}

	#[test]
	fn sha512_crypt_is_accepted() {
		let params = Sha512Params::new(5_000).unwrap();
		let hash = sha512_simple("userpass", &params).unwrap();
		assert!(hash.starts_with("$6$"));
		assert!(verify_password_hash("userpass", &hash));
		assert!(!verify_password_hash("badpass", &hash));
	}

	#[test]
	fn garbage_hash_never_matches() {
		assert!(!verify_password_hash("userpass", "userpass"));
		assert!(!verify_password_hash("", ""));
		assert!(!verify_password_hash("userpass", "$6$broken"));
		assert!(!verify_password_hash("userpass", "$argon2id$nope"));
	}
}
