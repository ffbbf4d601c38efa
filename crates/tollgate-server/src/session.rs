// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket cookies: issuing one after login and reading one back.

use std::time::Duration;

use axum::http::{header::COOKIE, HeaderMap};
use tollgate_common_ticket::{unix_now, TicketError, TicketSigner, UID_FIELD};
use tollgate_server_config::SessionConfig;
use tracing::debug;

/// `Expires` value that makes every browser drop a cookie.
pub const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Signs tickets and wraps them in the session cookie.
pub struct SessionIssuer {
	signer: TicketSigner,
	cookie_name: String,
	cookie_domain: String,
	period_secs: u64,
}

impl SessionIssuer {
	/// The signer's validity window is set to the cookie period.
	pub fn new(signer: TicketSigner, config: &SessionConfig) -> Self {
		Self {
			signer: signer.with_validity(Duration::from_secs(config.cookie_period_secs)),
			cookie_name: config.cookie_name.clone(),
			cookie_domain: config.cookie_domain.clone(),
			period_secs: config.cookie_period_secs,
		}
	}

	/// Load the private key named in `config`.
	pub fn from_config(config: &SessionConfig) -> Result<Self, TicketError> {
		let signer = TicketSigner::from_pem_file(&config.private_key_path)?;
		Ok(Self::new(signer, config))
	}

	pub fn cookie_name(&self) -> &str {
		&self.cookie_name
	}

	pub fn signer(&self) -> &TicketSigner {
		&self.signer
	}

	/// `Set-Cookie` value carrying a fresh ticket for `username`.
	#[tracing::instrument(skip(self))]
	pub fn issue_cookie(&self, username: &str) -> Result<String, TicketError> {
		let ticket = self.signer.issue(username, unix_now())?;
		Ok(format!(
			"{}={}; Domain={}; Path=/; Max-Age={}",
			self.cookie_name,
			urlencoding::encode(&ticket),
			self.cookie_domain,
			self.period_secs
		))
	}

	/// The user named by a valid ticket cookie in `headers`, if any.
	///
	/// Tampered, expired or undecodable tickets count as no session.
	pub fn current_user(&self, headers: &HeaderMap) -> Option<String> {
		let raw = cookie_value(headers, &self.cookie_name)?;
		let ticket = urlencoding::decode(&raw).ok()?;
		match self.signer.verifier().verify_ticket(&ticket, unix_now()) {
			Ok(fields) => fields.get(UID_FIELD).map(str::to_string),
			Err(e) => {
				debug!(error = %e, "ignoring session cookie");
				None
			}
		}
	}
}

/// `Set-Cookie` value that removes the cookie `name` on `domain`.
pub fn clear_cookie(name: &str, domain: &str) -> String {
	format!("{name}=; Domain={domain}; Path=/; Max-Age=0; Expires={EPOCH_EXPIRES}")
}

/// First value of cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;
	use rsa::RsaPrivateKey;
	use std::sync::OnceLock;

	fn test_key() -> RsaPrivateKey {
		static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
		KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
			.clone()
	}

	fn issuer() -> SessionIssuer {
		let config = SessionConfig {
			cookie_domain: "tests.dom".to_string(),
			..Default::default()
		};
		SessionIssuer::new(TicketSigner::from_key(test_key()), &config)
	}

	fn headers_with(cookie: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
		headers
	}

	#[test]
	fn issued_cookie_has_attributes() {
		let cookie = issuer().issue_cookie("john").unwrap();
		assert!(cookie.starts_with("auth_pubtkt=uid%3Djohn%3Bvaliduntil%3D"));
		assert!(cookie.ends_with("; Domain=tests.dom; Path=/; Max-Age=43200"));
	}

	#[test]
	fn issued_cookie_reads_back() {
		let issuer = issuer();
		let set_cookie = issuer.issue_cookie("john").unwrap();
		let pair = set_cookie.split(';').next().unwrap();
		let headers = headers_with(&format!("other=1; {pair}"));
		assert_eq!(issuer.current_user(&headers), Some("john".to_string()));
	}

	#[test]
	fn tampered_cookie_is_no_session() {
		let issuer = issuer();
		let set_cookie = issuer.issue_cookie("john").unwrap();
		let pair = set_cookie.split(';').next().unwrap().replace("john", "root");
		assert_eq!(issuer.current_user(&headers_with(&pair)), None);
	}

	#[test]
	fn validity_follows_cookie_period() {
		let config = SessionConfig {
			cookie_period_secs: 60,
			..Default::default()
		};
		let issuer = SessionIssuer::new(TicketSigner::from_key(test_key()), &config);
		assert_eq!(issuer.signer().validity(), Duration::from_secs(60));
	}

	#[test]
	fn clear_cookie_format() {
		assert_eq!(
			clear_cookie("auth_pubtkt", "tests.dom"),
			"auth_pubtkt=; Domain=tests.dom; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
		);
	}

	#[test]
	fn cookie_lookup() {
		let headers = headers_with("a=1; auth_pubtkt=xyz; b=2");
		assert_eq!(cookie_value(&headers, "auth_pubtkt").as_deref(), Some("xyz"));
		assert_eq!(cookie_value(&headers, "missing"), None);
		assert_eq!(cookie_value(&HeaderMap::new(), "auth_pubtkt"), None);
	}

	proptest::proptest! {
		#[test]
		fn cookie_found_among_others(
			others in proptest::collection::vec(("[a-z]{1,8}", "[A-Za-z0-9%]{0,12}"), 0..5),
			value in "[A-Za-z0-9%]{1,40}",
		) {
			let mut pairs: Vec<String> = others
				.iter()
				.filter(|(k, _)| k != "auth_pubtkt")
				.map(|(k, v)| format!("{k}={v}"))
				.collect();
			pairs.insert(pairs.len() / 2, format!("auth_pubtkt={value}"));
			let headers = headers_with(&pairs.join("; "));
			proptest::prop_assert_eq!(cookie_value(&headers, "auth_pubtkt"), Some(value));
		}
	}
}
