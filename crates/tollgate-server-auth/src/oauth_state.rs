// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth `state` nonce store and redirect sanitization.
//!
//! A nonce is stored with the post-login return URL when the user is sent
//! to the provider and consumed exactly once when the provider calls back.
//!
//! # Cleanup
//!
//! Expired entries are dropped when looked up; call
//! [`OAuthStateStore::cleanup_expired`] periodically for abandoned flows:
//!
//! ```ignore
//! tokio::spawn(async move {
//!     loop {
//!         tokio::time::sleep(Duration::from_secs(60)).await;
//!         store.cleanup_expired().await;
//!     }
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::instrument;

use crate::error::AuthError;

/// Default nonce lifetime (10 minutes).
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct StateEntry {
	return_url: String,
	created_at: Instant,
}

/// Check if a redirect target stays on this site.
///
/// Relative references (`/r/`, `r/`, `dashboard?x=1`) are accepted.
/// Anything with a scheme, an authority (`//host`), a backslash or a control
/// character is refused.
pub fn is_safe_redirect(url: &str) -> bool {
	if url.is_empty() || url.starts_with("//") {
		return false;
	}
	if url.chars().any(|c| c == '\\' || c.is_control()) {
		return false;
	}
	// A ':' before the first '/', '?' or '#' means a scheme (`https:`, `javascript:`).
	let head_end = url.find(|c: char| matches!(c, '/' | '?' | '#')).unwrap_or(url.len());
	!url[..head_end].contains(':')
}

/// Sanitize a redirect URL, returning "/" if the URL is not safe.
pub fn sanitize_redirect(url: Option<&str>) -> String {
	match url {
		Some(u) if is_safe_redirect(u) => u.to_string(),
		_ => "/".to_string(),
	}
}

/// In-memory, single-use nonce store shared by all handlers.
#[derive(Debug, Clone)]
pub struct OAuthStateStore {
	states: Arc<Mutex<HashMap<String, StateEntry>>>,
	ttl: Duration,
}

impl Default for OAuthStateStore {
	fn default() -> Self {
		Self::new()
	}
}

impl OAuthStateStore {
	pub fn new() -> Self {
		Self::with_ttl(DEFAULT_STATE_TTL)
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			states: Arc::new(Mutex::new(HashMap::new())),
			ttl,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Record `nonce` with the URL to return to after login.
	#[instrument(skip(self, nonce, return_url))]
	pub async fn put(&self, nonce: String, return_url: String) {
		let entry = StateEntry {
			return_url,
			created_at: Instant::now(),
		};
		let mut states = self.states.lock().await;
		states.insert(nonce, entry);
		tracing::debug!(total_states = states.len(), "stored OAuth state");
	}

	/// Remove `nonce` and return its URL if it was present and unexpired.
	///
	/// Removal and the expiry check happen under one lock, so of several
	/// concurrent consumers of the same nonce at most one succeeds.
	#[instrument(skip(self, nonce))]
	pub async fn consume(&self, nonce: &str) -> Result<String, AuthError> {
		let entry = self.states.lock().await.remove(nonce);

		let Some(entry) = entry else {
			tracing::debug!("OAuth state not found");
			return Err(AuthError::InvalidOAuthState);
		};

		let elapsed = entry.created_at.elapsed();
		if elapsed >= self.ttl {
			tracing::debug!(
				elapsed_secs = elapsed.as_secs(),
				ttl_secs = self.ttl.as_secs(),
				"OAuth state expired"
			);
			return Err(AuthError::InvalidOAuthState);
		}

		tracing::debug!("OAuth state consumed");
		Ok(entry.return_url)
	}

	/// Remove all expired entries, returning how many were dropped.
	#[instrument(skip(self))]
	pub async fn cleanup_expired(&self) -> usize {
		let mut states = self.states.lock().await;
		let before = states.len();
		let ttl = self.ttl;
		states.retain(|_, entry| entry.created_at.elapsed() < ttl);
		let removed = before - states.len();
		if removed > 0 {
			tracing::debug!(
				removed,
				remaining = states.len(),
				"cleaned up expired OAuth states"
			);
		}
		removed
	}

	pub async fn len(&self) -> usize {
		self.states.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.states.lock().await.is_empty()
	}
}

/// Generate a random `state` value (UUID v4, 122 random bits).
///
/// Treat the value as sensitive; never log it.
pub fn generate_state() -> String {
	uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	#[tokio::test]
	async fn put_then_consume_returns_url() {
		let store = OAuthStateStore::new();
		let state = generate_state();
		store.put(state.clone(), "/r/".to_string()).await;

		assert_eq!(store.consume(&state).await.unwrap(), "/r/");
		assert!(store.is_empty().await);
	}

	#[tokio::test]
	async fn double_consume_fails() {
		let store = OAuthStateStore::new();
		store.put("s1".to_string(), "/".to_string()).await;

		assert!(store.consume("s1").await.is_ok());
		assert!(matches!(
			store.consume("s1").await,
			Err(AuthError::InvalidOAuthState)
		));
	}

	#[tokio::test]
	async fn unknown_state_fails() {
		let store = OAuthStateStore::new();
		assert!(matches!(
			store.consume("nonexistent").await,
			Err(AuthError::InvalidOAuthState)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn expired_state_fails_and_is_removed() {
		let store = OAuthStateStore::with_ttl(Duration::from_secs(600));
		store.put("s1".to_string(), "/".to_string()).await;

		tokio::time::advance(Duration::from_secs(600)).await;

		assert!(matches!(
			store.consume("s1").await,
			Err(AuthError::InvalidOAuthState)
		));
		assert!(store.is_empty().await);
	}

	#[tokio::test(start_paused = true)]
	async fn cleanup_drops_only_expired() {
		let store = OAuthStateStore::with_ttl(Duration::from_secs(60));
		store.put("old".to_string(), "/".to_string()).await;
		tokio::time::advance(Duration::from_secs(45)).await;
		store.put("new".to_string(), "/".to_string()).await;
		tokio::time::advance(Duration::from_secs(30)).await;

		assert_eq!(store.cleanup_expired().await, 1);
		assert_eq!(store.len().await, 1);
		assert!(store.consume("new").await.is_ok());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_consumers_succeed_once() {
		let store = OAuthStateStore::new();
		store.put("race".to_string(), "/".to_string()).await;

		let tasks: Vec<_> = (0..16)
			.map(|_| {
				let store = store.clone();
				tokio::spawn(async move { store.consume("race").await.is_ok() })
			})
			.collect();

		let mut successes = 0;
		for task in tasks {
			if task.await.unwrap() {
				successes += 1;
			}
		}
		assert_eq!(successes, 1);
	}

	#[test]
	fn redirect_rules() {
		for ok in ["/", "/r/", "r/", "/redmine/projects?id=1", "dashboard#top", "/a:b"] {
			assert!(is_safe_redirect(ok), "{ok} should be allowed");
		}
		for bad in [
			"",
			"//evil.com",
			"https://evil.com",
			"javascript:alert(1)",
			"/\\evil.com",
			"\\\\evil.com",
			"/r/\n",
		] {
			assert!(!is_safe_redirect(bad), "{bad:?} should be refused");
		}
		assert_eq!(sanitize_redirect(Some("https://evil.com")), "/");
		assert_eq!(sanitize_redirect(None), "/");
		assert_eq!(sanitize_redirect(Some("/r/")), "/r/");
	}

	proptest! {
		#[test]
		fn generate_state_is_unique(_seed in 0u64..200) {
			let states: HashSet<_> = (0..50).map(|_| generate_state()).collect();
			prop_assert_eq!(states.len(), 50);
		}

		#[test]
		fn absolute_urls_are_never_safe(scheme in "[a-z][a-z0-9+.-]{0,9}", rest in "[a-z0-9./]{0,20}") {
			let url = format!("{scheme}://{rest}");
			prop_assert!(!is_safe_redirect(&url));
			prop_assert_eq!(sanitize_redirect(Some(&url)), "/");
		}

		#[test]
		fn protocol_relative_urls_are_never_safe(host in "[a-z0-9.-]{1,30}") {
			let url = format!("//{host}/x");
			prop_assert!(!is_safe_redirect(&url));
		}
	}
}
