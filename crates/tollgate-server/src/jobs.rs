// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background maintenance.

use std::time::Duration;

use tokio::task::JoinHandle;
use tollgate_server_auth::OAuthStateStore;

/// Shortest cleanup period; `tokio::time::interval` rejects zero.
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically drop OAuth states whose flow was abandoned.
pub fn spawn_state_cleanup(store: OAuthStateStore, every: Duration) -> JoinHandle<()> {
	let every = every.max(MIN_CLEANUP_INTERVAL);
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(every);
		// The first tick completes immediately.
		ticker.tick().await;
		loop {
			ticker.tick().await;
			let removed = store.cleanup_expired().await;
			if removed > 0 {
				tracing::info!(removed, "OAuth state cleanup");
			}
		}
	})
}
