// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Timeout applied when the configuration does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client builder with the Tollgate User-Agent and the default timeout.
///
/// # Example
/// ```ignore
/// let client = tollgate_common_http::builder()
///     .timeout(Duration::from_secs(3))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.timeout(DEFAULT_TIMEOUT)
}

/// Build a client whose requests are bounded by `timeout`.
#[tracing::instrument(level = "debug")]
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// `tollgate/{version}`
pub fn user_agent() -> String {
	format!("tollgate/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_product_and_version() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "tollgate");
		assert!(!parts[1].is_empty());
	}

	#[test]
	fn client_with_timeout_builds() {
		assert!(client_with_timeout(Duration::from_millis(250)).is_ok());
	}
}
