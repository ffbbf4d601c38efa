// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote user store credential backend section.

use serde::Deserialize;

/// Validated remote user store configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUserStoreConfig {
	/// Base URL; credentials are checked with `GET <url>/bind`.
	pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUserStoreConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl RemoteUserStoreConfigLayer {
	pub fn merge(&mut self, other: RemoteUserStoreConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn build(self) -> Option<RemoteUserStoreConfig> {
		self
			.url
			.filter(|s| !s.is_empty())
			.map(|url| RemoteUserStoreConfig {
				url: url.trim_end_matches('/').to_string(),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_trailing_slash_trimmed() {
		let config = RemoteUserStoreConfigLayer {
			url: Some("http://manage.tests.dom/manage/".to_string()),
		}
		.build()
		.unwrap();
		assert_eq!(config.url, "http://manage.tests.dom/manage");
	}

	#[test]
	fn test_empty_url_is_disabled() {
		let layer = RemoteUserStoreConfigLayer {
			url: Some(String::new()),
		};
		assert!(layer.build().is_none());
	}
}
