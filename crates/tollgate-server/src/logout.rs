// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session teardown across the SSO cookie and downstream services.

use serde::Serialize;
use tollgate_server_config::{LogoutConfig, LogoutServiceConfig, SessionConfig};
use tracing::{info, instrument, warn};

use crate::session::clear_cookie;

/// Per-service logout result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLogout {
	pub name: String,
	pub url: String,
	/// True when the server reached the service itself. Relative URLs are
	/// left to the browser and stay `false`.
	pub notified: bool,
}

#[derive(Debug, Clone)]
pub struct LogoutOutcome {
	/// `Set-Cookie` value removing the ticket cookie.
	pub clear_cookie: String,
	pub services: Vec<ServiceLogout>,
}

pub struct LogoutCoordinator {
	clear_cookie: String,
	services: Vec<LogoutServiceConfig>,
	client: reqwest::Client,
}

fn is_absolute(url: &str) -> bool {
	url.starts_with("http://") || url.starts_with("https://")
}

impl LogoutCoordinator {
	/// `client` should carry the outbound timeout.
	pub fn new(session: &SessionConfig, logout: &LogoutConfig, client: reqwest::Client) -> Self {
		Self {
			clear_cookie: clear_cookie(&session.cookie_name, &session.cookie_domain),
			services: logout.services.clone(),
			client,
		}
	}

	/// Clear the cookie and notify every configured service.
	///
	/// Service failures are logged and recorded; the cookie is cleared regardless.
	#[instrument(skip(self), fields(services = self.services.len()))]
	pub async fn logout(&self) -> LogoutOutcome {
		let mut services = Vec::with_capacity(self.services.len());

		for service in &self.services {
			let notified = if is_absolute(&service.url) {
				self.notify(service).await
			} else {
				false
			};
			services.push(ServiceLogout {
				name: service.name.clone(),
				url: service.url.clone(),
				notified,
			});
		}

		info!("session cleared");
		LogoutOutcome {
			clear_cookie: self.clear_cookie.clone(),
			services,
		}
	}

	async fn notify(&self, service: &LogoutServiceConfig) -> bool {
		match self.client.get(&service.url).send().await {
			Ok(response) if response.status().is_success() => true,
			Ok(response) => {
				warn!(service = %service.name, status = %response.status(), "logout call refused");
				false
			}
			Err(e) => {
				warn!(service = %service.name, error = %e, "logout call failed");
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn coordinator(services: Vec<(&str, String)>) -> LogoutCoordinator {
		let session = SessionConfig {
			cookie_domain: "tests.dom".to_string(),
			..Default::default()
		};
		let logout = LogoutConfig {
			services: services
				.into_iter()
				.map(|(name, url)| LogoutServiceConfig {
					name: name.to_string(),
					url,
				})
				.collect(),
		};
		LogoutCoordinator::new(&session, &logout, reqwest::Client::new())
	}

	#[tokio::test]
	async fn no_services_still_clears_cookie() {
		let outcome = coordinator(vec![]).logout().await;
		assert!(outcome.clear_cookie.starts_with("auth_pubtkt=; Domain=tests.dom"));
		assert!(outcome.services.is_empty());
	}

	#[tokio::test]
	async fn absolute_urls_are_called_server_side() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/r/logout"))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let outcome = coordinator(vec![
			("gerrit", format!("{}/r/logout", server.uri())),
			("redmine", "/redmine/logout".to_string()),
		])
		.logout()
		.await;

		assert!(outcome.services[0].notified);
		assert_eq!(outcome.services[1].url, "/redmine/logout");
		assert!(!outcome.services[1].notified);
	}

	#[tokio::test]
	async fn failing_service_is_recorded() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let outcome = coordinator(vec![
			("down", format!("{}/logout", server.uri())),
			("gone", "http://127.0.0.1:1/logout".to_string()),
		])
		.logout()
		.await;

		assert!(outcome.services.iter().all(|s| !s.notified));
		assert!(outcome.clear_cookie.contains("Max-Age=0"));
	}
}
