// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::Deserialize;
use tollgate_common_secret::SecretString;
use tollgate_server_auth::{BackendKind, UserRecord};
use tollgate_server_config::GitHubConfig;
use tracing::{debug, warn};
use url::Url;

/// Scopes requested on the authorize redirect.
pub const GITHUB_SCOPE: &str = "user:email, read:public_key, read:org";

const GITHUB_API_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur during OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
	/// The HTTP request to GitHub failed (network error, timeout, etc.).
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	/// The response from GitHub could not be parsed as expected.
	#[error("failed to parse response: {0}")]
	ParseError(String),

	/// GitHub returned an error response (invalid code, bad token, etc.).
	#[error("GitHub API error: {0}")]
	GitHubError(String),
}

// =============================================================================
// Tokens
// =============================================================================

/// How an access token is presented to the GitHub API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPresentation {
	/// `Authorization: token <t>`; used for tokens from the code flow.
	Header,
	/// HTTP basic auth `<t>:x-oauth-basic`; used for personal access tokens.
	Basic,
}

/// A GitHub access token together with its presentation style.
#[derive(Debug, Clone)]
pub struct GitHubToken {
	token: SecretString,
	presentation: TokenPresentation,
}

impl GitHubToken {
	/// Token obtained through the authorization code flow.
	pub fn header(token: SecretString) -> Self {
		Self {
			token,
			presentation: TokenPresentation::Header,
		}
	}

	/// Personal access token typed in by the user.
	pub fn basic(token: SecretString) -> Self {
		Self {
			token,
			presentation: TokenPresentation::Basic,
		}
	}

	pub fn presentation(&self) -> TokenPresentation {
		self.presentation
	}

	/// Login source recorded for identities fetched with this token.
	pub fn source(&self) -> BackendKind {
		match self.presentation {
			TokenPresentation::Header => BackendKind::Github,
			TokenPresentation::Basic => BackendKind::GithubPersonalToken,
		}
	}

	fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		match self.presentation {
			TokenPresentation::Header => {
				request.header(AUTHORIZATION, format!("token {}", self.token.expose()))
			}
			TokenPresentation::Basic => request.basic_auth(self.token.expose(), Some("x-oauth-basic")),
		}
	}
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<SecretString>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Profile fields read from `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
	pub login: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubKey {
	#[serde(default)]
	key: String,
}

/// `GET /user/keys` normally returns a list, but a single object is accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeysResponse {
	Many(Vec<GitHubKey>),
	One(GitHubKey),
}

impl KeysResponse {
	fn into_keys(self) -> Vec<String> {
		let keys = match self {
			KeysResponse::Many(keys) => keys,
			KeysResponse::One(key) => vec![key],
		};
		keys
			.into_iter()
			.map(|k| k.key)
			.filter(|k| !k.trim().is_empty())
			.collect()
	}
}

#[derive(Debug, Deserialize)]
struct GitHubOrg {
	login: String,
}

/// Split the configured allow-list into organization logins.
pub fn parse_allowed_organizations(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

// =============================================================================
// Client
// =============================================================================

/// OAuth and API client for GitHub (or a GitHub Enterprise instance).
#[derive(Debug, Clone)]
pub struct GitHubOAuthClient {
	client_id: String,
	client_secret: SecretString,
	redirect_uri: String,
	authorize_url: Url,
	token_url: String,
	api_url: String,
	allowed_organizations: Vec<String>,
	http_client: reqwest::Client,
}

impl GitHubOAuthClient {
	/// Create a client. `http_client` should carry the outbound timeout.
	#[tracing::instrument(skip_all, name = "GitHubOAuthClient::new")]
	pub fn new(config: GitHubConfig, http_client: reqwest::Client) -> Result<Self, OAuthError> {
		let authorize_url = Url::parse(&config.auth_url)
			.map_err(|e| OAuthError::ParseError(format!("invalid authorize URL: {e}")))?;

		Ok(Self {
			client_id: config.client_id,
			client_secret: config.client_secret,
			redirect_uri: config.redirect_uri,
			authorize_url,
			token_url: config.token_url,
			api_url: config.api_url.trim_end_matches('/').to_string(),
			allowed_organizations: parse_allowed_organizations(&config.allowed_organizations),
			http_client,
		})
	}

	/// Create a client with its own HTTP client from the shared builder.
	pub fn from_config(config: GitHubConfig) -> Result<Self, OAuthError> {
		let http_client = tollgate_common_http::builder().build()?;
		Self::new(config, http_client)
	}

	pub fn allowed_organizations(&self) -> &[String] {
		&self.allowed_organizations
	}

	/// URL the browser is sent to, carrying `client_id`, `redirect_uri`, `scope` and `state`.
	#[tracing::instrument(skip(self, state), fields(client_id = %self.client_id))]
	pub fn authorization_url(&self, state: &str) -> String {
		let mut url = self.authorize_url.clone();

		url
			.query_pairs_mut()
			.append_pair("client_id", &self.client_id)
			.append_pair("redirect_uri", &self.redirect_uri)
			.append_pair("scope", GITHUB_SCOPE)
			.append_pair("state", state);

		url.to_string()
	}

	/// Exchange an authorization code for an access token.
	#[tracing::instrument(skip(self, code), name = "GitHubOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<SecretString, OAuthError> {
		debug!("exchanging authorization code for access token");

		let response = self
			.http_client
			.post(&self.token_url)
			.header(ACCEPT, "application/json")
			.form(&[
				("client_id", self.client_id.as_str()),
				("client_secret", self.client_secret.expose().as_str()),
				("code", code),
				("redirect_uri", self.redirect_uri.as_str()),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
			OAuthError::ParseError(format!("failed to parse token response ({status}): {e}"))
		})?;

		if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
			return Err(OAuthError::GitHubError(
				parsed.error_description.unwrap_or(error),
			));
		}

		parsed
			.access_token
			.filter(|t| !t.is_empty())
			.ok_or_else(|| OAuthError::GitHubError("no access token in response".to_string()))
	}

	/// Fetch the identity behind `token`: profile plus public SSH keys.
	///
	/// A failing keys request is logged and yields an identity without keys.
	#[tracing::instrument(skip(self, token), fields(presentation = ?token.presentation()))]
	pub async fn fetch_identity(&self, token: &GitHubToken) -> Result<UserRecord, OAuthError> {
		let user: GitHubUser = self.get_json(token, "/user").await?;
		debug!(login = %user.login, "fetched GitHub user");

		let ssh_keys = match self.get_json::<KeysResponse>(token, "/user/keys").await {
			Ok(keys) => keys.into_keys(),
			Err(e) => {
				warn!(login = %user.login, error = %e, "could not read GitHub SSH keys");
				Vec::new()
			}
		};

		let fullname = user.name.unwrap_or_default();
		UserRecord::new(user.login, fullname, user.email, ssh_keys, token.source())
			.map_err(|e| OAuthError::ParseError(e.to_string()))
	}

	/// Whether the token's user belongs to an allowed organization.
	///
	/// With no allow-list configured every user is allowed and GitHub is not called.
	#[tracing::instrument(skip(self, token))]
	pub async fn organization_allowed(&self, token: &GitHubToken) -> Result<bool, OAuthError> {
		if self.allowed_organizations.is_empty() {
			return Ok(true);
		}

		let orgs: Vec<GitHubOrg> = self.get_json(token, "/user/orgs").await?;
		let allowed = orgs
			.iter()
			.any(|org| self.allowed_organizations.iter().any(|a| a == &org.login));
		debug!(
			memberships = orgs.len(),
			allowed, "checked GitHub organization membership"
		);
		Ok(allowed)
	}

	async fn get_json<T>(&self, token: &GitHubToken, path: &str) -> Result<T, OAuthError>
	where
		T: serde::de::DeserializeOwned,
	{
		let request = self
			.http_client
			.get(format!("{}{path}", self.api_url))
			.header(ACCEPT, GITHUB_API_ACCEPT)
			.header("X-GitHub-Api-Version", GITHUB_API_VERSION);

		let response = token.authorize(request).send().await?;

		if !response.status().is_success() {
			let status = response.status();
			let body = response.text().await.unwrap_or_default();
			return Err(OAuthError::GitHubError(format!(
				"GET {path} returned {status}: {body}"
			)));
		}

		response
			.json()
			.await
			.map_err(|e| OAuthError::ParseError(format!("failed to parse {path} response: {e}")))
	}
}
