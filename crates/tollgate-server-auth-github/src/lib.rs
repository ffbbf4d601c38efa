// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub OAuth login for Tollgate.
//!
//! # Authorization code flow
//!
//! 1. [`GitHubLogin::build_authorize_redirect`] stores a single-use `state`
//!    nonce and returns the GitHub authorize URL.
//! 2. GitHub redirects back with `code` and `state`.
//! 3. [`GitHubLogin::complete_callback`] consumes the nonce, exchanges the
//!    code, checks the organization allow-list and fetches the identity.
//!
//! Personal access tokens skip the first two steps and go straight through
//! [`GitHubLogin::authenticate_personal_token`].
//!
//! # Security
//!
//! - The client secret and all access tokens are [`SecretString`]s and are
//!   redacted in `Debug` output.
//! - Tokens are never persisted.
//!
//! [`SecretString`]: tollgate_common_secret::SecretString

pub mod client;
pub mod login;

pub use client::{
	parse_allowed_organizations, GitHubOAuthClient, GitHubToken, GitHubUser, OAuthError,
	TokenPresentation, GITHUB_SCOPE,
};
pub use login::GitHubLogin;
