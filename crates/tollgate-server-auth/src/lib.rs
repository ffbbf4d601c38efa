// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication core for the Tollgate SSO broker.
//!
//! This crate provides:
//! - [`UserRecord`]: the identity every login flow produces
//! - [`CredentialBackend`] implementations: [`StaticBackend`], [`DirectoryBackend`],
//!   [`RemoteUserStoreBackend`]
//! - [`CredentialAuthenticator`]: the ordered backend chain behind `POST /login`
//! - [`OAuthStateStore`]: single-use OAuth `state` nonces with their return URLs
//! - redirect sanitization for the `back` parameter
//!
//! # Error handling
//!
//! Backends report infrastructure failures as [`BackendError`]; the chain
//! logs them and moves on. Only [`AuthError`] leaves this crate.

pub mod authenticator;
pub mod backend;
pub mod directory;
pub mod error;
pub mod oauth_state;
pub mod password;
pub mod remote_store;
pub mod static_backend;
pub mod user;

pub use authenticator::CredentialAuthenticator;
pub use backend::CredentialBackend;
pub use directory::{escape_dn_value, DirectoryBackend, DirectoryBind, DirectoryConnector};
pub use error::{AuthError, BackendError};
pub use oauth_state::{
	generate_state, is_safe_redirect, sanitize_redirect, OAuthStateStore, DEFAULT_STATE_TTL,
};
pub use password::{hash_password, verify_password_hash};
pub use remote_store::RemoteUserStoreBackend;
pub use static_backend::StaticBackend;
pub use user::{BackendKind, UserRecord};

#[cfg(feature = "ldap")]
pub use directory::LdapConnector;
