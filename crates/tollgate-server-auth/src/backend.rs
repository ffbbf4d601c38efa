// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tollgate_common_secret::SecretString;

use crate::error::BackendError;
use crate::user::{BackendKind, UserRecord};

/// A source that can check a username/password pair.
///
/// - `Ok(Some(user))`: credentials accepted.
/// - `Ok(None)`: not applicable (unknown user, wrong password).
/// - `Err(_)`: the backend itself failed (unreachable, timeout, garbage response).
#[async_trait]
pub trait CredentialBackend: Send + Sync {
	fn kind(&self) -> BackendKind;

	async fn validate(
		&self,
		username: &str,
		password: &SecretString,
	) -> Result<Option<UserRecord>, BackendError>;
}
