// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Links between Gerrit accounts and the `gerrit:<username>` external id.

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tollgate_common_secret::SecretString;
use tracing::{debug, instrument, warn};

use crate::error::ProvisioningError;

/// Scheme prefix of the external ids written for SSO users.
pub const EXTERNAL_ID_SCHEME: &str = "gerrit";

pub fn external_id(username: &str) -> String {
	format!("{EXTERNAL_ID_SCHEME}:{username}")
}

/// Storage for account → external id links.
#[async_trait]
pub trait ExternalIdStore: Send + Sync {
	/// Insert the link. Returns `false` on any failure, including a duplicate.
	async fn add_external_id(&self, account_id: i64, username: &str) -> bool;
}

/// [`ExternalIdStore`] over the Gerrit review database.
#[derive(Debug, Clone)]
pub struct SqlExternalIdStore {
	pool: AnyPool,
}

impl SqlExternalIdStore {
	pub fn new(pool: AnyPool) -> Self {
		Self { pool }
	}

	/// Create a store whose pool connects on first use.
	///
	/// The URL scheme picks the driver (`mysql://` in production, `sqlite:` in tests).
	#[instrument(skip(database_url))]
	pub fn connect_lazy(database_url: &SecretString) -> Result<Self, ProvisioningError> {
		sqlx::any::install_default_drivers();
		let pool = AnyPoolOptions::new()
			.max_connections(2)
			.connect_lazy(database_url.expose())?;
		Ok(Self::new(pool))
	}

	pub fn pool(&self) -> &AnyPool {
		&self.pool
	}

	async fn insert(&self, account_id: i64, username: &str) -> Result<(), ProvisioningError> {
		sqlx::query(
			r#"
			INSERT INTO account_external_ids (account_id, external_id)
			VALUES (?, ?)
			"#,
		)
		.bind(account_id)
		.bind(external_id(username))
		.execute(&self.pool)
		.await?;
		Ok(())
	}
}

#[async_trait]
impl ExternalIdStore for SqlExternalIdStore {
	#[instrument(skip(self))]
	async fn add_external_id(&self, account_id: i64, username: &str) -> bool {
		match self.insert(account_id, username).await {
			Ok(()) => {
				debug!("external id linked");
				true
			}
			Err(e) => {
				warn!(error = %e, "could not link external id");
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn store() -> SqlExternalIdStore {
		sqlx::any::install_default_drivers();
		let pool = AnyPoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		sqlx::query(
			r#"
			CREATE TABLE account_external_ids (
				account_id INTEGER NOT NULL,
				external_id TEXT NOT NULL PRIMARY KEY
			)
			"#,
		)
		.execute(&pool)
		.await
		.unwrap();
		SqlExternalIdStore::new(pool)
	}

	#[tokio::test]
	async fn insert_creates_link() {
		let store = store().await;
		assert!(store.add_external_id(42, "john").await);

		let (account_id, id): (i64, String) =
			sqlx::query_as("SELECT account_id, external_id FROM account_external_ids")
				.fetch_one(store.pool())
				.await
				.unwrap();
		assert_eq!(account_id, 42);
		assert_eq!(id, "gerrit:john");
	}

	#[tokio::test]
	async fn duplicate_insert_is_false() {
		let store = store().await;
		assert!(store.add_external_id(42, "john").await);
		assert!(!store.add_external_id(42, "john").await);
	}

	#[tokio::test]
	async fn missing_table_is_false() {
		sqlx::any::install_default_drivers();
		let pool = AnyPoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		assert!(!SqlExternalIdStore::new(pool).add_external_id(1, "john").await);
	}

	#[test]
	fn external_id_format() {
		assert_eq!(external_id("john"), "gerrit:john");
	}
}
