// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gerrit provisioning against a mocked REST API and a real SQLite link table.

use std::sync::Arc;

use sqlx::any::AnyPoolOptions;
use tollgate_common_secret::SecretString;
use tollgate_server_config::GerritConfig;
use tollgate_server_provisioning::{ExternalIdStore, GerritProvisioner, SqlExternalIdStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn link_store() -> SqlExternalIdStore {
	sqlx::any::install_default_drivers();
	let pool = AnyPoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	sqlx::query(
		"CREATE TABLE account_external_ids (account_id INTEGER NOT NULL, external_id TEXT NOT NULL PRIMARY KEY)",
	)
	.execute(&pool)
	.await
	.unwrap();
	SqlExternalIdStore::new(pool)
}

#[tokio::test]
async fn second_login_reports_duplicate_link() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/a/accounts/john"))
		.respond_with(ResponseTemplate::new(200).set_body_string(")]}'\n{\"_account_id\": 1000001}"))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/a/accounts/john/sshkeys"))
		.respond_with(ResponseTemplate::new(201))
		.mount(&server)
		.await;

	let store = link_store().await;
	let config = GerritConfig {
		url: server.uri(),
		admin_user: "admin".to_string(),
		admin_password: SecretString::from("wxcvbn"),
		database_url: None,
	};
	let provisioner = GerritProvisioner::new(
		&config,
		reqwest::Client::new(),
		Some(Arc::new(store.clone()) as Arc<dyn ExternalIdStore>),
	);
	let keys = vec!["ssh-rsa AAAA john@host".to_string()];

	let first = provisioner
		.provision("john", "John Doe", "john@tests.dom", &keys)
		.await;
	assert_eq!(first.account_id, Some(1_000_001));
	assert!(first.linked);
	assert_eq!(first.keys_installed, 1);

	let second = provisioner
		.provision("john", "John Doe", "john@tests.dom", &keys)
		.await;
	assert!(!second.linked);

	let rows: Vec<(i64, String)> =
		sqlx::query_as("SELECT account_id, external_id FROM account_external_ids")
			.fetch_all(store.pool())
			.await
			.unwrap();
	assert_eq!(rows, vec![(1_000_001, "gerrit:john".to_string())]);
}
