// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Best-effort account provisioning in downstream systems.
//!
//! After a login succeeds, [`ProvisioningService::provision`] makes sure the
//! user has a Gerrit account (linked to its `gerrit:<username>` external id
//! and carrying the user's SSH keys) and a Redmine account. Every external
//! call is caught where it is made; the login never fails because of
//! provisioning.

mod error;
pub mod external_id;
pub mod gerrit;
pub mod lenient_json;
pub mod redmine;
pub mod service;

pub use error::ProvisioningError;
pub use external_id::{external_id, ExternalIdStore, SqlExternalIdStore, EXTERNAL_ID_SCHEME};
pub use gerrit::{GerritProvisioner, GerritReport};
pub use redmine::{split_name, RedmineProvisioner};
pub use service::{ProvisioningReport, ProvisioningService};
