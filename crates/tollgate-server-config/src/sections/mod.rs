// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for tollgate-server.

pub mod auth;
pub mod directory;
pub mod gerrit;
pub mod github;
pub mod http;
pub mod logging;
pub mod logout;
pub mod redmine;
pub mod session;
pub mod user_store;

pub use auth::{AuthConfig, AuthConfigLayer, BackendName, StaticUserConfig};
pub use directory::{DirectoryConfig, DirectoryConfigLayer, USERNAME_PLACEHOLDER};
pub use gerrit::{GerritConfig, GerritConfigLayer};
pub use github::{GitHubConfig, GitHubConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use logout::{LogoutConfig, LogoutConfigLayer, LogoutServiceConfig};
pub use redmine::{RedmineConfig, RedmineConfigLayer};
pub use session::{SessionConfig, SessionConfigLayer};
pub use user_store::{RemoteUserStoreConfig, RemoteUserStoreConfigLayer};
