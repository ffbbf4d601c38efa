// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tollgate SSO broker server.
//!
//! This crate wires the credential chain, GitHub login, provisioning and
//! ticket issuance behind an axum router.

pub mod api;
pub mod error;
pub mod jobs;
pub mod logout;
pub mod routes;
pub mod session;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use logout::{LogoutCoordinator, LogoutOutcome, ServiceLogout};
pub use session::SessionIssuer;
pub use tollgate_server_config::ServerConfig;
