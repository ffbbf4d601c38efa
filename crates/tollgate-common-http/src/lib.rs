// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client for every outbound call the broker makes (GitHub,
//! Gerrit, Redmine, the remote user store, downstream logout URLs).
//!
//! All clients carry the same User-Agent and a request timeout; a timed out
//! call surfaces as an ordinary `reqwest::Error` so callers can treat it as
//! that step failing.

mod client;

pub use client::{builder, client_with_timeout, user_agent, DEFAULT_TIMEOUT};
