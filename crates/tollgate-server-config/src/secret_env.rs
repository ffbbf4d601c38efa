// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `VAR` / `VAR_FILE` secret loading.
//!
//! Client secrets, admin passwords and API keys may be mounted as files
//! (Docker secrets, Kubernetes secret volumes). When `{VAR}_FILE` is set the
//! secret is read from that path and a single trailing newline is stripped;
//! otherwise `{VAR}` is used directly.

use std::path::PathBuf;
use std::{env, fs};

use tollgate_common_secret::SecretString;

use crate::error::ConfigError;

/// Load an optional secret, preferring `{var}_FILE` over `{var}`.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, ConfigError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(ConfigError::Secret(format!("secret file path in {file_var} is empty")));
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|e| {
			ConfigError::Secret(format!("failed to read secret file at {}: {e}", path.display()))
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	match env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}
