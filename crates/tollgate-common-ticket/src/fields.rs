// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::TicketError;

/// Name of the trailing signature field.
pub const SIG_FIELD: &str = "sig";
/// Name of the field carrying the authenticated username.
pub const UID_FIELD: &str = "uid";
/// Name of the field carrying the expiry as unix seconds.
pub const VALID_UNTIL_FIELD: &str = "validuntil";

/// Ordered ticket fields, excluding the signature.
///
/// Order is significant: it is part of what gets signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFields {
	entries: Vec<(String, String)>,
}

impl TicketFields {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a field, rejecting names or values that would break the framing.
	pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), TicketError> {
		let name = name.into();
		let value = value.into();
		validate_name(&name)?;
		if value.contains(';') {
			return Err(TicketError::InvalidField {
				name,
				reason: "value contains ';'",
			});
		}
		self.entries.push((name, value));
		Ok(())
	}

	/// Builder form of [`push`](Self::push).
	pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Self, TicketError> {
		self.push(name, value)?;
		Ok(self)
	}

	/// First value stored under `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self
			.entries
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The exact byte string that gets signed: `k1=v1;k2=v2`.
	pub fn canonical(&self) -> String {
		self
			.entries
			.iter()
			.map(|(n, v)| format!("{n}={v}"))
			.collect::<Vec<_>>()
			.join(";")
	}

	/// Parse the unsigned part of a ticket. Any framing problem is a signature failure.
	pub(crate) fn parse_canonical(payload: &str) -> Result<Self, TicketError> {
		let mut fields = TicketFields::new();
		if payload.is_empty() {
			return Ok(fields);
		}
		for part in payload.split(';') {
			let (name, value) = part.split_once('=').ok_or(TicketError::SignatureInvalid)?;
			fields
				.push(name, value)
				.map_err(|_| TicketError::SignatureInvalid)?;
		}
		Ok(fields)
	}
}

fn validate_name(name: &str) -> Result<(), TicketError> {
	let reason = if name.is_empty() {
		Some("empty name")
	} else if name == SIG_FIELD {
		Some("reserved for the signature")
	} else if name.contains(';') || name.contains('=') {
		Some("name contains ';' or '='")
	} else {
		None
	};
	match reason {
		Some(reason) => Err(TicketError::InvalidField {
			name: name.to_string(),
			reason,
		}),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn canonical_keeps_insertion_order() {
		let fields = TicketFields::new()
			.with("b", "arg2")
			.unwrap()
			.with("a", "arg1")
			.unwrap();
		assert_eq!(fields.canonical(), "b=arg2;a=arg1");
	}

	#[test]
	fn canonical_matches_pubtkt_layout() {
		let fields = TicketFields::new()
			.with("a", "arg1")
			.unwrap()
			.with("b", "arg2")
			.unwrap();
		assert_eq!(fields.canonical(), "a=arg1;b=arg2");
	}

	#[test]
	fn rejects_reserved_and_malformed_names() {
		let mut fields = TicketFields::new();
		assert!(fields.push("sig", "x").is_err());
		assert!(fields.push("", "x").is_err());
		assert!(fields.push("a=b", "x").is_err());
		assert!(fields.push("a;b", "x").is_err());
		assert!(fields.push("uid", "jo;hn").is_err());
		assert!(fields.is_empty());
	}

	#[test]
	fn values_may_contain_equals() {
		let fields = TicketFields::new().with("udata", "k=v").unwrap();
		let parsed = TicketFields::parse_canonical(&fields.canonical()).unwrap();
		assert_eq!(parsed.get("udata"), Some("k=v"));
	}

	#[test]
	fn parse_rejects_fields_without_separator() {
		assert!(matches!(
			TicketFields::parse_canonical("uid=john;garbage"),
			Err(TicketError::SignatureInvalid)
		));
	}

	#[test]
	fn get_returns_first_match() {
		let fields = TicketFields::new()
			.with(UID_FIELD, "john")
			.unwrap()
			.with(VALID_UNTIL_FIELD, "42")
			.unwrap();
		assert_eq!(fields.get(UID_FIELD), Some("john"));
		assert_eq!(fields.get(VALID_UNTIL_FIELD), Some("42"));
		assert_eq!(fields.get("tokens"), None);
		assert_eq!(fields.len(), 2);
	}
}
