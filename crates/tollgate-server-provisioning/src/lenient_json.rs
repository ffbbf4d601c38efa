// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsing of JSON bodies that carry a junk prefix.
//!
//! Gerrit prefixes every REST response with `)]}'` to defeat XSSI. Some
//! proxies add more. The first position from which a JSON object parses wins.

use serde_json::{Deserializer, Map, Value};

/// Parse the first JSON object found in `body`, skipping any prefix.
///
/// Anything after the object is ignored.
pub fn parse_object(body: &str) -> Option<Map<String, Value>> {
	body.match_indices('{').find_map(|(start, _)| {
		let mut values = Deserializer::from_str(&body[start..]).into_iter::<Value>();
		match values.next() {
			Some(Ok(Value::Object(map))) => Some(map),
			_ => None,
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn gerrit_prefix_is_skipped() {
		let map = parse_object(")]}'\n{\"_account_id\": 42}").unwrap();
		assert_eq!(map["_account_id"], 42);
	}

	#[test]
	fn arbitrary_garbage_is_skipped() {
		let map = parse_object("garb{\"_account_id\": 42}").unwrap();
		assert_eq!(map["_account_id"], 42);
	}

	#[test]
	fn broken_brace_in_prefix_is_skipped() {
		let map = parse_object("{oops {\"name\": \"john\"}").unwrap();
		assert_eq!(map["name"], "john");
	}

	#[test]
	fn nested_object_is_returned_whole() {
		let map = parse_object("x{\"a\": {\"b\": 1}} trailing").unwrap();
		assert_eq!(map["a"]["b"], 1);
	}

	#[test]
	fn no_object_yields_none() {
		assert!(parse_object("").is_none());
		assert!(parse_object("Not found").is_none());
		assert!(parse_object(")]}'\n[1, 2]").is_none());
	}

	#[test]
	fn empty_object_is_an_object() {
		assert!(parse_object("garb{}").unwrap().is_empty());
	}

	proptest! {
		#[test]
		fn any_brace_free_prefix_is_skipped(prefix in "[^{]{0,20}", id in 0i64..1_000_000) {
			let body = format!("{prefix}{{\"_account_id\": {id}}}");
			let map = parse_object(&body).unwrap();
			prop_assert_eq!(map["_account_id"].as_i64(), Some(id));
		}
	}
}
