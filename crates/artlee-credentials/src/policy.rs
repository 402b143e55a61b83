// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Synthetic test-data detection.
//!
//! Placeholder credentials written by demos and QA fixtures use reserved
//! prefixes. Such values are never authoritative: they are not saved, and a
//! tier that returns them is ignored during a load.

use std::fmt::Debug;

use crate::model::CredentialSet;

/// Reserved prefixes marking synthetic placeholder values.
pub const RESERVED_TEST_PREFIXES: [&str; 3] = ["test_key_", "test_call_agent_", "test_sms_agent_"];

pub trait TestDataPolicy: Send + Sync + Debug {
	fn is_test_data(&self, credentials: &CredentialSet) -> bool;
}

/// Flags a set when any field starts with any reserved prefix.
#[derive(Debug, Clone)]
pub struct ReservedPrefixPolicy {
	prefixes: Vec<String>,
}

impl ReservedPrefixPolicy {
	pub fn with_prefixes<I, S>(prefixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			prefixes: prefixes.into_iter().map(Into::into).collect(),
		}
	}

	fn matches(&self, value: &str) -> bool {
		self.prefixes.iter().any(|p| value.starts_with(p.as_str()))
	}
}

impl Default for ReservedPrefixPolicy {
	fn default() -> Self {
		Self::with_prefixes(RESERVED_TEST_PREFIXES)
	}
}

impl TestDataPolicy for ReservedPrefixPolicy {
	fn is_test_data(&self, credentials: &CredentialSet) -> bool {
		credentials
			.api_key
			.as_ref()
			.is_some_and(|k| self.matches(k.expose()))
			|| credentials
				.call_agent_id
				.as_deref()
				.is_some_and(|id| self.matches(id))
			|| credentials
				.sms_agent_id
				.as_deref()
				.is_some_and(|id| self.matches(id))
	}
}

/// [`ReservedPrefixPolicy`] with the standard prefixes.
pub fn is_test_data(credentials: &CredentialSet) -> bool {
	ReservedPrefixPolicy::default().is_test_data(credentials)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn reserved_prefixes_are_detected_on_any_field() {
		assert!(is_test_data(&CredentialSet::default().with_api_key("test_key_123")));
		assert!(is_test_data(
			&CredentialSet::default().with_call_agent_id("test_call_agent_1")
		));
		assert!(is_test_data(
			&CredentialSet::default()
				.with_api_key("key_real")
				.with_sms_agent_id("test_sms_agent_9")
		));
	}

	#[test]
	fn real_and_empty_sets_are_not_test_data() {
		assert!(!is_test_data(&CredentialSet::default()));
		assert!(!is_test_data(
			&CredentialSet::default()
				.with_api_key("key_3660938283961c067186004a50e3")
				.with_call_agent_id("agent_ca2a01536c2e94d0ff4e50df70")
		));
	}

	#[test]
	fn custom_prefixes_replace_the_defaults() {
		let policy = ReservedPrefixPolicy::with_prefixes(["synthetic-"]);
		assert!(policy.is_test_data(&CredentialSet::default().with_api_key("synthetic-key")));
		assert!(!policy.is_test_data(&CredentialSet::default().with_api_key("test_key_123")));
	}

	proptest! {
		#[test]
		fn properly_prefixed_real_values_are_never_flagged(
			key in "key_[a-f0-9]{8,32}",
			agent in "agent_[a-f0-9]{8,32}",
		) {
			let creds = CredentialSet::default().with_api_key(key).with_call_agent_id(agent);
			prop_assert!(!is_test_data(&creds));
		}

		#[test]
		fn test_key_prefix_is_always_flagged(suffix in "[a-z0-9]{0,16}") {
			let creds = CredentialSet::default().with_api_key(format!("test_key_{suffix}"));
			prop_assert!(is_test_data(&creds));
		}
	}
}
