// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant scoping.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

/// Supplies the active tenant. No I/O; consulted before every cloud call.
pub trait TenantResolver: Send + Sync + Debug {
	fn current_tenant(&self) -> String;
}

/// Resolver backed by the configured tenant id.
#[derive(Debug, Clone)]
pub struct StaticTenantResolver {
	tenant_id: String,
}

impl StaticTenantResolver {
	pub fn new(tenant_id: impl Into<String>) -> Self {
		Self {
			tenant_id: tenant_id.into(),
		}
	}
}

impl TenantResolver for StaticTenantResolver {
	fn current_tenant(&self) -> String {
		self.tenant_id.clone()
	}
}

/// A (tenant, user) pair as supplied by the caller. The user may be missing
/// before sign-in completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantScope {
	pub tenant_id: String,
	pub user_id: Option<String>,
}

impl TenantScope {
	pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
		Self {
			tenant_id: tenant_id.into(),
			user_id: Some(user_id.into()),
		}
	}

	pub fn anonymous(tenant_id: impl Into<String>) -> Self {
		Self {
			tenant_id: tenant_id.into(),
			user_id: None,
		}
	}

	/// Validated form, or `None` when either half is missing or blank.
	pub fn resolve(&self) -> Option<ResolvedScope> {
		let tenant_id = self.tenant_id.trim();
		let user_id = self.user_id.as_deref().map(str::trim)?;
		if tenant_id.is_empty() || user_id.is_empty() {
			return None;
		}
		Some(ResolvedScope {
			tenant_id: tenant_id.to_string(),
			user_id: user_id.to_string(),
		})
	}
}

/// Scope with both halves present. Every tier receives one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedScope {
	pub tenant_id: String,
	pub user_id: String,
}

impl ResolvedScope {
	/// Per-user key for browser-style storage tiers.
	pub fn storage_key(&self) -> String {
		format!("artlee:retell:{}:{}", self.tenant_id, self.user_id)
	}
}

impl fmt::Display for ResolvedScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.tenant_id, self.user_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolve_requires_user() {
		assert!(TenantScope::anonymous("artlee").resolve().is_none());
		assert!(TenantScope::new("artlee", "  ").resolve().is_none());
		assert!(TenantScope::new("", "user-1").resolve().is_none());
	}

	#[test]
	fn storage_key_includes_tenant_and_user() {
		let scope = TenantScope::new("artlee", "user-1").resolve().unwrap();
		assert_eq!(scope.storage_key(), "artlee:retell:artlee:user-1");
		assert_eq!(scope.to_string(), "artlee/user-1");
	}

	#[test]
	fn static_resolver_returns_configured_tenant() {
		assert_eq!(StaticTenantResolver::new("artlee").current_tenant(), "artlee");
	}
}
