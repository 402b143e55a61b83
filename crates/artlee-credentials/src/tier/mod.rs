// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage tiers.
//!
//! Every tier holds at most one [`CredentialSet`] per (tenant, user) and
//! exposes the same `get`/`set` pair, so the reconciler walks an ordered list
//! of tiers instead of special-casing each backend. Cloud tiers have extra
//! operations, found on their concrete types.

pub mod cloud;
pub mod schema;
pub mod storage;

use async_trait::async_trait;

use crate::error::TierError;
use crate::model::{CredentialSet, TierKind};
use crate::tenant::ResolvedScope;

pub use cloud::{
	AgentConfig, CloudPrimaryTier, CloudSecondaryTier, PrimaryFetch, ProfileRow, ProfileStore,
	SettingsRow, SettingsStore, SqliteProfileRepository, SqliteSettingsRepository,
};
pub use schema::{create_pool, ensure_schema};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageTier};

#[async_trait]
pub trait CredentialTier: Send + Sync + std::fmt::Debug {
	fn kind(&self) -> TierKind;

	/// `Ok(None)` when the tier holds nothing for this scope.
	async fn get(&self, scope: &ResolvedScope) -> Result<Option<CredentialSet>, TierError>;

	/// Write the present fields. Absent fields keep whatever the tier holds.
	async fn set(&self, scope: &ResolvedScope, credentials: &CredentialSet) -> Result<(), TierError>;
}
