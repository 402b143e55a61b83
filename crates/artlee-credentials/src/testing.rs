// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests: in-memory pools, broken schemas and failing tiers.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::TierError;
use crate::model::{CredentialSet, TierKind};
use crate::tenant::ResolvedScope;
use crate::tier::{ensure_schema, CredentialTier, KeyValueStorage};

/// An empty in-memory database. Single connection so every query sees the
/// same database.
pub async fn empty_pool() -> Result<SqlitePool, sqlx::Error> {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
}

/// In-memory database with the production schema.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
	let pool = empty_pool().await?;
	ensure_schema(&pool).await?;
	Ok(pool)
}

/// A `profiles` table that predates the agent-config column, and no
/// `user_settings` table.
pub async fn pool_without_agent_config() -> Result<SqlitePool, sqlx::Error> {
	let pool = empty_pool().await?;
	sqlx::query(
		r#"
		CREATE TABLE profiles (
			user_id TEXT NOT NULL,
			tenant_id TEXT NOT NULL,
			encrypted_retell_api_key TEXT,
			updated_at TEXT NOT NULL,
			UNIQUE(user_id, tenant_id)
		)
		"#,
	)
	.execute(&pool)
	.await?;
	Ok(pool)
}

/// Add the `user_settings` table to a pool built by
/// [`pool_without_agent_config`].
pub async fn create_settings_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS user_settings (
			user_id TEXT NOT NULL,
			tenant_id TEXT NOT NULL,
			retell_call_agent_id TEXT,
			retell_sms_agent_id TEXT,
			updated_at TEXT NOT NULL,
			UNIQUE(user_id, tenant_id)
		)
		"#,
	)
	.execute(pool)
	.await?;
	Ok(())
}

/// Key/value storage whose every call fails.
#[derive(Debug, Default)]
pub struct FailingStorage;

#[async_trait]
impl KeyValueStorage for FailingStorage {
	async fn get_item(&self, _key: &str) -> Result<Option<String>, TierError> {
		Err(TierError::Unavailable("storage disabled".to_string()))
	}

	async fn set_item(&self, _key: &str, _value: &str) -> Result<(), TierError> {
		Err(TierError::Unavailable("quota exceeded".to_string()))
	}

	async fn remove_item(&self, _key: &str) -> Result<(), TierError> {
		Err(TierError::Unavailable("storage disabled".to_string()))
	}
}

/// Wraps a tier and counts calls.
#[derive(Debug)]
pub struct CountingTier<T> {
	inner: T,
	gets: AtomicUsize,
	sets: AtomicUsize,
}

impl<T> CountingTier<T> {
	pub fn new(inner: T) -> Self {
		Self {
			inner,
			gets: AtomicUsize::new(0),
			sets: AtomicUsize::new(0),
		}
	}

	pub fn gets(&self) -> usize {
		self.gets.load(Ordering::SeqCst)
	}

	pub fn sets(&self) -> usize {
		self.sets.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl<T: CredentialTier> CredentialTier for CountingTier<T> {
	fn kind(&self) -> TierKind {
		self.inner.kind()
	}

	async fn get(&self, scope: &ResolvedScope) -> Result<Option<CredentialSet>, TierError> {
		self.gets.fetch_add(1, Ordering::SeqCst);
		self.inner.get(scope).await
	}

	async fn set(&self, scope: &ResolvedScope, credentials: &CredentialSet) -> Result<(), TierError> {
		self.sets.fetch_add(1, Ordering::SeqCst);
		self.inner.set(scope, credentials).await
	}
}
