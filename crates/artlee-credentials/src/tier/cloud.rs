// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cloud tiers: the per-user `profiles` table (primary) and the per-tenant
//! `user_settings` table (secondary).
//!
//! Every statement filters on both `user_id` and `tenant_id`, and every
//! upsert resolves conflicts on that composite key. Before each call the
//! tier asks the [`TenantResolver`] for the active tenant and refuses to act
//! for any other.

use std::sync::Arc;

use artlee_common_secret::SecretString;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};

use super::CredentialTier;
use crate::codec::EncryptionCodec;
use crate::error::{CodecError, TierError};
use crate::model::{CredentialSet, TierKind};
use crate::tenant::{ResolvedScope, TenantResolver};

/// Agent identifiers as stored in the profile row's JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub call_agent_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sms_agent_id: Option<String>,
}

impl AgentConfig {
	pub fn is_empty(&self) -> bool {
		self.call_agent_id.is_none() && self.sms_agent_id.is_none()
	}
}

impl From<&CredentialSet> for AgentConfig {
	fn from(creds: &CredentialSet) -> Self {
		Self {
			call_agent_id: creds.call_agent_id.clone(),
			sms_agent_id: creds.sms_agent_id.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
	pub user_id: String,
	pub tenant_id: String,
	pub encrypted_retell_api_key: Option<String>,
	/// `None` when the column is NULL, unparseable, or absent from the schema.
	pub agent_config: Option<AgentConfig>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SettingsRow {
	pub user_id: String,
	pub tenant_id: String,
	pub retell_call_agent_id: Option<String>,
	pub retell_sms_agent_id: Option<String>,
	pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync + std::fmt::Debug {
	async fn get_profile(&self, scope: &ResolvedScope) -> Result<Option<ProfileRow>, TierError>;

	/// Insert or update the row for `scope`. A `None` key keeps the stored
	/// ciphertext. A `None` agent config leaves the agent-config column out
	/// of the statement entirely.
	async fn upsert_profile(
		&self,
		scope: &ResolvedScope,
		encrypted_api_key: Option<&str>,
		agent_config: Option<&AgentConfig>,
	) -> Result<(), TierError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync + std::fmt::Debug {
	async fn get_settings(&self, scope: &ResolvedScope) -> Result<Option<SettingsRow>, TierError>;

	/// Insert or update agent identifiers. `None` keeps the stored value.
	async fn upsert_settings(
		&self,
		scope: &ResolvedScope,
		call_agent_id: Option<&str>,
		sms_agent_id: Option<&str>,
	) -> Result<(), TierError>;
}

#[async_trait]
impl ProfileStore for SqliteProfileRepository {
	async fn get_profile(&self, scope: &ResolvedScope) -> Result<Option<ProfileRow>, TierError> {
		self.get_profile(scope).await
	}

	async fn upsert_profile(
		&self,
		scope: &ResolvedScope,
		encrypted_api_key: Option<&str>,
		agent_config: Option<&AgentConfig>,
	) -> Result<(), TierError> {
		self
			.upsert_profile(scope, encrypted_api_key, agent_config)
			.await
	}
}

/// Repository for the `profiles` table.
#[derive(Debug, Clone)]
pub struct SqliteProfileRepository {
	pool: SqlitePool,
}

impl SqliteProfileRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch the profile row for `scope`.
	///
	/// If the agent-config column is unknown to the database, the row is
	/// fetched without it so the API key is still available.
	#[tracing::instrument(skip(self), fields(tenant_id = %scope.tenant_id, user_id = %scope.user_id))]
	pub async fn get_profile(&self, scope: &ResolvedScope) -> Result<Option<ProfileRow>, TierError> {
		let full = sqlx::query(
			r#"
			SELECT user_id, tenant_id, encrypted_retell_api_key, retell_agent_config, updated_at
			FROM profiles
			WHERE user_id = ? AND tenant_id = ?
			"#,
		)
		.bind(&scope.user_id)
		.bind(&scope.tenant_id)
		.fetch_optional(&self.pool)
		.await;

		let err = match full {
			Ok(Some(row)) => return parse_profile_row(&row, true).map(Some),
			Ok(None) => return Ok(None),
			Err(e) => TierError::from(e),
		};
		if !err.is_schema_mismatch() {
			return Err(err);
		}

		tracing::warn!(error = %err, "profiles schema lacks agent config, reading api key only");
		let row = sqlx::query(
			r#"
			SELECT user_id, tenant_id, encrypted_retell_api_key, updated_at
			FROM profiles
			WHERE user_id = ? AND tenant_id = ?
			"#,
		)
		.bind(&scope.user_id)
		.bind(&scope.tenant_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|row| parse_profile_row(&row, false)).transpose()
	}

	#[tracing::instrument(
		skip(self, encrypted_api_key, agent_config),
		fields(
			tenant_id = %scope.tenant_id,
			user_id = %scope.user_id,
			has_key = encrypted_api_key.is_some(),
			has_agent_config = agent_config.is_some()
		)
	)]
	pub async fn upsert_profile(
		&self,
		scope: &ResolvedScope,
		encrypted_api_key: Option<&str>,
		agent_config: Option<&AgentConfig>,
	) -> Result<(), TierError> {
		let now = Utc::now().to_rfc3339();

		match agent_config {
			Some(config) => {
				let config_json = serde_json::to_string(config)?;
				sqlx::query(
					r#"
					INSERT INTO profiles (
						user_id, tenant_id, encrypted_retell_api_key, retell_agent_config, updated_at
					) VALUES (?, ?, ?, ?, ?)
					ON CONFLICT(user_id, tenant_id) DO UPDATE SET
						encrypted_retell_api_key = COALESCE(
							excluded.encrypted_retell_api_key,
							profiles.encrypted_retell_api_key
						),
						retell_agent_config = excluded.retell_agent_config,
						updated_at = excluded.updated_at
					"#,
				)
				.bind(&scope.user_id)
				.bind(&scope.tenant_id)
				.bind(encrypted_api_key)
				.bind(config_json)
				.bind(&now)
				.execute(&self.pool)
				.await?;
			}
			None => {
				sqlx::query(
					r#"
					INSERT INTO profiles (user_id, tenant_id, encrypted_retell_api_key, updated_at)
					VALUES (?, ?, ?, ?)
					ON CONFLICT(user_id, tenant_id) DO UPDATE SET
						encrypted_retell_api_key = COALESCE(
							excluded.encrypted_retell_api_key,
							profiles.encrypted_retell_api_key
						),
						updated_at = excluded.updated_at
					"#,
				)
				.bind(&scope.user_id)
				.bind(&scope.tenant_id)
				.bind(encrypted_api_key)
				.bind(&now)
				.execute(&self.pool)
				.await?;
			}
		}

		tracing::debug!("profile upserted");
		Ok(())
	}
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TierError> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| TierError::Serialization(format!("invalid updated_at: {e}")))
}

fn parse_profile_row(
	row: &sqlx::sqlite::SqliteRow,
	with_agent_config: bool,
) -> Result<ProfileRow, TierError> {
	let updated_at: String = row.try_get("updated_at")?;
	let agent_config = if with_agent_config {
		let raw: Option<String> = row.try_get("retell_agent_config")?;
		raw.and_then(|raw| match serde_json::from_str::<AgentConfig>(&raw) {
			Ok(config) => Some(config),
			Err(e) => {
				tracing::warn!(error = %e, "ignoring unparseable agent config");
				None
			}
		})
	} else {
		None
	};

	Ok(ProfileRow {
		user_id: row.try_get("user_id")?,
		tenant_id: row.try_get("tenant_id")?,
		encrypted_retell_api_key: row.try_get("encrypted_retell_api_key")?,
		agent_config,
		updated_at: parse_timestamp(&updated_at)?,
	})
}

#[async_trait]
impl SettingsStore for SqliteSettingsRepository {
	async fn get_settings(&self, scope: &ResolvedScope) -> Result<Option<SettingsRow>, TierError> {
		self.get_settings(scope).await
	}

	async fn upsert_settings(
		&self,
		scope: &ResolvedScope,
		call_agent_id: Option<&str>,
		sms_agent_id: Option<&str>,
	) -> Result<(), TierError> {
		self
			.upsert_settings(scope, call_agent_id, sms_agent_id)
			.await
	}
}

/// Repository for the `user_settings` table.
#[derive(Debug, Clone)]
pub struct SqliteSettingsRepository {
	pool: SqlitePool,
}

impl SqliteSettingsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %scope.tenant_id, user_id = %scope.user_id))]
	pub async fn get_settings(&self, scope: &ResolvedScope) -> Result<Option<SettingsRow>, TierError> {
		let row = sqlx::query(
			r#"
			SELECT user_id, tenant_id, retell_call_agent_id, retell_sms_agent_id, updated_at
			FROM user_settings
			WHERE user_id = ? AND tenant_id = ?
			"#,
		)
		.bind(&scope.user_id)
		.bind(&scope.tenant_id)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let updated_at: String = row.try_get("updated_at")?;
		Ok(Some(SettingsRow {
			user_id: row.try_get("user_id")?,
			tenant_id: row.try_get("tenant_id")?,
			retell_call_agent_id: row.try_get("retell_call_agent_id")?,
			retell_sms_agent_id: row.try_get("retell_sms_agent_id")?,
			updated_at: parse_timestamp(&updated_at)?,
		}))
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %scope.tenant_id, user_id = %scope.user_id))]
	pub async fn upsert_settings(
		&self,
		scope: &ResolvedScope,
		call_agent_id: Option<&str>,
		sms_agent_id: Option<&str>,
	) -> Result<(), TierError> {
		sqlx::query(
			r#"
			INSERT INTO user_settings (
				user_id, tenant_id, retell_call_agent_id, retell_sms_agent_id, updated_at
			) VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(user_id, tenant_id) DO UPDATE SET
				retell_call_agent_id = COALESCE(
					excluded.retell_call_agent_id,
					user_settings.retell_call_agent_id
				),
				retell_sms_agent_id = COALESCE(
					excluded.retell_sms_agent_id,
					user_settings.retell_sms_agent_id
				),
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&scope.user_id)
		.bind(&scope.tenant_id)
		.bind(call_agent_id)
		.bind(sms_agent_id)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!("user settings upserted");
		Ok(())
	}
}

fn check_tenant(resolver: &dyn TenantResolver, scope: &ResolvedScope) -> Result<(), TierError> {
	let current = resolver.current_tenant();
	if current != scope.tenant_id {
		return Err(TierError::TenantMismatch {
			scope: scope.tenant_id.clone(),
			current,
		});
	}
	Ok(())
}

/// What the primary tier returned for a scope.
#[derive(Debug, Clone)]
pub struct PrimaryFetch {
	pub credentials: CredentialSet,
	/// Set when a stored key existed but could not be decrypted. The key is
	/// then absent from `credentials`.
	pub decryption_error: Option<CodecError>,
	/// The row's agent config was missing or held no identifiers.
	pub agent_config_empty: bool,
}

/// Cloud-primary: the encrypted API key plus the agent-config JSON column.
#[derive(Debug, Clone)]
pub struct CloudPrimaryTier {
	store: Arc<dyn ProfileStore>,
	codec: Arc<dyn EncryptionCodec>,
	resolver: Arc<dyn TenantResolver>,
}

impl CloudPrimaryTier {
	pub fn new(
		store: Arc<dyn ProfileStore>,
		codec: Arc<dyn EncryptionCodec>,
		resolver: Arc<dyn TenantResolver>,
	) -> Self {
		Self {
			store,
			codec,
			resolver,
		}
	}

	pub fn sqlite(
		pool: SqlitePool,
		codec: Arc<dyn EncryptionCodec>,
		resolver: Arc<dyn TenantResolver>,
	) -> Self {
		Self::new(Arc::new(SqliteProfileRepository::new(pool)), codec, resolver)
	}

	pub async fn fetch(&self, scope: &ResolvedScope) -> Result<Option<PrimaryFetch>, TierError> {
		check_tenant(self.resolver.as_ref(), scope)?;
		let Some(row) = self.store.get_profile(scope).await? else {
			return Ok(None);
		};

		let (api_key, decryption_error) = match row.encrypted_retell_api_key.as_deref() {
			Some(sealed) if !sealed.trim().is_empty() => match self.codec.decrypt(sealed) {
				Ok(key) => (Some(key), None),
				Err(e) => {
					tracing::warn!(error = %e, "stored api key could not be decrypted");
					(None, Some(e))
				}
			},
			_ => (None, None),
		};

		let agent = row.agent_config.unwrap_or_default();
		let credentials = CredentialSet::new(api_key, agent.call_agent_id, agent.sms_agent_id);
		let agent_config_empty = !credentials.has_agent_ids();
		Ok(Some(PrimaryFetch {
			credentials,
			decryption_error,
			agent_config_empty,
		}))
	}

	/// Encrypt the key and upsert it with the agent config as one object.
	/// When no agent id is present the agent-config column is not touched.
	pub async fn write_full(
		&self,
		scope: &ResolvedScope,
		credentials: &CredentialSet,
	) -> Result<(), TierError> {
		check_tenant(self.resolver.as_ref(), scope)?;
		let encrypted = credentials
			.api_key
			.as_ref()
			.map(|key| self.codec.encrypt(key))
			.transpose()?;
		let agent_config = credentials
			.has_agent_ids()
			.then(|| AgentConfig::from(credentials));

		if encrypted.is_none() && agent_config.is_none() {
			return Ok(());
		}
		self
			.store
			.upsert_profile(scope, encrypted.as_deref(), agent_config.as_ref())
			.await
	}

	pub async fn write_api_key_only(
		&self,
		scope: &ResolvedScope,
		api_key: &SecretString,
	) -> Result<(), TierError> {
		check_tenant(self.resolver.as_ref(), scope)?;
		let encrypted = self.codec.encrypt(api_key)?;
		self.store.upsert_profile(scope, Some(&encrypted), None).await
	}
}

#[async_trait]
impl CredentialTier for CloudPrimaryTier {
	fn kind(&self) -> TierKind {
		TierKind::CloudPrimary
	}

	async fn get(&self, scope: &ResolvedScope) -> Result<Option<CredentialSet>, TierError> {
		Ok(self
			.fetch(scope)
			.await?
			.map(|fetch| fetch.credentials)
			.filter(|creds| !creds.is_empty()))
	}

	async fn set(&self, scope: &ResolvedScope, credentials: &CredentialSet) -> Result<(), TierError> {
		self.write_full(scope, credentials).await
	}
}

/// Cloud-secondary: agent identifiers only. The secret never lands here.
#[derive(Debug, Clone)]
pub struct CloudSecondaryTier {
	store: Arc<dyn SettingsStore>,
	resolver: Arc<dyn TenantResolver>,
}

impl CloudSecondaryTier {
	pub fn new(store: Arc<dyn SettingsStore>, resolver: Arc<dyn TenantResolver>) -> Self {
		Self { store, resolver }
	}

	pub fn sqlite(pool: SqlitePool, resolver: Arc<dyn TenantResolver>) -> Self {
		Self::new(Arc::new(SqliteSettingsRepository::new(pool)), resolver)
	}
}

#[async_trait]
impl CredentialTier for CloudSecondaryTier {
	fn kind(&self) -> TierKind {
		TierKind::CloudSecondary
	}

	async fn get(&self, scope: &ResolvedScope) -> Result<Option<CredentialSet>, TierError> {
		check_tenant(self.resolver.as_ref(), scope)?;
		let Some(row) = self.store.get_settings(scope).await? else {
			return Ok(None);
		};
		let creds = CredentialSet::new(None, row.retell_call_agent_id, row.retell_sms_agent_id);
		Ok((!creds.is_empty()).then_some(creds))
	}

	async fn set(&self, scope: &ResolvedScope, credentials: &CredentialSet) -> Result<(), TierError> {
		check_tenant(self.resolver.as_ref(), scope)?;
		if !credentials.has_agent_ids() {
			return Ok(());
		}
		self
			.store
			.upsert_settings(
				scope,
				credentials.call_agent_id.as_deref(),
				credentials.sms_agent_id.as_deref(),
			)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::{AesGcmCodec, KEY_SIZE};
	use crate::tenant::{StaticTenantResolver, TenantScope};
	use crate::testing;

	fn scope(tenant: &str, user: &str) -> ResolvedScope {
		TenantScope::new(tenant, user).resolve().unwrap()
	}

	fn codec() -> Arc<dyn EncryptionCodec> {
		Arc::new(AesGcmCodec::new([3u8; KEY_SIZE]))
	}

	fn resolver(tenant: &str) -> Arc<dyn TenantResolver> {
		Arc::new(StaticTenantResolver::new(tenant))
	}

	async fn row_count(pool: &SqlitePool, table: &str) -> i64 {
		sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
			.fetch_one(pool)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn primary_roundtrip_encrypts_the_key_at_rest() {
		let pool = testing::memory_pool().await.unwrap();
		let tier = CloudPrimaryTier::sqlite(pool.clone(), codec(), resolver("artlee"));
		let s = scope("artlee", "u1");
		let creds = CredentialSet::default()
			.with_api_key("key_secret")
			.with_call_agent_id("agent_1");

		tier.set(&s, &creds).await.unwrap();
		assert_eq!(tier.get(&s).await.unwrap(), Some(creds));

		let stored: Option<String> =
			sqlx::query_scalar("SELECT encrypted_retell_api_key FROM profiles")
				.fetch_one(&pool)
				.await
				.unwrap();
		let stored = stored.unwrap();
		assert!(stored.starts_with("v1:"));
		assert!(!stored.contains("key_secret"));
	}

	#[tokio::test]
	async fn repeated_upserts_keep_one_row() {
		let pool = testing::memory_pool().await.unwrap();
		let primary = CloudPrimaryTier::sqlite(pool.clone(), codec(), resolver("artlee"));
		let secondary = CloudSecondaryTier::sqlite(pool.clone(), resolver("artlee"));
		let s = scope("artlee", "u1");
		let creds = CredentialSet::default()
			.with_api_key("key_abc")
			.with_call_agent_id("agent_1");

		for _ in 0..2 {
			primary.set(&s, &creds).await.unwrap();
			secondary.set(&s, &creds).await.unwrap();
		}
		assert_eq!(row_count(&pool, "profiles").await, 1);
		assert_eq!(row_count(&pool, "user_settings").await, 1);
	}

	#[tokio::test]
	async fn key_only_write_preserves_agent_config() {
		let pool = testing::memory_pool().await.unwrap();
		let tier = CloudPrimaryTier::sqlite(pool, codec(), resolver("artlee"));
		let s = scope("artlee", "u1");
		tier
			.set(
				&s,
				&CredentialSet::default()
					.with_api_key("key_old")
					.with_call_agent_id("agent_1"),
			)
			.await
			.unwrap();

		tier
			.write_api_key_only(&s, &SecretString::from("key_new"))
			.await
			.unwrap();

		let fetched = tier.fetch(&s).await.unwrap().unwrap().credentials;
		assert_eq!(fetched.api_key.unwrap().expose(), "key_new");
		assert_eq!(fetched.call_agent_id.as_deref(), Some("agent_1"));
	}

	#[tokio::test]
	async fn agent_config_is_replaced_as_a_whole() {
		let pool = testing::memory_pool().await.unwrap();
		let tier = CloudPrimaryTier::sqlite(pool, codec(), resolver("artlee"));
		let s = scope("artlee", "u1");
		tier
			.set(
				&s,
				&CredentialSet::default()
					.with_call_agent_id("agent_call")
					.with_sms_agent_id("agent_sms"),
			)
			.await
			.unwrap();
		tier
			.set(&s, &CredentialSet::default().with_call_agent_id("agent_call_2"))
			.await
			.unwrap();

		let fetched = tier.fetch(&s).await.unwrap().unwrap().credentials;
		assert_eq!(fetched.call_agent_id.as_deref(), Some("agent_call_2"));
		assert!(fetched.sms_agent_id.is_none());
	}

	#[tokio::test]
	async fn secondary_absent_fields_keep_stored_values() {
		let pool = testing::memory_pool().await.unwrap();
		let tier = CloudSecondaryTier::sqlite(pool, resolver("artlee"));
		let s = scope("artlee", "u1");
		tier
			.set(
				&s,
				&CredentialSet::default()
					.with_call_agent_id("agent_call")
					.with_sms_agent_id("agent_sms"),
			)
			.await
			.unwrap();
		tier
			.set(&s, &CredentialSet::default().with_call_agent_id("agent_call_2"))
			.await
			.unwrap();

		let stored = tier.get(&s).await.unwrap().unwrap();
		assert_eq!(stored.call_agent_id.as_deref(), Some("agent_call_2"));
		assert_eq!(stored.sms_agent_id.as_deref(), Some("agent_sms"));
		assert!(stored.api_key.is_none());
	}

	#[tokio::test]
	async fn undecryptable_key_is_reported_and_treated_as_absent() {
		let pool = testing::memory_pool().await.unwrap();
		let writer = CloudPrimaryTier::sqlite(pool.clone(), codec(), resolver("artlee"));
		let s = scope("artlee", "u1");
		writer
			.set(
				&s,
				&CredentialSet::default()
					.with_api_key("key_abc")
					.with_call_agent_id("agent_1"),
			)
			.await
			.unwrap();

		let rotated: Arc<dyn EncryptionCodec> = Arc::new(AesGcmCodec::new([4u8; KEY_SIZE]));
		let reader = CloudPrimaryTier::sqlite(pool, rotated, resolver("artlee"));
		let fetch = reader.fetch(&s).await.unwrap().unwrap();
		assert!(fetch.credentials.api_key.is_none());
		assert!(matches!(fetch.decryption_error, Some(CodecError::Decryption(_))));
		assert_eq!(fetch.credentials.call_agent_id.as_deref(), Some("agent_1"));
	}

	#[tokio::test]
	async fn tiers_refuse_scopes_for_other_tenants() {
		let pool = testing::memory_pool().await.unwrap();
		let primary = CloudPrimaryTier::sqlite(pool.clone(), codec(), resolver("artlee"));
		let secondary = CloudSecondaryTier::sqlite(pool, resolver("artlee"));
		let other = scope("other-tenant", "u1");
		let creds = CredentialSet::default().with_call_agent_id("agent_1");

		assert!(matches!(
			primary.set(&other, &creds).await,
			Err(TierError::TenantMismatch { .. })
		));
		assert!(matches!(
			secondary.get(&other).await,
			Err(TierError::TenantMismatch { .. })
		));
	}

	#[tokio::test]
	async fn rows_are_isolated_by_tenant() {
		let pool = testing::memory_pool().await.unwrap();
		let repo = SqliteProfileRepository::new(pool);
		let config = AgentConfig {
			call_agent_id: Some("agent_a".into()),
			sms_agent_id: None,
		};
		repo
			.upsert_profile(&scope("tenant-a", "u1"), None, Some(&config))
			.await
			.unwrap();

		assert!(repo.get_profile(&scope("tenant-b", "u1")).await.unwrap().is_none());
		let row = repo.get_profile(&scope("tenant-a", "u1")).await.unwrap().unwrap();
		assert_eq!(row.tenant_id, "tenant-a");
		assert_eq!(row.agent_config, Some(config));
	}

	#[tokio::test]
	async fn stale_schema_is_classified_as_schema_mismatch() {
		let pool = testing::pool_without_agent_config().await.unwrap();
		let tier = CloudPrimaryTier::sqlite(pool, codec(), resolver("artlee"));
		let s = scope("artlee", "u1");

		let err = tier
			.set(&s, &CredentialSet::default().with_call_agent_id("agent_1"))
			.await
			.unwrap_err();
		assert!(err.is_schema_mismatch(), "got {err:?}");

		tier
			.write_api_key_only(&s, &SecretString::from("key_abc"))
			.await
			.unwrap();
		let fetch = tier.fetch(&s).await.unwrap().unwrap();
		assert_eq!(fetch.credentials.api_key.unwrap().expose(), "key_abc");
		assert!(fetch.agent_config_empty);
	}

	#[tokio::test]
	async fn empty_agent_config_object_has_no_ids() {
		let pool = testing::memory_pool().await.unwrap();
		sqlx::query(
			"INSERT INTO profiles (user_id, tenant_id, retell_agent_config, updated_at) VALUES ('u1', 'artlee', '{}', ?)",
		)
		.bind(Utc::now().to_rfc3339())
		.execute(&pool)
		.await
		.unwrap();

		let tier = CloudPrimaryTier::sqlite(pool, codec(), resolver("artlee"));
		let fetch = tier.fetch(&scope("artlee", "u1")).await.unwrap().unwrap();
		assert!(fetch.agent_config_empty);
		assert!(fetch.credentials.is_empty());
	}
}
