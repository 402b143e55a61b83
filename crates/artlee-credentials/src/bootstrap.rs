// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use artlee_config::ArtleeConfig;
use sqlx::sqlite::SqlitePool;

use crate::codec::{AesGcmCodec, EncryptionCodec};
use crate::context::CredentialContext;
use crate::error::BootstrapError;
use crate::initializer::{CredentialConsumer, ServiceInitializer};
use crate::model::CredentialSet;
use crate::reconciler::{CredentialReconciler, ReconcilerTiers};
use crate::tenant::{StaticTenantResolver, TenantResolver, TenantScope};
use crate::tier::{create_pool, ensure_schema, CloudPrimaryTier, CloudSecondaryTier, StorageTier};

/// Everything the application root owns for credential handling.
#[derive(Debug, Clone)]
pub struct CredentialRuntime {
	pub reconciler: Arc<CredentialReconciler>,
	pub context: Arc<CredentialContext>,
	pub resolver: Arc<dyn TenantResolver>,
	pub pool: SqlitePool,
}

impl CredentialRuntime {
	/// Connect the database, create the schema and wire every tier.
	#[tracing::instrument(skip_all, fields(tenant_id = %config.tenant_id))]
	pub async fn from_config(config: &ArtleeConfig) -> Result<Self, BootstrapError> {
		let pool = create_pool(&config.cloud.database_url).await?;
		ensure_schema(&pool).await?;
		Self::with_pool(config, pool)
	}

	/// Wire the runtime over an existing pool whose schema is in place.
	pub fn with_pool(config: &ArtleeConfig, pool: SqlitePool) -> Result<Self, BootstrapError> {
		let codec: Arc<dyn EncryptionCodec> =
			Arc::new(AesGcmCodec::from_encoded_key(config.encryption.key.expose())?);
		let resolver: Arc<dyn TenantResolver> =
			Arc::new(StaticTenantResolver::new(config.tenant_id.clone()));
		let context = Arc::new(CredentialContext::new());

		let tiers = ReconcilerTiers {
			primary: CloudPrimaryTier::sqlite(pool.clone(), codec, resolver.clone()),
			secondary: Arc::new(CloudSecondaryTier::sqlite(pool.clone(), resolver.clone())),
			local: Arc::new(StorageTier::local(&config.storage.local_path)),
			session: Arc::new(StorageTier::session()),
			memory: Arc::new(StorageTier::memory()),
		};

		let mut reconciler = CredentialReconciler::new(tiers, resolver.clone(), context.clone());
		if let Some(fallback) = &config.fallback {
			reconciler = reconciler.with_fallback(CredentialSet::new(
				fallback.api_key.clone(),
				fallback.call_agent_id.clone(),
				fallback.sms_agent_id.clone(),
			));
		}

		tracing::info!(
			local_path = %config.storage.local_path.display(),
			has_fallback = config.fallback.is_some(),
			"credential runtime ready"
		);
		Ok(Self {
			reconciler: Arc::new(reconciler),
			context,
			resolver,
			pool,
		})
	}

	/// Scope for `user_id` under the configured tenant.
	pub fn scope_for(&self, user_id: impl Into<String>) -> TenantScope {
		TenantScope::new(self.resolver.current_tenant(), user_id)
	}

	pub fn initializer(&self, consumers: Vec<Arc<dyn CredentialConsumer>>) -> ServiceInitializer {
		consumers
			.into_iter()
			.fold(ServiceInitializer::new(self.reconciler.clone()), |init, c| {
				init.with_consumer(c)
			})
	}
}
