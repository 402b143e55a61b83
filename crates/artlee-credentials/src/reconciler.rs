// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Multi-tier save and load.
//!
//! Saves go to cloud-primary first and degrade to a key-only primary write
//! plus cloud-secondary, then to the local tier. Memory and session always
//! receive a best-effort copy.
//!
//! Loads read cloud-primary, then fill any missing fields from
//! cloud-secondary, local, session and memory in that order, falling back to
//! the configured default set. Values recovered from lower tiers are written
//! back to cloud-primary.
//!
//! Neither path returns an error. Every tier failure becomes a
//! [`TierOutcome`] in the [`ReconciliationResult`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::context::CredentialContext;
use crate::model::{CredentialField, CredentialSet, CredentialSource, TierKind};
use crate::policy::{ReservedPrefixPolicy, TestDataPolicy};
use crate::result::{
	Operation, ReconciliationResult, RejectReason, TierAction, TierOutcome, TierStatus,
};
use crate::tenant::{ResolvedScope, TenantResolver, TenantScope};
use crate::tier::{CloudPrimaryTier, CredentialTier};

/// The tiers a reconciler works across.
#[derive(Debug, Clone)]
pub struct ReconcilerTiers {
	pub primary: CloudPrimaryTier,
	pub secondary: Arc<dyn CredentialTier>,
	pub local: Arc<dyn CredentialTier>,
	pub session: Arc<dyn CredentialTier>,
	pub memory: Arc<dyn CredentialTier>,
}

impl ReconcilerTiers {
	/// Read order after cloud-primary.
	fn lower(&self) -> [&Arc<dyn CredentialTier>; 4] {
		[&self.secondary, &self.local, &self.session, &self.memory]
	}

	fn caches(&self) -> [&Arc<dyn CredentialTier>; 2] {
		[&self.session, &self.memory]
	}
}

#[derive(Debug)]
pub struct CredentialReconciler {
	tiers: ReconcilerTiers,
	resolver: Arc<dyn TenantResolver>,
	context: Arc<CredentialContext>,
	policy: Arc<dyn TestDataPolicy>,
	fallback: Option<CredentialSet>,
}

impl CredentialReconciler {
	pub fn new(
		tiers: ReconcilerTiers,
		resolver: Arc<dyn TenantResolver>,
		context: Arc<CredentialContext>,
	) -> Self {
		Self {
			tiers,
			resolver,
			context,
			policy: Arc::new(ReservedPrefixPolicy::default()),
			fallback: None,
		}
	}

	pub fn with_policy(mut self, policy: Arc<dyn TestDataPolicy>) -> Self {
		self.policy = policy;
		self
	}

	/// The default set used when no tier holds a complete set.
	pub fn with_fallback(mut self, fallback: CredentialSet) -> Self {
		self.fallback = (!fallback.is_empty()).then_some(fallback);
		self
	}

	pub fn is_test_data(&self, credentials: &CredentialSet) -> bool {
		self.policy.is_test_data(credentials)
	}

	fn resolve_scope(&self, scope: &TenantScope) -> Result<ResolvedScope, RejectReason> {
		let resolved = scope.resolve().ok_or(RejectReason::TenantScopeMissing)?;
		let current = self.resolver.current_tenant();
		if current != resolved.tenant_id {
			warn!(scope_tenant = %resolved.tenant_id, current_tenant = %current, "tenant mismatch");
			return Err(RejectReason::TenantMismatch);
		}
		Ok(resolved)
	}

	#[tracing::instrument(skip_all, fields(tenant_id = %scope.tenant_id, user_id = ?scope.user_id))]
	pub async fn save(&self, scope: &TenantScope, credentials: &CredentialSet) -> ReconciliationResult {
		if self.context.is_logged_out() {
			info!("save skipped: user is logged out");
			return ReconciliationResult::rejected(Operation::Save, RejectReason::LoggedOut);
		}
		let scope = match self.resolve_scope(scope) {
			Ok(scope) => scope,
			Err(reason) => {
				warn!(?reason, "save rejected before any tier write");
				return ReconciliationResult::rejected(Operation::Save, reason);
			}
		};

		let creds = CredentialSet::new(
			credentials.api_key.clone(),
			credentials.call_agent_id.clone(),
			credentials.sms_agent_id.clone(),
		);
		if self.policy.is_test_data(&creds) {
			warn!("save rejected: synthetic test credentials");
			return ReconciliationResult::rejected(Operation::Save, RejectReason::TestData);
		}
		if let Err(field) = creds.validate_present() {
			warn!(%field, "save rejected: invalid credential format");
			return ReconciliationResult::rejected(Operation::Save, RejectReason::InvalidFormat(field));
		}
		if creds.is_empty() {
			return ReconciliationResult::rejected(Operation::Save, RejectReason::Empty);
		}

		let mut result = ReconciliationResult::new(Operation::Save);
		let cloud_complete = self.save_to_cloud(&scope, &creds, &mut result).await;

		if cloud_complete {
			result.record(TierOutcome::skipped(
				TierKind::Local,
				TierAction::Write,
				"cloud tiers accepted the set",
			));
		} else {
			match self.tiers.local.set(&scope, &creds).await {
				Ok(()) => {
					info!("credentials saved to local tier");
					result.record(TierOutcome::success(TierKind::Local, TierAction::Write));
				}
				Err(e) => {
					warn!(error = %e, "local tier write failed");
					result.record(TierOutcome::failed(
						TierKind::Local,
						TierAction::Write,
						e.to_string(),
					));
				}
			}
		}

		for cache in self.tiers.caches() {
			match cache.set(&scope, &creds).await {
				Ok(()) => result.record(TierOutcome::success(cache.kind(), TierAction::Mirror)),
				Err(e) => {
					warn!(tier = %cache.kind(), error = %e, "cache mirror failed");
					result.record(TierOutcome::failed(
						cache.kind(),
						TierAction::Mirror,
						e.to_string(),
					));
				}
			}
		}

		// When the cloud holds only part of the set, local is the one complete copy.
		let precedence = if cloud_complete {
			[TierKind::CloudPrimary, TierKind::CloudSecondary, TierKind::Local]
		} else {
			[TierKind::Local, TierKind::CloudPrimary, TierKind::CloudSecondary]
		};
		result.source = precedence
			.into_iter()
			.find(|tier| {
				result.outcomes_for(*tier).any(|o| {
					o.is_success() && matches!(o.action, TierAction::Write | TierAction::PartialWrite)
				})
			})
			.map(CredentialSource::Tier);
		result.credentials = creds;

		if result.is_total_failure() {
			warn!("save failed on every persistent tier");
		}
		result
	}

	/// Returns true when the cloud tiers hold every field of `creds`.
	async fn save_to_cloud(
		&self,
		scope: &ResolvedScope,
		creds: &CredentialSet,
		result: &mut ReconciliationResult,
	) -> bool {
		let primary_err = match self.tiers.primary.write_full(scope, creds).await {
			Ok(()) => {
				debug!("cloud-primary accepted full set");
				result.record(TierOutcome::success(TierKind::CloudPrimary, TierAction::Write));
				result.record(TierOutcome::skipped(
					TierKind::CloudSecondary,
					TierAction::Write,
					"cloud-primary accepted the full set",
				));
				return true;
			}
			Err(e) => e,
		};

		warn!(error = %primary_err, "cloud-primary write failed");
		result.record(TierOutcome::failed(
			TierKind::CloudPrimary,
			TierAction::Write,
			primary_err.to_string(),
		));

		if !(primary_err.is_schema_mismatch() && creds.has_agent_ids()) {
			result.record(TierOutcome::skipped(
				TierKind::CloudSecondary,
				TierAction::Write,
				"cloud-primary failed outright",
			));
			return false;
		}

		let key_saved = match &creds.api_key {
			Some(key) => match self.tiers.primary.write_api_key_only(scope, key).await {
				Ok(()) => {
					result.record(TierOutcome::success(
						TierKind::CloudPrimary,
						TierAction::PartialWrite,
					));
					true
				}
				Err(e) => {
					warn!(error = %e, "cloud-primary key-only write failed");
					result.record(TierOutcome::failed(
						TierKind::CloudPrimary,
						TierAction::PartialWrite,
						e.to_string(),
					));
					false
				}
			},
			None => {
				result.record(TierOutcome::skipped(
					TierKind::CloudPrimary,
					TierAction::PartialWrite,
					"no api key to write",
				));
				true
			}
		};

		let agents = creds.retain(&[CredentialField::CallAgentId, CredentialField::SmsAgentId]);
		let agents_saved = match self.tiers.secondary.set(scope, &agents).await {
			Ok(()) => {
				debug!("cloud-secondary accepted agent ids");
				result.record(TierOutcome::success(TierKind::CloudSecondary, TierAction::Write));
				true
			}
			Err(e) => {
				warn!(error = %e, "cloud-secondary write failed");
				result.record(TierOutcome::failed(
					TierKind::CloudSecondary,
					TierAction::Write,
					e.to_string(),
				));
				false
			}
		};

		key_saved && agents_saved
	}

	#[tracing::instrument(skip_all, fields(tenant_id = %scope.tenant_id, user_id = ?scope.user_id))]
	pub async fn load(&self, scope: &TenantScope) -> ReconciliationResult {
		let scope = match self.resolve_scope(scope) {
			Ok(scope) => scope,
			Err(reason) => {
				warn!(?reason, "load rejected before any tier read");
				return ReconciliationResult::rejected(Operation::Load, reason);
			}
		};

		let mut result = ReconciliationResult::new(Operation::Load);
		let mut resolved = CredentialSet::default();
		let mut primary_failed = false;

		match self.tiers.primary.fetch(&scope).await {
			Ok(Some(fetch)) => {
				if let Some(e) = &fetch.decryption_error {
					warn!(error = %e, "cloud-primary api key unreadable, treating as absent");
				}
				if fetch.agent_config_empty {
					debug!("cloud-primary agent config is empty");
				}
				if fetch.credentials.is_empty() {
					let reason = match &fetch.decryption_error {
						Some(e) => format!("no usable values: {e}"),
						None => "empty".to_string(),
					};
					result.record(TierOutcome::skipped(TierKind::CloudPrimary, TierAction::Read, reason));
				} else {
					self.absorb(TierKind::CloudPrimary, fetch.credentials, &mut resolved, &mut result);
				}
			}
			Ok(None) => {
				result.record(TierOutcome::skipped(TierKind::CloudPrimary, TierAction::Read, "empty"));
			}
			Err(e) => {
				warn!(error = %e, "cloud-primary read failed, using emergency fallback");
				result.record(TierOutcome::failed(
					TierKind::CloudPrimary,
					TierAction::Read,
					e.to_string(),
				));
				primary_failed = true;
			}
		}

		for tier in self.tiers.lower() {
			let kind = tier.kind();
			if primary_failed && kind == TierKind::CloudSecondary {
				result.record(TierOutcome::skipped(
					kind,
					TierAction::Read,
					"bypassed after cloud-primary failure",
				));
				continue;
			}
			if resolved.is_complete() {
				result.record(TierOutcome::skipped(kind, TierAction::Read, "already resolved"));
				continue;
			}
			match tier.get(&scope).await {
				Ok(Some(found)) => self.absorb(kind, found, &mut resolved, &mut result),
				Ok(None) => {
					debug!(tier = %kind, "tier empty");
					result.record(TierOutcome::skipped(kind, TierAction::Read, "empty"));
				}
				Err(e) => {
					warn!(tier = %kind, error = %e, "tier read failed");
					result.record(TierOutcome::failed(kind, TierAction::Read, e.to_string()));
				}
			}
		}

		if !resolved.is_complete() {
			if let Some(fallback) = &self.fallback {
				let filled = resolved.merge_missing(fallback);
				if !filled.is_empty() {
					info!(fields = ?filled, "using configured default credentials");
					for field in filled {
						result.fields.set(field, CredentialSource::Fallback);
					}
					result.source.get_or_insert(CredentialSource::Fallback);
				}
			}
		}

		if !primary_failed {
			self.backfill(&scope, &resolved, &mut result).await;
		}

		result.credentials = resolved;
		result
	}

	/// Merge a tier's read into the resolved set unless it is synthetic.
	fn absorb(
		&self,
		kind: TierKind,
		found: CredentialSet,
		resolved: &mut CredentialSet,
		result: &mut ReconciliationResult,
	) {
		if self.policy.is_test_data(&found) {
			warn!(tier = %kind, "discarding synthetic test credentials");
			result.record(TierOutcome::skipped(
				kind,
				TierAction::Read,
				"synthetic test data rejected",
			));
			return;
		}

		let filled = resolved.merge_missing(&found);
		debug!(tier = %kind, fields = ?filled, "tier hit");
		if !filled.is_empty() {
			result.source.get_or_insert(CredentialSource::Tier(kind));
		}
		for field in filled {
			result.fields.set(field, CredentialSource::Tier(kind));
		}
		result.record(TierOutcome::success(kind, TierAction::Read));
	}

	/// Write values recovered from lower tiers back to cloud-primary.
	/// Failures are recorded and otherwise ignored.
	async fn backfill(
		&self,
		scope: &ResolvedScope,
		resolved: &CredentialSet,
		result: &mut ReconciliationResult,
	) {
		if result
			.fields
			.fields_from_other_tiers(TierKind::CloudPrimary)
			.is_empty()
		{
			return;
		}

		let mut warm = resolved.retain(&result.fields.fields_from_tiers());
		if result.fields.api_key == Some(CredentialSource::Tier(TierKind::CloudPrimary)) {
			warm.api_key = None;
		}

		match self.tiers.primary.write_full(scope, &warm).await {
			Ok(()) => {
				debug!("backfilled cloud-primary");
				result.record(TierOutcome::success(TierKind::CloudPrimary, TierAction::Backfill));
			}
			Err(e) => {
				debug!(error = %e, "cloud-primary backfill failed");
				result.record(TierOutcome {
					tier: TierKind::CloudPrimary,
					action: TierAction::Backfill,
					status: TierStatus::Failed(e.to_string()),
				});
			}
		}
	}
}
