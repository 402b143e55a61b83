// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outcome of a reconciler save or load.

use serde::{Deserialize, Serialize};

use crate::model::{CredentialField, CredentialSet, CredentialSource, TierKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
	Save,
	Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierAction {
	Read,
	Write,
	/// Cloud-primary write of the API key alone.
	PartialWrite,
	/// Best-effort cache copy into memory or session.
	Mirror,
	/// Write-back of a value recovered from a lower tier.
	Backfill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum TierStatus {
	Success,
	Skipped(String),
	Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOutcome {
	pub tier: TierKind,
	pub action: TierAction,
	#[serde(flatten)]
	pub status: TierStatus,
}

impl TierOutcome {
	pub fn success(tier: TierKind, action: TierAction) -> Self {
		Self {
			tier,
			action,
			status: TierStatus::Success,
		}
	}

	pub fn skipped(tier: TierKind, action: TierAction, reason: impl Into<String>) -> Self {
		Self {
			tier,
			action,
			status: TierStatus::Skipped(reason.into()),
		}
	}

	pub fn failed(tier: TierKind, action: TierAction, reason: impl Into<String>) -> Self {
		Self {
			tier,
			action,
			status: TierStatus::Failed(reason.into()),
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self.status, TierStatus::Success)
	}

	pub fn is_failed(&self) -> bool {
		matches!(self.status, TierStatus::Failed(_))
	}
}

/// Which source supplied each field of the resolved set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSources {
	pub api_key: Option<CredentialSource>,
	pub call_agent_id: Option<CredentialSource>,
	pub sms_agent_id: Option<CredentialSource>,
}

impl FieldSources {
	pub fn get(&self, field: CredentialField) -> Option<CredentialSource> {
		match field {
			CredentialField::ApiKey => self.api_key,
			CredentialField::CallAgentId => self.call_agent_id,
			CredentialField::SmsAgentId => self.sms_agent_id,
		}
	}

	pub fn set(&mut self, field: CredentialField, source: CredentialSource) {
		let slot = match field {
			CredentialField::ApiKey => &mut self.api_key,
			CredentialField::CallAgentId => &mut self.call_agent_id,
			CredentialField::SmsAgentId => &mut self.sms_agent_id,
		};
		*slot = Some(source);
	}

	/// Fields supplied by a real tier other than `tier`.
	pub fn fields_from_other_tiers(&self, tier: TierKind) -> Vec<CredentialField> {
		[
			CredentialField::ApiKey,
			CredentialField::CallAgentId,
			CredentialField::SmsAgentId,
		]
		.into_iter()
		.filter(|field| {
			matches!(self.get(*field), Some(CredentialSource::Tier(kind)) if kind != tier)
		})
		.collect()
	}

	/// Fields supplied by any real tier (not the configured fallback).
	pub fn fields_from_tiers(&self) -> Vec<CredentialField> {
		[
			CredentialField::ApiKey,
			CredentialField::CallAgentId,
			CredentialField::SmsAgentId,
		]
		.into_iter()
		.filter(|field| matches!(self.get(*field), Some(CredentialSource::Tier(_))))
		.collect()
	}
}

/// Why a call was refused before any tier I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "field", rename_all = "kebab-case")]
pub enum RejectReason {
	TenantScopeMissing,
	TenantMismatch,
	LoggedOut,
	TestData,
	InvalidFormat(CredentialField),
	/// Nothing to save.
	Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
	pub operation: Operation,
	/// Tier that accepted a save, or the first source of a loaded value.
	pub source: Option<CredentialSource>,
	pub credentials: CredentialSet,
	pub fields: FieldSources,
	pub outcomes: Vec<TierOutcome>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rejected: Option<RejectReason>,
}

impl ReconciliationResult {
	pub(crate) fn new(operation: Operation) -> Self {
		Self {
			operation,
			source: None,
			credentials: CredentialSet::default(),
			fields: FieldSources::default(),
			outcomes: Vec::new(),
			rejected: None,
		}
	}

	pub(crate) fn rejected(operation: Operation, reason: RejectReason) -> Self {
		Self {
			rejected: Some(reason),
			..Self::new(operation)
		}
	}

	pub(crate) fn record(&mut self, outcome: TierOutcome) {
		self.outcomes.push(outcome);
	}

	/// A save succeeded when a persistent tier accepted it; a load succeeded
	/// when any source supplied a value.
	pub fn is_success(&self) -> bool {
		if self.rejected.is_some() {
			return false;
		}
		match self.operation {
			Operation::Save => self.outcomes.iter().any(|o| {
				o.tier.is_persistent()
					&& o.is_success()
					&& matches!(o.action, TierAction::Write | TierAction::PartialWrite)
			}),
			Operation::Load => self.source.is_some(),
		}
	}

	/// Every persistent tier that was attempted failed.
	pub fn is_total_failure(&self) -> bool {
		let mut attempted = self
			.outcomes
			.iter()
			.filter(|o| o.tier.is_persistent() && !matches!(o.status, TierStatus::Skipped(_)))
			.peekable();
		attempted.peek().is_some() && attempted.all(TierOutcome::is_failed)
	}

	pub fn outcomes_for(&self, tier: TierKind) -> impl Iterator<Item = &TierOutcome> {
		self.outcomes.iter().filter(move |o| o.tier == tier)
	}

	pub fn outcome(&self, tier: TierKind, action: TierAction) -> Option<&TierOutcome> {
		self.outcomes
			.iter()
			.find(|o| o.tier == tier && o.action == action)
	}

	/// Number of tier writes that were actually attempted.
	pub fn attempted_writes(&self) -> usize {
		self.outcomes
			.iter()
			.filter(|o| o.action != TierAction::Read && !matches!(o.status, TierStatus::Skipped(_)))
			.count()
	}
}
