// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential data model.

use std::fmt;

use artlee_common_secret::SecretString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Required prefix for Retell API keys.
pub const API_KEY_PREFIX: &str = "key_";

/// Required prefix for Retell agent identifiers.
pub const AGENT_ID_PREFIX: &str = "agent_";

/// One of the three persisted credential fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialField {
	ApiKey,
	CallAgentId,
	SmsAgentId,
}

impl fmt::Display for CredentialField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CredentialField::ApiKey => "api-key",
			CredentialField::CallAgentId => "call-agent-id",
			CredentialField::SmsAgentId => "sms-agent-id",
		})
	}
}

/// The Retell API key and the two agent identifiers.
///
/// Empty and whitespace-only values are normalised to `None`, so an absent
/// field always means "no value" and never "clear this value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSet {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key: Option<SecretString>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub call_agent_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sms_agent_id: Option<String>,
}

fn normalize(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

fn normalize_secret(value: Option<SecretString>) -> Option<SecretString> {
	value
		.map(|v| SecretString::new(v.expose().trim().to_string()))
		.filter(|v| !v.is_blank())
}

impl CredentialSet {
	pub fn new(
		api_key: Option<SecretString>,
		call_agent_id: Option<String>,
		sms_agent_id: Option<String>,
	) -> Self {
		Self {
			api_key: normalize_secret(api_key),
			call_agent_id: normalize(call_agent_id),
			sms_agent_id: normalize(sms_agent_id),
		}
	}

	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = normalize_secret(Some(SecretString::new(api_key.into())));
		self
	}

	pub fn with_call_agent_id(mut self, id: impl Into<String>) -> Self {
		self.call_agent_id = normalize(Some(id.into()));
		self
	}

	pub fn with_sms_agent_id(mut self, id: impl Into<String>) -> Self {
		self.sms_agent_id = normalize(Some(id.into()));
		self
	}

	pub fn is_empty(&self) -> bool {
		self.api_key.is_none() && self.call_agent_id.is_none() && self.sms_agent_id.is_none()
	}

	pub fn has_agent_ids(&self) -> bool {
		self.call_agent_id.is_some() || self.sms_agent_id.is_some()
	}

	/// Secret and call agent are both present. This is the point at which a
	/// read stops consulting lower tiers.
	pub fn is_complete(&self) -> bool {
		self.api_key.is_some() && self.call_agent_id.is_some()
	}

	/// Both required fields present and every field correctly prefixed.
	pub fn is_valid(&self) -> bool {
		self.is_complete() && self.validate_present().is_ok()
	}

	/// Every field that is present carries its required prefix.
	pub fn validate_present(&self) -> Result<(), CredentialField> {
		if let Some(key) = &self.api_key {
			if !key.starts_with(API_KEY_PREFIX) {
				return Err(CredentialField::ApiKey);
			}
		}
		if let Some(id) = &self.call_agent_id {
			if !id.starts_with(AGENT_ID_PREFIX) {
				return Err(CredentialField::CallAgentId);
			}
		}
		if let Some(id) = &self.sms_agent_id {
			if !id.starts_with(AGENT_ID_PREFIX) {
				return Err(CredentialField::SmsAgentId);
			}
		}
		Ok(())
	}

	/// Fill absent fields from `other`. Present fields are never replaced.
	/// Returns the fields that were filled.
	pub fn merge_missing(&mut self, other: &CredentialSet) -> Vec<CredentialField> {
		let mut filled = Vec::new();
		if self.api_key.is_none() && other.api_key.is_some() {
			self.api_key = other.api_key.clone();
			filled.push(CredentialField::ApiKey);
		}
		if self.call_agent_id.is_none() && other.call_agent_id.is_some() {
			self.call_agent_id = other.call_agent_id.clone();
			filled.push(CredentialField::CallAgentId);
		}
		if self.sms_agent_id.is_none() && other.sms_agent_id.is_some() {
			self.sms_agent_id = other.sms_agent_id.clone();
			filled.push(CredentialField::SmsAgentId);
		}
		filled
	}

	/// Keep only the listed fields.
	pub fn retain(&self, fields: &[CredentialField]) -> CredentialSet {
		CredentialSet {
			api_key: self
				.api_key
				.clone()
				.filter(|_| fields.contains(&CredentialField::ApiKey)),
			call_agent_id: self
				.call_agent_id
				.clone()
				.filter(|_| fields.contains(&CredentialField::CallAgentId)),
			sms_agent_id: self
				.sms_agent_id
				.clone()
				.filter(|_| fields.contains(&CredentialField::SmsAgentId)),
		}
	}
}

/// Plain-string form written to browser-style storage tiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCredentialSet {
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default)]
	pub call_agent_id: Option<String>,
	#[serde(default)]
	pub sms_agent_id: Option<String>,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
}

impl From<PersistedCredentialSet> for CredentialSet {
	fn from(persisted: PersistedCredentialSet) -> Self {
		CredentialSet::new(
			persisted.api_key.map(SecretString::new),
			persisted.call_agent_id,
			persisted.sms_agent_id,
		)
	}
}

impl From<&CredentialSet> for PersistedCredentialSet {
	fn from(creds: &CredentialSet) -> Self {
		PersistedCredentialSet {
			api_key: creds.api_key.as_ref().map(|k| k.expose().clone()),
			call_agent_id: creds.call_agent_id.clone(),
			sms_agent_id: creds.sms_agent_id.clone(),
			updated_at: Some(Utc::now()),
		}
	}
}

/// A storage tier. Each holds at most one credential set per (tenant, user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierKind {
	Memory,
	Session,
	Local,
	CloudPrimary,
	CloudSecondary,
}

impl TierKind {
	/// Tiers whose acceptance makes a save count as successful.
	pub fn is_persistent(self) -> bool {
		matches!(
			self,
			TierKind::Local | TierKind::CloudPrimary | TierKind::CloudSecondary
		)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			TierKind::Memory => "memory",
			TierKind::Session => "session",
			TierKind::Local => "local",
			TierKind::CloudPrimary => "cloud-primary",
			TierKind::CloudSecondary => "cloud-secondary",
		}
	}
}

impl fmt::Display for TierKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialSource {
	Tier(TierKind),
	/// The hardcoded default set supplied by configuration.
	Fallback,
}

impl fmt::Display for CredentialSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CredentialSource::Tier(kind) => kind.fmt(f),
			CredentialSource::Fallback => f.write_str("fallback"),
		}
	}
}
