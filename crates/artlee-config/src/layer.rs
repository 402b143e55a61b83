// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer - every field is optional so sources can merge.

use std::path::PathBuf;

use artlee_common_secret::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub tenant: Option<TenantLayer>,
	#[serde(default)]
	pub cloud: Option<CloudLayer>,
	#[serde(default)]
	pub storage: Option<StorageLayer>,
	#[serde(default)]
	pub encryption: Option<EncryptionLayer>,
	#[serde(default)]
	pub fallback: Option<FallbackLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantLayer {
	#[serde(default)]
	pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudLayer {
	#[serde(default)]
	pub database_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageLayer {
	#[serde(default)]
	pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncryptionLayer {
	#[serde(default)]
	pub key: Option<SecretString>,
}

/// The hardcoded default credential set used at first run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackLayer {
	#[serde(default)]
	pub api_key: Option<SecretString>,
	#[serde(default)]
	pub call_agent_id: Option<String>,
	#[serde(default)]
	pub sms_agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merge another layer into this one. `other` takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.tenant, other.tenant, |t, s| {
			overwrite(&mut t.id, s.id);
		});
		merge_option(&mut self.cloud, other.cloud, |t, s| {
			overwrite(&mut t.database_url, s.database_url);
		});
		merge_option(&mut self.storage, other.storage, |t, s| {
			overwrite(&mut t.local_path, s.local_path);
		});
		merge_option(&mut self.encryption, other.encryption, |t, s| {
			overwrite(&mut t.key, s.key);
		});
		merge_option(&mut self.fallback, other.fallback, |t, s| {
			overwrite(&mut t.api_key, s.api_key);
			overwrite(&mut t.call_agent_id, s.call_agent_id);
			overwrite(&mut t.sms_agent_id, s.sms_agent_id);
		});
		merge_option(&mut self.logging, other.logging, |t, s| {
			overwrite(&mut t.level, s.level);
			overwrite(&mut t.format, s.format);
		});
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
	if source.is_some() {
		*target = source;
	}
}
