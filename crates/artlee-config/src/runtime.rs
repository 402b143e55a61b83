// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration with resolved defaults.

use std::path::PathBuf;
use std::str::FromStr;

use artlee_common_secret::SecretString;

use crate::layer::*;
use crate::ConfigError;

const DEFAULT_LOG_LEVEL: &str = "info,sqlx=warn";
const DATA_DIR_NAME: &str = "artlee";

/// The final, validated configuration.
#[derive(Debug, Clone)]
pub struct ArtleeConfig {
	/// The tenant every cloud read and write is scoped to.
	pub tenant_id: String,
	pub cloud: CloudConfig,
	pub storage: StorageConfig,
	pub encryption: EncryptionConfig,
	pub fallback: Option<FallbackCredentials>,
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
	pub database_url: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
	/// JSON file backing the durable local tier.
	pub local_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EncryptionConfig {
	/// 32-byte AES key, base64 or hex encoded.
	pub key: SecretString,
}

#[derive(Debug, Clone)]
pub struct FallbackCredentials {
	pub api_key: Option<SecretString>,
	pub call_agent_id: Option<String>,
	pub sms_agent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	#[default]
	Pretty,
	Compact,
	Json,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"compact" => Ok(LogFormat::Compact),
			"json" => Ok(LogFormat::Json),
			other => Err(ConfigError::Invalid {
				field: "logging.format".to_string(),
				reason: format!("unknown format '{other}' (expected pretty, compact or json)"),
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: DEFAULT_LOG_LEVEL.to_string(),
			format: LogFormat::default(),
		}
	}
}

fn data_dir() -> PathBuf {
	dirs::data_local_dir()
		.map(|d| d.join(DATA_DIR_NAME))
		.unwrap_or_else(|| PathBuf::from(".").join(format!(".{DATA_DIR_NAME}")))
}

impl ConfigLayer {
	/// Resolve defaults and validate.
	pub fn finalize(self) -> Result<ArtleeConfig, ConfigError> {
		let tenant_id = self
			.tenant
			.and_then(|t| t.id)
			.map(|id| id.trim().to_string())
			.filter(|id| !id.is_empty())
			.ok_or_else(|| ConfigError::Missing("tenant.id".to_string()))?;

		let encryption_key = self
			.encryption
			.and_then(|e| e.key)
			.filter(|k| !k.is_blank())
			.ok_or_else(|| ConfigError::Missing("encryption.key".to_string()))?;

		let database_url = self
			.cloud
			.and_then(|c| c.database_url)
			.unwrap_or_else(|| format!("sqlite://{}", data_dir().join("artlee.db").display()));

		let local_path = self
			.storage
			.and_then(|s| s.local_path)
			.unwrap_or_else(|| data_dir().join("local-storage.json"));

		let fallback = self.fallback.and_then(|f| {
			if f.api_key.is_none() && f.call_agent_id.is_none() && f.sms_agent_id.is_none() {
				None
			} else {
				Some(FallbackCredentials {
					api_key: f.api_key,
					call_agent_id: f.call_agent_id,
					sms_agent_id: f.sms_agent_id,
				})
			}
		});

		let logging = match self.logging {
			Some(l) => LoggingConfig {
				level: l.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
				format: l.format.as_deref().map(LogFormat::from_str).transpose()?.unwrap_or_default(),
			},
			None => LoggingConfig::default(),
		};

		Ok(ArtleeConfig {
			tenant_id,
			cloud: CloudConfig { database_url },
			storage: StorageConfig { local_path },
			encryption: EncryptionConfig {
				key: encryption_key,
			},
			fallback,
			logging,
		})
	}
}
