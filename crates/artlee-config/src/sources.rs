// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::load_secret_with;
use crate::layer::*;
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	UserFile = 30,
	ExplicitFile = 40,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	fn precedence(&self) -> Precedence;

	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults. Defaults themselves are applied in `finalize`.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		Ok(ConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
}

impl FileSource {
	/// `~/.config/artlee/config.toml`, if a config directory can be determined.
	pub fn user() -> Option<Self> {
		dirs::config_dir().map(|dir| Self {
			path: dir.join("artlee").join("config.toml"),
			precedence: Precedence::UserFile,
			name: "user-config",
		})
	}

	pub fn explicit(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			precedence: Precedence::ExplicitFile,
			name: "explicit-config",
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");
		let content = std::fs::read_to_string(&self.path)?;
		toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})
	}
}

/// `ARTLEE_*` environment variables.
pub struct EnvSource {
	vars: HashMap<String, String>,
}

impl EnvSource {
	pub fn from_process() -> Self {
		Self {
			vars: std::env::vars().filter(|(k, _)| k.starts_with("ARTLEE_")).collect(),
		}
	}

	pub fn from_vars(vars: HashMap<String, String>) -> Self {
		Self { vars }
	}

	fn get(&self, name: &str) -> Option<String> {
		self.vars
			.get(name)
			.map(|v| v.trim().to_string())
			.filter(|v| !v.is_empty())
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let mut layer = ConfigLayer::default();
		let lookup = |name: &str| self.vars.get(name).cloned();

		if let Some(key) = load_secret_with("ARTLEE_ENCRYPTION_KEY", lookup)? {
			trace!("loaded encryption key from environment");
			layer
				.encryption
				.get_or_insert_with(EncryptionLayer::default)
				.key = Some(key);
		}

		if let Some(api_key) = load_secret_with("ARTLEE_RETELL_API_KEY", lookup)? {
			trace!("loaded fallback Retell API key from environment");
			layer
				.fallback
				.get_or_insert_with(FallbackLayer::default)
				.api_key = Some(api_key);
		}

		if let Some(id) = self.get("ARTLEE_TENANT_ID") {
			layer.tenant.get_or_insert_with(TenantLayer::default).id = Some(id);
		}
		if let Some(url) = self.get("ARTLEE_DATABASE_URL") {
			layer
				.cloud
				.get_or_insert_with(CloudLayer::default)
				.database_url = Some(url);
		}
		if let Some(path) = self.get("ARTLEE_LOCAL_STORAGE_PATH") {
			layer
				.storage
				.get_or_insert_with(StorageLayer::default)
				.local_path = Some(PathBuf::from(path));
		}
		if let Some(agent) = self.get("ARTLEE_RETELL_CALL_AGENT_ID") {
			layer
				.fallback
				.get_or_insert_with(FallbackLayer::default)
				.call_agent_id = Some(agent);
		}
		if let Some(agent) = self.get("ARTLEE_RETELL_SMS_AGENT_ID") {
			layer
				.fallback
				.get_or_insert_with(FallbackLayer::default)
				.sms_agent_id = Some(agent);
		}
		if let Some(level) = self.get("ARTLEE_LOG_LEVEL") {
			layer.logging.get_or_insert_with(LoggingLayer::default).level = Some(level);
		}
		if let Some(format) = self.get("ARTLEE_LOG_FORMAT") {
			layer.logging.get_or_insert_with(LoggingLayer::default).format = Some(format);
		}

		Ok(layer)
	}
}
