// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the ARTLEE credential services.
//!
//! Configuration is assembled from layered sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user file (`~/.config/artlee/config.toml`)
//! 3. an explicit file passed by the embedding application
//! 4. `ARTLEE_*` environment variables (secrets also via `*_FILE`)
//!
//! Every layer is a partial [`ConfigLayer`]; [`load_config`] merges them and
//! [`ConfigLayer::finalize`] resolves defaults and validates the result into
//! an [`ArtleeConfig`].

pub mod env;
mod error;
mod layer;
mod logging;
mod runtime;
mod sources;

pub use artlee_common_secret::{Secret, SecretString, REDACTED};
pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::{
	CloudLayer, ConfigLayer, EncryptionLayer, FallbackLayer, LoggingLayer, StorageLayer, TenantLayer,
};
pub use logging::init_logging;
pub use runtime::{
	ArtleeConfig, CloudConfig, EncryptionConfig, FallbackCredentials, LogFormat, LoggingConfig,
	StorageConfig,
};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, FileSource, Precedence};

use tracing::debug;

/// Merge all sources by precedence and finalize.
pub fn load_config(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ArtleeConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ConfigLayer::default();
	for source in &sources {
		debug!(source = source.name(), "merging config layer");
		merged.merge(source.load()?);
	}

	merged.finalize()
}

/// The standard source stack: defaults, user file, optional explicit file,
/// process environment.
pub fn load_default_config(
	explicit_file: Option<std::path::PathBuf>,
) -> Result<ArtleeConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource)];
	if let Some(user) = FileSource::user() {
		sources.push(Box::new(user));
	}
	if let Some(path) = explicit_file {
		sources.push(Box::new(FileSource::explicit(path)));
	}
	sources.push(Box::new(EnvSource::from_process()));
	load_config(sources)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn environment_overrides_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			r#"
[tenant]
id = "from-file"

[encryption]
key = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY="

[logging]
level = "debug"
"#,
		)
		.unwrap();

		let env = HashMap::from([("ARTLEE_TENANT_ID".to_string(), "from-env".to_string())]);
		let config = load_config(vec![
			Box::new(EnvSource::from_vars(env)),
			Box::new(FileSource::explicit(path)),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.tenant_id, "from-env");
		assert_eq!(config.logging.level, "debug");
	}

	#[test]
	fn default_stack_reads_the_explicit_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("artlee.toml");
		std::fs::write(
			&path,
			r#"
[tenant]
id = "from-explicit"

[encryption]
key = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY="
"#,
		)
		.unwrap();

		let config = load_default_config(Some(path)).unwrap();
		let expected = std::env::var("ARTLEE_TENANT_ID").unwrap_or_else(|_| "from-explicit".to_string());
		assert_eq!(config.tenant_id, expected);
	}

	#[test]
	fn missing_tenant_is_rejected() {
		let env = HashMap::from([(
			"ARTLEE_ENCRYPTION_KEY".to_string(),
			"MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=".to_string(),
		)]);
		let err = load_config(vec![Box::new(EnvSource::from_vars(env))]).unwrap_err();
		assert!(matches!(err, ConfigError::Missing(field) if field == "tenant.id"));
	}
}
