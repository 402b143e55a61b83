// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret loading with the `VAR` / `VAR_FILE` convention.
//!
//! `{var}_FILE` wins over `{var}`; a single trailing newline is stripped from
//! file contents, which is how Docker and Kubernetes secret mounts look.

use std::fs;
use std::path::PathBuf;

use artlee_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load a secret from the process environment.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	load_secret_with(var, |name| std::env::var(name).ok())
}

/// Load a secret through an arbitrary variable lookup.
pub fn load_secret_with<F>(var: &str, lookup: F) -> Result<Option<SecretString>, SecretEnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");

	if let Some(path_str) = lookup(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	Ok(lookup(var)
		.filter(|value| !value.is_empty())
		.map(SecretString::new))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn direct_value() {
		let vars = HashMap::from([("ARTLEE_ENCRYPTION_KEY".to_string(), "abc".to_string())]);
		let secret = load_secret_with("ARTLEE_ENCRYPTION_KEY", lookup(&vars)).unwrap();
		assert_eq!(secret.unwrap().expose(), "abc");
	}

	#[test]
	fn file_wins_and_trailing_newline_is_stripped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("key");
		std::fs::write(&path, "from-file\n").unwrap();

		let vars = HashMap::from([
			("ARTLEE_ENCRYPTION_KEY".to_string(), "direct".to_string()),
			(
				"ARTLEE_ENCRYPTION_KEY_FILE".to_string(),
				path.to_string_lossy().to_string(),
			),
		]);
		let secret = load_secret_with("ARTLEE_ENCRYPTION_KEY", lookup(&vars)).unwrap();
		assert_eq!(secret.unwrap().expose(), "from-file");
	}

	#[test]
	fn empty_file_path_is_an_error() {
		let vars = HashMap::from([("ARTLEE_ENCRYPTION_KEY_FILE".to_string(), String::new())]);
		let err = load_secret_with("ARTLEE_ENCRYPTION_KEY", lookup(&vars)).unwrap_err();
		assert!(matches!(err, SecretEnvError::EmptyPath { .. }));
	}

	#[test]
	fn unset_is_none() {
		let vars = HashMap::new();
		assert!(load_secret_with("ARTLEE_ENCRYPTION_KEY", lookup(&vars))
			.unwrap()
			.is_none());
	}
}
