// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for tier I/O, the encryption codec and bootstrap.

/// Errors from the encryption codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
	#[error("invalid encryption key: {0}")]
	InvalidKey(String),

	#[error("encryption failed: {0}")]
	Encryption(String),

	#[error("decryption failed: {0}")]
	Decryption(String),

	#[error("malformed ciphertext: {0}")]
	Malformed(String),
}

/// Errors a single storage tier can report.
///
/// These never escape the reconciler; they become per-tier outcome entries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TierError {
	#[error("tier unavailable: {0}")]
	Unavailable(String),

	/// The query layer does not know a referenced table or column. Refreshing
	/// the database schema cache is an operational fix outside this crate.
	#[error("schema mismatch: {0}")]
	SchemaMismatch(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("serialization error: {0}")]
	Serialization(String),

	#[error("tenant mismatch: scope is {scope}, resolver reports {current}")]
	TenantMismatch { scope: String, current: String },

	#[error(transparent)]
	Codec(#[from] CodecError),
}

impl TierError {
	pub fn is_schema_mismatch(&self) -> bool {
		matches!(self, TierError::SchemaMismatch(_))
	}
}

fn is_schema_message(message: &str) -> bool {
	message.contains("no such column")
		|| message.contains("has no column named")
		|| message.contains("no such table")
}

impl From<sqlx::Error> for TierError {
	fn from(err: sqlx::Error) -> Self {
		match &err {
			sqlx::Error::Database(db_err) => {
				let message = db_err.message();
				if db_err.is_unique_violation() || message.contains("ON CONFLICT clause does not match") {
					TierError::Conflict(message.to_string())
				} else if is_schema_message(message) {
					TierError::SchemaMismatch(message.to_string())
				} else {
					TierError::Unavailable(err.to_string())
				}
			}
			sqlx::Error::ColumnNotFound(column) => {
				TierError::SchemaMismatch(format!("no such column: {column}"))
			}
			_ => TierError::Unavailable(err.to_string()),
		}
	}
}

impl From<serde_json::Error> for TierError {
	fn from(err: serde_json::Error) -> Self {
		TierError::Serialization(err.to_string())
	}
}

impl From<std::io::Error> for TierError {
	fn from(err: std::io::Error) -> Self {
		TierError::Unavailable(err.to_string())
	}
}

/// Errors while wiring the runtime from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("invalid database URL: {0}")]
	DatabaseUrl(String),

	#[error(transparent)]
	Codec(#[from] CodecError),
}

/// Errors from the service initializer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InitError {
	/// The load was refused before any tier was read. Nothing is memoised,
	/// so the next call retries.
	#[error("credential load rejected: {0:?}")]
	Rejected(crate::result::RejectReason),
}
