// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};

use crate::error::BootstrapError;

/// Create a SqlitePool with WAL mode, creating the database file if needed.
///
/// # Errors
/// Returns `BootstrapError::DatabaseUrl` if the URL does not parse, or
/// `BootstrapError::Database` if the connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, BootstrapError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| BootstrapError::DatabaseUrl(e.to_string()))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the `profiles` and `user_settings` tables if they do not exist.
///
/// Both tables are keyed by the composite `(user_id, tenant_id)`, which is
/// also the conflict target of every upsert.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS profiles (
			user_id TEXT NOT NULL,
			tenant_id TEXT NOT NULL,
			encrypted_retell_api_key TEXT,
			retell_agent_config TEXT,
			updated_at TEXT NOT NULL,
			UNIQUE(user_id, tenant_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS user_settings (
			user_id TEXT NOT NULL,
			tenant_id TEXT NOT NULL,
			retell_call_agent_id TEXT,
			retell_sms_agent_id TEXT,
			updated_at TEXT NOT NULL,
			UNIQUE(user_id, tenant_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("credential schema ensured");
	Ok(())
}
