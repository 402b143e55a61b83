// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup credential loading for the call and SMS services.
//!
//! [`ServiceInitializer::initialize`] runs one reconciler load per
//! (tenant, user) and hands the result to every registered consumer.
//! Concurrent callers for the same scope share a single in-flight load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::InitError;
use crate::model::{CredentialSet, CredentialSource};
use crate::reconciler::CredentialReconciler;
use crate::result::{ReconciliationResult, TierOutcome};
use crate::tenant::TenantScope;

/// A service that needs the resolved credentials.
pub trait CredentialConsumer: Send + Sync + std::fmt::Debug {
	fn name(&self) -> &str;
	fn apply(&self, credentials: &CredentialSet);
	/// Non-empty key and non-empty call agent id.
	fn is_configured(&self) -> bool;
}

/// Credential holder for the Retell call and SMS services.
#[derive(Debug)]
pub struct ServiceCredentials {
	name: String,
	current: RwLock<CredentialSet>,
	applied: AtomicUsize,
}

impl ServiceCredentials {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			current: RwLock::new(CredentialSet::default()),
			applied: AtomicUsize::new(0),
		}
	}

	pub fn current(&self) -> CredentialSet {
		self.current.read().clone()
	}

	/// How many times credentials were applied.
	pub fn apply_count(&self) -> usize {
		self.applied.load(Ordering::SeqCst)
	}
}

impl CredentialConsumer for ServiceCredentials {
	fn name(&self) -> &str {
		&self.name
	}

	fn apply(&self, credentials: &CredentialSet) {
		*self.current.write() = credentials.clone();
		self.applied.fetch_add(1, Ordering::SeqCst);
	}

	fn is_configured(&self) -> bool {
		self.current.read().is_complete()
	}
}

#[derive(Debug, Clone)]
pub struct InitReport {
	pub scope: TenantScope,
	pub result: ReconciliationResult,
	pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
	pub name: String,
	pub configured: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitStatus {
	pub initialized: bool,
	/// Every consumer is configured.
	pub configured: bool,
	pub source: Option<CredentialSource>,
	pub services: Vec<ServiceStatus>,
	pub tiers: Vec<TierOutcome>,
	pub completed_at: Option<DateTime<Utc>>,
}

type InitCell = Arc<OnceCell<InitReport>>;

#[derive(Debug)]
pub struct ServiceInitializer {
	reconciler: Arc<CredentialReconciler>,
	consumers: Vec<Arc<dyn CredentialConsumer>>,
	cells: Mutex<HashMap<TenantScope, InitCell>>,
	last: RwLock<Option<InitReport>>,
}

impl ServiceInitializer {
	pub fn new(reconciler: Arc<CredentialReconciler>) -> Self {
		Self {
			reconciler,
			consumers: Vec::new(),
			cells: Mutex::new(HashMap::new()),
			last: RwLock::new(None),
		}
	}

	pub fn with_consumer(mut self, consumer: Arc<dyn CredentialConsumer>) -> Self {
		self.consumers.push(consumer);
		self
	}

	fn cell_for(&self, scope: &TenantScope) -> InitCell {
		self.cells.lock().entry(scope.clone()).or_default().clone()
	}

	/// Load once per scope. Later and concurrent calls get the same report.
	/// A rejected load is not memoised.
	pub async fn initialize(&self, scope: &TenantScope) -> Result<InitReport, InitError> {
		let cell = self.cell_for(scope);
		cell
			.get_or_try_init(|| self.run(scope))
			.await
			.cloned()
	}

	/// Drop the memoised load for `scope` and run it again.
	pub async fn force_reinitialize(&self, scope: &TenantScope) -> Result<InitReport, InitError> {
		self.cells.lock().remove(scope);
		info!(tenant_id = %scope.tenant_id, "forcing credential reinitialization");
		self.initialize(scope).await
	}

	pub fn status(&self) -> InitStatus {
		let services: Vec<ServiceStatus> = self
			.consumers
			.iter()
			.map(|c| ServiceStatus {
				name: c.name().to_string(),
				configured: c.is_configured(),
			})
			.collect();
		let last = self.last.read();

		InitStatus {
			initialized: last.is_some(),
			configured: !services.is_empty() && services.iter().all(|s| s.configured),
			source: last.as_ref().and_then(|r| r.result.source),
			tiers: last
				.as_ref()
				.map(|r| r.result.outcomes.clone())
				.unwrap_or_default(),
			completed_at: last.as_ref().map(|r| r.completed_at),
			services,
		}
	}

	async fn run(&self, scope: &TenantScope) -> Result<InitReport, InitError> {
		let result = self.reconciler.load(scope).await;
		if let Some(reason) = result.rejected.clone() {
			warn!(?reason, "credential initialization rejected");
			return Err(InitError::Rejected(reason));
		}

		for consumer in &self.consumers {
			consumer.apply(&result.credentials);
			if !consumer.is_configured() {
				warn!(service = consumer.name(), "service is not configured after initialization");
			}
		}

		let report = InitReport {
			scope: scope.clone(),
			result,
			completed_at: Utc::now(),
		};
		*self.last.write() = Some(report.clone());
		info!(source = ?report.result.source, "credential services initialized");
		Ok(report)
	}
}
