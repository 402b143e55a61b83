// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Browser-style key/value storage and the tier built on it.
//!
//! The memory and session tiers use separate [`MemoryStorage`] instances.
//! The local tier uses [`FileStorage`], a JSON map on disk.
//!
//! ```
//! use artlee_credentials::{CredentialSet, CredentialTier, StorageTier, TenantScope};
//!
//! let tier = StorageTier::memory();
//! let scope = TenantScope::new("artlee", "user-1").resolve().unwrap();
//! tokio_test::block_on(async {
//! 	let creds = CredentialSet::default().with_call_agent_id("agent_1");
//! 	tier.set(&scope, &creds).await.unwrap();
//! 	let stored = tier.get(&scope).await.unwrap().unwrap();
//! 	assert_eq!(stored.call_agent_id.as_deref(), Some("agent_1"));
//! });
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::CredentialTier;
use crate::error::TierError;
use crate::model::{CredentialSet, PersistedCredentialSet, TierKind};
use crate::tenant::ResolvedScope;

/// `getItem` / `setItem` / `removeItem` over string keys and values.
#[async_trait]
pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
	async fn get_item(&self, key: &str) -> Result<Option<String>, TierError>;
	async fn set_item(&self, key: &str, value: &str) -> Result<(), TierError>;
	async fn remove_item(&self, key: &str) -> Result<(), TierError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
	items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
	async fn get_item(&self, key: &str) -> Result<Option<String>, TierError> {
		Ok(self.items.read().await.get(key).cloned())
	}

	async fn set_item(&self, key: &str, value: &str) -> Result<(), TierError> {
		self
			.items
			.write()
			.await
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn remove_item(&self, key: &str) -> Result<(), TierError> {
		self.items.write().await.remove(key);
		Ok(())
	}
}

/// JSON map on disk, restricted to the owner (0600 on Unix).
#[derive(Debug)]
pub struct FileStorage {
	path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			write_lock: Mutex::new(()),
		}
	}

	async fn read_map(&self) -> Result<HashMap<String, String>, TierError> {
		if !fs::try_exists(&self.path).await? {
			return Ok(HashMap::new());
		}
		let contents = fs::read_to_string(&self.path).await?;
		if contents.trim().is_empty() {
			return Ok(HashMap::new());
		}
		Ok(serde_json::from_str(&contents)?)
	}

	async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), TierError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_string_pretty(map)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "failed to set local storage permissions to 0600");
			}
		}

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, "local storage written");
		Ok(())
	}
}

#[async_trait]
impl KeyValueStorage for FileStorage {
	async fn get_item(&self, key: &str) -> Result<Option<String>, TierError> {
		Ok(self.read_map().await?.remove(key))
	}

	async fn set_item(&self, key: &str, value: &str) -> Result<(), TierError> {
		let _guard = self.write_lock.lock().await;
		let mut map = self.read_map().await?;
		map.insert(key.to_string(), value.to_string());
		self.write_map(&map).await
	}

	async fn remove_item(&self, key: &str) -> Result<(), TierError> {
		let _guard = self.write_lock.lock().await;
		let mut map = self.read_map().await?;
		if map.remove(key).is_some() {
			self.write_map(&map).await?;
		}
		Ok(())
	}
}

/// A [`CredentialTier`] over a [`KeyValueStorage`], keyed per user.
///
/// `set` is a read-merge-write against the storage. Clones share one update
/// lock, so concurrent partial saves through the same tier never drop each
/// other's fields.
#[derive(Debug, Clone)]
pub struct StorageTier {
	kind: TierKind,
	storage: Arc<dyn KeyValueStorage>,
	update_lock: Arc<Mutex<()>>,
}

impl StorageTier {
	pub fn new(kind: TierKind, storage: Arc<dyn KeyValueStorage>) -> Self {
		Self {
			kind,
			storage,
			update_lock: Arc::new(Mutex::new(())),
		}
	}

	/// A tier of any kind backed by its own [`MemoryStorage`].
	pub fn in_memory(kind: TierKind) -> Self {
		Self::new(kind, Arc::new(MemoryStorage::new()))
	}

	pub fn memory() -> Self {
		Self::in_memory(TierKind::Memory)
	}

	pub fn session() -> Self {
		Self::in_memory(TierKind::Session)
	}

	pub fn local(path: impl Into<PathBuf>) -> Self {
		Self::new(TierKind::Local, Arc::new(FileStorage::new(path)))
	}

	/// Drop this user's entry.
	pub async fn clear(&self, scope: &ResolvedScope) -> Result<(), TierError> {
		let _guard = self.update_lock.lock().await;
		self.storage.remove_item(&scope.storage_key()).await
	}

	async fn read(&self, key: &str) -> Result<Option<CredentialSet>, TierError> {
		let Some(raw) = self.storage.get_item(key).await? else {
			return Ok(None);
		};
		let persisted: PersistedCredentialSet = serde_json::from_str(&raw)?;
		let creds = CredentialSet::from(persisted);
		Ok((!creds.is_empty()).then_some(creds))
	}
}

#[async_trait]
impl CredentialTier for StorageTier {
	fn kind(&self) -> TierKind {
		self.kind
	}

	async fn get(&self, scope: &ResolvedScope) -> Result<Option<CredentialSet>, TierError> {
		self.read(&scope.storage_key()).await
	}

	async fn set(&self, scope: &ResolvedScope, credentials: &CredentialSet) -> Result<(), TierError> {
		let key = scope.storage_key();
		let _guard = self.update_lock.lock().await;
		let mut merged = credentials.clone();
		if let Some(existing) = self.read(&key).await? {
			merged.merge_missing(&existing);
		}
		let raw = serde_json::to_string(&PersistedCredentialSet::from(&merged))?;
		self.storage.set_item(&key, &raw).await
	}
}
