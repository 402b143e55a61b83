// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retell AI credential persistence for ARTLEE.
//!
//! The Retell API key and the call/SMS agent identifiers are stored
//! redundantly across five tiers:
//!
//! | tier              | backend                      | holds                  |
//! |-------------------|------------------------------|------------------------|
//! | `cloud-primary`   | `profiles` table             | encrypted key + agents |
//! | `cloud-secondary` | `user_settings` table        | agent ids              |
//! | `local`           | JSON file                    | full set               |
//! | `session`         | in-process map               | full set               |
//! | `memory`          | in-process map               | full set               |
//!
//! [`CredentialReconciler`] owns the ordering rules for saving and loading
//! across them, and [`ServiceInitializer`] runs the startup load once per
//! user. [`CredentialRuntime::from_config`] wires both from an
//! [`artlee_config::ArtleeConfig`].
//!
//! ```
//! use artlee_credentials::{is_test_data, CredentialSet};
//!
//! let creds = CredentialSet::default()
//! 	.with_api_key("key_3660938283961c067186004a50e3")
//! 	.with_call_agent_id("agent_ca2a01536c2e94d0ff4e50df70");
//! assert!(creds.is_valid());
//! assert!(!is_test_data(&creds));
//! assert!(is_test_data(&CredentialSet::default().with_api_key("test_key_123")));
//! ```

pub mod bootstrap;
pub mod codec;
pub mod context;
pub mod error;
pub mod initializer;
pub mod model;
pub mod policy;
pub mod reconciler;
pub mod result;
pub mod tenant;
pub mod testing;
pub mod tier;

pub use bootstrap::CredentialRuntime;
pub use codec::{AesGcmCodec, EncryptionCodec};
pub use context::CredentialContext;
pub use error::{BootstrapError, CodecError, InitError, TierError};
pub use initializer::{
	CredentialConsumer, InitReport, InitStatus, ServiceCredentials, ServiceInitializer,
	ServiceStatus,
};
pub use model::{
	CredentialField, CredentialSet, CredentialSource, PersistedCredentialSet, TierKind,
	AGENT_ID_PREFIX, API_KEY_PREFIX,
};
pub use policy::{is_test_data, ReservedPrefixPolicy, TestDataPolicy, RESERVED_TEST_PREFIXES};
pub use reconciler::{CredentialReconciler, ReconcilerTiers};
pub use result::{
	FieldSources, Operation, ReconciliationResult, RejectReason, TierAction, TierOutcome,
	TierStatus,
};
pub use tenant::{ResolvedScope, StaticTenantResolver, TenantResolver, TenantScope};
pub use tier::{
	CloudPrimaryTier, CloudSecondaryTier, CredentialTier, FileStorage, KeyValueStorage,
	MemoryStorage, StorageTier,
};
