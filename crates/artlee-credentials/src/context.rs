// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};

/// Application-owned session state shared with the reconciler.
///
/// The logged-out flag is read at the start of every save so a write racing
/// a logout never reaches a tier.
#[derive(Debug, Default)]
pub struct CredentialContext {
	logged_out: AtomicBool,
}

impl CredentialContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mark_logged_out(&self) {
		self.logged_out.store(true, Ordering::SeqCst);
	}

	pub fn mark_logged_in(&self) {
		self.logged_out.store(false, Ordering::SeqCst);
	}

	pub fn is_logged_out(&self) -> bool {
		self.logged_out.load(Ordering::SeqCst)
	}
}
