// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper used for third-party API keys (Retell, Stripe, Resend).
//!
//! [`Secret<T>`] keeps a sensitive value out of logs, config dumps and
//! serialized results:
//!
//! - `Debug` and `Display` print `[REDACTED]`
//! - `Serialize` writes `"[REDACTED]"`; `Deserialize` reads the real value
//! - the inner value is zeroized on drop
//! - reading the value requires an explicit `.expose()`
//!
//! ```
//! use artlee_common_secret::SecretString;
//!
//! let key = SecretString::new("key_3660938283961c067186004a50e3".to_string());
//! assert_eq!(format!("{key}"), "[REDACTED]");
//! assert_eq!(key.masked(), "••••50e3");
//! assert!(key.starts_with("key_"));
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// Number of trailing characters [`SecretString::masked`] reveals.
const MASK_VISIBLE_CHARS: usize = 4;

/// A wrapper for sensitive values that prevents accidental exposure.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Convenience alias for the common case of secret strings.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	///
	/// Every call site that reads a secret goes through here, so secret
	/// access stays greppable.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Returns a copy of the inner value. The original is still zeroized on drop.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl Secret<String> {
	/// True when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.inner.trim().is_empty()
	}

	/// Prefix check without handing the value to the caller.
	pub fn starts_with(&self, prefix: &str) -> bool {
		self.inner.starts_with(prefix)
	}

	/// Display form for settings screens: bullets followed by the last four
	/// characters. Values too short to mask safely are fully hidden.
	pub fn masked(&self) -> String {
		let chars: Vec<char> = self.inner.chars().collect();
		if chars.len() <= MASK_VISIBLE_CHARS * 2 {
			return "••••".to_string();
		}
		let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
		format!("••••{tail}")
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

impl From<String> for Secret<String> {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

// tracing::Value is sealed; structured fields use Display (`%key`) or
// Debug (`?key`), both of which are redacted above.

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::from("key_live_abcdef");
		assert_eq!(format!("{secret}"), REDACTED);
		let debug = format!("{secret:?}");
		assert!(debug.contains(REDACTED));
		assert!(!debug.contains("key_live_abcdef"));
	}

	#[test]
	fn option_secret_debug_is_redacted() {
		let secret = Some(SecretString::from("key_live_abcdef"));
		assert!(!format!("{secret:?}").contains("abcdef"));
	}

	#[test]
	fn masked_shows_last_four() {
		let secret = SecretString::from("key_3660938283961c067186004a50e3");
		assert_eq!(secret.masked(), "••••50e3");
	}

	#[test]
	fn masked_hides_short_values_entirely() {
		assert_eq!(SecretString::from("key_1").masked(), "••••");
		assert_eq!(SecretString::from("").masked(), "••••");
	}

	#[test]
	fn blank_detection() {
		assert!(SecretString::from("   ").is_blank());
		assert!(!SecretString::from("key_x").is_blank());
	}

	#[test]
	fn equality_compares_inner_values() {
		assert_eq!(SecretString::from("a"), SecretString::from("a"));
		assert_ne!(SecretString::from("a"), SecretString::from("b"));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serialize_is_redacted_and_deserialize_is_not() {
		let secret = SecretString::from("key_live_abcdef");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));

		let parsed: SecretString = serde_json::from_str("\"key_live_abcdef\"").unwrap();
		assert_eq!(parsed.expose(), "key_live_abcdef");
	}

	proptest! {
		#[test]
		fn display_never_contains_secret(inner in "[a-zA-Z0-9_]{3,50}") {
			// Skip inputs that are themselves fragments of `Secret("[REDACTED]")`.
			prop_assume!(!"Secret(\"[REDACTED]\")".contains(inner.as_str()));
			let secret = SecretString::new(inner.clone());
			let displayed = format!("{secret}");
			let debugged = format!("{secret:?}");
			prop_assert!(!displayed.contains(&inner));
			prop_assert!(!debugged.contains(&inner));
		}

		#[test]
		fn masked_never_reveals_more_than_four_chars(inner in "[a-z0-9]{9,64}") {
			let secret = SecretString::new(inner.clone());
			let masked = secret.masked();
			let visible: String = masked.chars().filter(|c| *c != '•').collect();
			prop_assert_eq!(visible.len(), 4);
			prop_assert!(inner.ends_with(&visible));
		}
	}
}
