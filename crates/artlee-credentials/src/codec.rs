// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encryption applied to the API key before it reaches a cloud table.
//!
//! Ciphertext is AES-256-GCM with a fresh 96-bit nonce per call, stored as
//! `v1:<base64(nonce || ciphertext)>`.

use std::fmt::Debug;

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use artlee_common_secret::SecretString;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CodecError;

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

const WIRE_PREFIX: &str = "v1:";

pub trait EncryptionCodec: Send + Sync + Debug {
	fn encrypt(&self, plaintext: &SecretString) -> Result<String, CodecError>;
	fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CodecError>;
}

pub struct AesGcmCodec {
	key: Zeroizing<[u8; KEY_SIZE]>,
}

impl Debug for AesGcmCodec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AesGcmCodec").finish_non_exhaustive()
	}
}

impl AesGcmCodec {
	pub fn new(key: [u8; KEY_SIZE]) -> Self {
		Self {
			key: Zeroizing::new(key),
		}
	}

	/// Parse a key given as base64 or hex.
	pub fn from_encoded_key(encoded: &str) -> Result<Self, CodecError> {
		let encoded = encoded.trim();
		let bytes: Zeroizing<Vec<u8>> = if encoded.len() == KEY_SIZE * 2
			&& encoded.chars().all(|c| c.is_ascii_hexdigit())
		{
			Zeroizing::new(
				hex::decode(encoded).map_err(|e| CodecError::InvalidKey(format!("bad hex: {e}")))?,
			)
		} else {
			Zeroizing::new(
				STANDARD
					.decode(encoded)
					.map_err(|e| CodecError::InvalidKey(format!("bad base64: {e}")))?,
			)
		};

		if bytes.len() != KEY_SIZE {
			return Err(CodecError::InvalidKey(format!(
				"expected {KEY_SIZE} bytes, got {}",
				bytes.len()
			)));
		}
		let mut key = [0u8; KEY_SIZE];
		key.copy_from_slice(&bytes);
		Ok(Self::new(key))
	}

	/// Random key, hex encoded, for first-run setup and tests.
	pub fn generate_key() -> String {
		let mut key = Zeroizing::new([0u8; KEY_SIZE]);
		OsRng.fill_bytes(key.as_mut());
		hex::encode(&*key)
	}

	fn cipher(&self) -> Aes256Gcm {
		Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
	}
}

impl EncryptionCodec for AesGcmCodec {
	fn encrypt(&self, plaintext: &SecretString) -> Result<String, CodecError> {
		let mut nonce_bytes = [0u8; NONCE_SIZE];
		OsRng.fill_bytes(&mut nonce_bytes);
		let nonce = Nonce::from_slice(&nonce_bytes);

		let ciphertext = self
			.cipher()
			.encrypt(nonce, plaintext.expose().as_bytes())
			.map_err(|e| CodecError::Encryption(format!("api key encryption failed: {e}")))?;

		let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
		payload.extend_from_slice(&nonce_bytes);
		payload.extend_from_slice(&ciphertext);
		Ok(format!("{WIRE_PREFIX}{}", STANDARD.encode(payload)))
	}

	fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CodecError> {
		let encoded = ciphertext
			.strip_prefix(WIRE_PREFIX)
			.ok_or_else(|| CodecError::Malformed("missing version prefix".to_string()))?;
		let payload = STANDARD
			.decode(encoded)
			.map_err(|e| CodecError::Malformed(format!("bad base64: {e}")))?;
		if payload.len() <= NONCE_SIZE {
			return Err(CodecError::Malformed("payload too short".to_string()));
		}

		let (nonce_bytes, sealed) = payload.split_at(NONCE_SIZE);
		let plaintext = Zeroizing::new(
			self.cipher()
				.decrypt(Nonce::from_slice(nonce_bytes), sealed)
				.map_err(|e| CodecError::Decryption(format!("api key decryption failed: {e}")))?,
		);

		let text = std::str::from_utf8(&plaintext)
			.map_err(|e| CodecError::Decryption(format!("plaintext is not utf-8: {e}")))?;
		Ok(SecretString::new(text.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn codec() -> AesGcmCodec {
		AesGcmCodec::new([7u8; KEY_SIZE])
	}

	#[test]
	fn ciphertext_is_versioned_and_hides_plaintext() {
		let sealed = codec().encrypt(&SecretString::from("key_abc")).unwrap();
		assert!(sealed.starts_with("v1:"));
		assert!(!sealed.contains("key_abc"));
	}

	#[test]
	fn nonces_differ_between_calls() {
		let c = codec();
		let a = c.encrypt(&SecretString::from("key_abc")).unwrap();
		let b = c.encrypt(&SecretString::from("key_abc")).unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn wrong_key_fails_to_decrypt() {
		let sealed = codec().encrypt(&SecretString::from("key_abc")).unwrap();
		let other = AesGcmCodec::new([9u8; KEY_SIZE]);
		assert!(matches!(other.decrypt(&sealed), Err(CodecError::Decryption(_))));
	}

	#[test]
	fn malformed_inputs_are_rejected() {
		let c = codec();
		assert!(matches!(c.decrypt("key_plain"), Err(CodecError::Malformed(_))));
		assert!(matches!(c.decrypt("v1:!!!"), Err(CodecError::Malformed(_))));
		assert!(matches!(c.decrypt("v1:AAAA"), Err(CodecError::Malformed(_))));
	}

	#[test]
	fn tampered_ciphertext_fails_authentication() {
		let c = codec();
		let sealed = c.encrypt(&SecretString::from("key_abc")).unwrap();
		let mut payload = STANDARD.decode(&sealed[3..]).unwrap();
		let last = payload.len() - 1;
		payload[last] ^= 0x01;
		let tampered = format!("v1:{}", STANDARD.encode(payload));
		assert!(matches!(c.decrypt(&tampered), Err(CodecError::Decryption(_))));
	}

	#[test]
	fn keys_parse_from_hex_and_base64() {
		let hex_key = AesGcmCodec::generate_key();
		assert_eq!(hex_key.len(), KEY_SIZE * 2);
		assert!(AesGcmCodec::from_encoded_key(&hex_key).is_ok());
		assert!(AesGcmCodec::from_encoded_key("MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=").is_ok());
	}

	#[test]
	fn short_keys_are_rejected() {
		let err = AesGcmCodec::from_encoded_key("c2hvcnQ=").unwrap_err();
		assert!(matches!(err, CodecError::InvalidKey(_)));
	}

	#[test]
	fn debug_does_not_leak_key_material() {
		assert_eq!(format!("{:?}", codec()), "AesGcmCodec { .. }");
	}

	proptest! {
		#[test]
		fn decrypt_inverts_encrypt(value in "key_[a-zA-Z0-9]{0,64}") {
			let c = codec();
			let sealed = c.encrypt(&SecretString::new(value.clone())).unwrap();
			let opened = c.decrypt(&sealed).unwrap();
			prop_assert_eq!(opened.expose(), &value);
		}
	}
}
