// ABOUTME: AES-256-GCM record encryption with nonce-prepended ciphertext
// ABOUTME: Key is derived once from the configured session secret and kept in memory only
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the AES-GCM nonce prepended to every ciphertext
const NONCE_LEN: usize = 12;

/// Symmetric cipher applied to every record before persistence.
///
/// The key is derived from the configured session secret at construction
/// and lives only in process memory. Each sealed record is
/// `[12-byte nonce][ciphertext+tag]`; losing the secret makes all prior
/// records permanently unrecoverable.
pub struct RecordCipher {
    key: [u8; 32],
}

impl RecordCipher {
    /// Derive the encryption key from a session secret
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt a plaintext record
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AppError::internal(format!("encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a sealed record
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::Decryption` if the ciphertext is truncated or was
    /// sealed with a different secret. Callers must keep this distinguishable
    /// from "record absent".
    pub fn open(&self, sealed: &[u8]) -> AppResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(AppError::decryption("sealed record too short"));
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let nonce = GenericArray::from_slice(&sealed[..NONCE_LEN]);

        cipher
            .decrypt(nonce, &sealed[NONCE_LEN..])
            .map_err(|_| AppError::decryption("record not decryptable with current secret"))
    }
}
