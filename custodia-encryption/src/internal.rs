//! In-process AES-256-GCM encryption provider
// Copyright 2025 The Custodia Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::classify::{decrypt_failure, ErrorSource};
use crate::error::{CryptoResult, EncryptionError};
use crate::key::EncryptionKey;
use crate::provider::{EncryptedValue, EncryptionProvider};
use crate::registry::KeyRegistry;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use custodia_config::KeyDescriptor;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Encryption provider backed by in-process AES-256-GCM
///
/// Key material is configured as hex-encoded 32-byte strings. Every
/// encryption draws a fresh 96-bit nonce from the OS RNG, so the provider
/// is stateless per call and safe for concurrent use.
pub struct InternalEncryptionProvider {
    registry: KeyRegistry,
}

impl InternalEncryptionProvider {
    pub fn from_descriptors(descriptors: &[KeyDescriptor]) -> CryptoResult<Self> {
        let registry = KeyRegistry::from_descriptors(descriptors, |descriptor| {
            let bytes = hex::decode(&descriptor.material).map_err(|e| {
                EncryptionError::Infrastructure(format!(
                    "encryption key material is not valid hex: {}",
                    e
                ))
            })?;
            let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| {
                EncryptionError::Infrastructure(format!(
                    "encryption key must be {} bytes, got {}",
                    KEY_LEN,
                    bytes.len()
                ))
            })?;
            Ok(EncryptionKey::from_aead_cipher(cipher))
        })?;

        Ok(Self { registry })
    }

    fn cipher_for<'a>(&self, key: &'a EncryptionKey) -> CryptoResult<&'a aes_gcm::Aes256Gcm> {
        key.cipher().ok_or_else(|| {
            EncryptionError::Infrastructure(
                "key does not belong to the internal provider".to_string(),
            )
        })
    }
}

#[async_trait]
impl EncryptionProvider for InternalEncryptionProvider {
    fn keys(&self) -> Vec<EncryptionKey> {
        self.registry.keys().to_vec()
    }

    fn active_key(&self) -> Option<EncryptionKey> {
        Some(self.registry.active_key().clone())
    }

    async fn encrypt(&self, key: &EncryptionKey, plaintext: &str) -> CryptoResult<EncryptedValue> {
        let cipher = self.cipher_for(key)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::Infrastructure(format!("encryption failed: {}", e)))?;

        Ok(EncryptedValue {
            ciphertext,
            nonce: nonce.to_vec(),
        })
    }

    async fn decrypt(
        &self,
        key: &EncryptionKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> CryptoResult<String> {
        let cipher = self.cipher_for(key)?;

        if nonce.len() != NONCE_LEN {
            return Err(EncryptionError::Infrastructure(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            )));
        }

        // Any AEAD failure here is a tag mismatch, which is exactly what a
        // wrong key produces.
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| {
                decrypt_failure(ErrorSource::LocalAead, format!("AEAD decryption failed: {}", e))
            })?;

        String::from_utf8(plaintext).map_err(|e| {
            EncryptionError::Infrastructure(format!("decrypted value is not UTF-8: {}", e))
        })
    }
}
