//! Remote implementation of the encryption provider contract
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


use crate::client::RemoteKmsClient;
use async_trait::async_trait;
use custodia_config::KeyDescriptor;
use custodia_encryption::{
    CryptoResult, EncryptedValue, EncryptionError, EncryptionKey, EncryptionProvider, KeyRegistry,
};

/// Encryption provider backed by the remote encryption service
///
/// Keys are labels the server resolves to its own material; the
/// descriptor `material` field carries the label.
pub struct RemoteEncryptionProvider {
    client: RemoteKmsClient,
    registry: KeyRegistry,
}

impl RemoteEncryptionProvider {
    pub fn new(client: RemoteKmsClient, descriptors: &[KeyDescriptor]) -> CryptoResult<Self> {
        let registry = KeyRegistry::from_descriptors(descriptors, |descriptor| {
            Ok(EncryptionKey::from_label(descriptor.material.clone()))
        })?;
        Ok(Self { client, registry })
    }

    fn label_for<'a>(&self, key: &'a EncryptionKey) -> CryptoResult<&'a str> {
        key.label().ok_or_else(|| {
            EncryptionError::Infrastructure("key does not belong to the remote provider".to_string())
        })
    }
}

#[async_trait]
impl EncryptionProvider for RemoteEncryptionProvider {
    fn keys(&self) -> Vec<EncryptionKey> {
        self.registry.keys().to_vec()
    }

    fn active_key(&self) -> Option<EncryptionKey> {
        Some(self.registry.active_key().clone())
    }

    async fn encrypt(&self, key: &EncryptionKey, plaintext: &str) -> CryptoResult<EncryptedValue> {
        let label = self.label_for(key)?;
        self.client.encrypt(label, plaintext.as_bytes()).await
    }

    async fn decrypt(
        &self,
        key: &EncryptionKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> CryptoResult<String> {
        let label = self.label_for(key)?;
        let plaintext = self.client.decrypt(label, ciphertext, nonce).await?;

        String::from_utf8(plaintext).map_err(|e| {
            EncryptionError::Infrastructure(format!("decrypted value is not UTF-8: {}", e))
        })
    }
}
