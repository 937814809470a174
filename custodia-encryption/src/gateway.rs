//! High-level encrypt/decrypt facade over a provider and its canary bindings
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


use crate::error::{CryptoResult, EncryptionError};
use crate::mapper::CanaryMapper;
use crate::provider::EncryptionProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The persisted form of an encrypted credential value
///
/// The canary id records which key produced the ciphertext; all three
/// fields are stored together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedValue {
    pub canary_id: Uuid,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Encrypts new values under the active key and resolves stored values
/// back to the key that produced them
pub struct EncryptionGateway {
    provider: Arc<dyn EncryptionProvider>,
    mapper: Arc<CanaryMapper>,
}

impl EncryptionGateway {
    pub fn new(provider: Arc<dyn EncryptionProvider>, mapper: Arc<CanaryMapper>) -> Self {
        Self { provider, mapper }
    }

    /// Encrypt a plaintext under the active key
    pub async fn encrypt(&self, plaintext: &str) -> CryptoResult<SealedValue> {
        let key = self.provider.active_key().ok_or(EncryptionError::NoActiveKey)?;
        let sealed = self.provider.encrypt(&key, plaintext).await?;

        Ok(SealedValue {
            canary_id: self.mapper.active_uuid(),
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
        })
    }

    /// Decrypt a stored value with the key its canary id is bound to
    pub async fn decrypt(&self, sealed: &SealedValue) -> CryptoResult<String> {
        let key = self.mapper.key_for(&sealed.canary_id)?;

        match self.provider.decrypt(key, &sealed.ciphertext, &sealed.nonce).await {
            // A wrong-key failure past reconciliation means the material
            // behind a bound key changed underneath us; report it as an
            // infrastructure fault rather than leaking the classification.
            Err(EncryptionError::WrongKey(reason)) => {
                Err(EncryptionError::Infrastructure(reason))
            }
            other => other,
        }
    }
}
