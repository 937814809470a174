//! Provider contract for encrypt and decrypt dispatch
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


use crate::error::CryptoResult;
use crate::key::EncryptionKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output of one encryption call
///
/// The nonce is generated fresh per call and must be stored next to the
/// ciphertext; both are required to decrypt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedValue {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Trait for encryption backends
///
/// Implementations are safe for concurrent invocation; no call serializes
/// independent callers. Decrypt failures must distinguish wrong-key
/// failures ([`EncryptionError::WrongKey`]) from everything else
/// ([`EncryptionError::Infrastructure`]).
///
/// [`EncryptionError::WrongKey`]: crate::error::EncryptionError::WrongKey
/// [`EncryptionError::Infrastructure`]: crate::error::EncryptionError::Infrastructure
#[async_trait]
pub trait EncryptionProvider: Send + Sync {
    /// All configured keys, in configured order
    fn keys(&self) -> Vec<EncryptionKey>;

    /// The one key used to encrypt newly produced ciphertexts
    fn active_key(&self) -> Option<EncryptionKey>;

    /// Encrypt a UTF-8 plaintext under the given key
    async fn encrypt(&self, key: &EncryptionKey, plaintext: &str) -> CryptoResult<EncryptedValue>;

    /// Decrypt a ciphertext produced under the given key
    async fn decrypt(
        &self,
        key: &EncryptionKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> CryptoResult<String>;
}
