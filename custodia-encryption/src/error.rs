//! Error types for the encryption core
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


use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the encryption core
#[derive(Error, Debug)]
pub enum EncryptionError {
    /// Zero or more than one configured key is marked active, or the
    /// provider yielded no keys at all.
    #[error("No active encryption key was found")]
    NoActiveKey,

    /// Any provider failure that is not a wrong-key decryption failure:
    /// connectivity, malformed input, unknown server-reported errors.
    #[error("Encryption infrastructure error: {0}")]
    Infrastructure(String),

    /// A decryption failure indistinguishable from presenting the wrong
    /// key. Consumed by canary reconciliation; never surfaced to callers.
    #[error("Decryption failed with the presented key: {0}")]
    WrongKey(String),

    /// A ciphertext referenced a canary id with no bound key, meaning the
    /// key that produced it has been retired or removed.
    #[error("No encryption key is mapped to canary {0}")]
    UnknownCanary(Uuid),

    #[error("Canary store error: {0}")]
    Store(String),
}

/// Result type for encryption operations
pub type CryptoResult<T> = std::result::Result<T, EncryptionError>;
