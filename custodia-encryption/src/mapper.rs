//! Startup reconciliation of configured keys against persisted canaries
//!
//! Every ciphertext this service writes is stored with the id of the
//! canary bound to the key that produced it. As long as the key material
//! behind a configured key is unchanged, its canary still decrypts and the
//! id stays stable across restarts, so old ciphertexts remain readable
//! through rotations. If an operator swaps the bytes behind the active
//! key, no canary decrypts, a fresh one is minted, and ciphertexts bound
//! to the old id fail with a diagnosable unknown-canary error instead of
//! decrypting to garbage.
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


use crate::canary_store::{CanaryStore, NewCanary};
use crate::error::{CryptoResult, EncryptionError};
use crate::key::EncryptionKey;
use crate::provider::EncryptionProvider;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The well-known plaintext every canary protects
pub const CANARY_VALUE: &str = "HEALTH_CHECK";

/// Immutable binding of canary ids to encryption keys
///
/// Built once during startup; afterwards it is a read-only snapshot, so
/// concurrent readers need no coordination.
pub struct CanaryMapper {
    bindings: HashMap<Uuid, EncryptionKey>,
    active_id: Uuid,
}

impl CanaryMapper {
    /// Run startup reconciliation
    ///
    /// Walks the configured keys in order and binds each one to the first
    /// stored canary it decrypts to [`CANARY_VALUE`]. A key that matches
    /// nothing is dropped for this run unless it is the active key, in
    /// which case a fresh canary is minted for it. Wrong-key decrypt
    /// failures are consumed here; any other provider failure aborts
    /// startup.
    pub async fn initialize(
        provider: &dyn EncryptionProvider,
        store: &dyn CanaryStore,
    ) -> CryptoResult<Self> {
        let active = provider.active_key().ok_or(EncryptionError::NoActiveKey)?;
        let keys = provider.keys();
        if keys.is_empty() {
            return Err(EncryptionError::NoActiveKey);
        }

        let canaries = store.find_all().await?;
        let mut consumed = vec![false; canaries.len()];
        let mut bindings = HashMap::new();
        let mut active_id = None;

        for key in &keys {
            let mut matched = None;

            for (index, canary) in canaries.iter().enumerate() {
                if consumed[index] {
                    continue;
                }

                match provider.decrypt(key, &canary.encrypted_value, &canary.nonce).await {
                    Ok(plaintext) if plaintext == CANARY_VALUE => {
                        matched = Some(index);
                        break;
                    }
                    Ok(_) => {
                        // Undocumented provider behavior: a decrypt that
                        // "succeeds" under the wrong key. Treated exactly
                        // like a tag mismatch, but worth a trace.
                        warn!(
                            canary = %canary.id,
                            "Canary decrypted to an unexpected value; treating as wrong key"
                        );
                    }
                    Err(EncryptionError::WrongKey(reason)) => {
                        debug!(canary = %canary.id, reason = %reason, "Canary does not match key");
                    }
                    Err(e) => return Err(e),
                }
            }

            match matched {
                Some(index) => {
                    let canary = &canaries[index];
                    consumed[index] = true;
                    bindings.insert(canary.id, key.clone());
                    if *key == active {
                        active_id = Some(canary.id);
                    }
                }
                None if *key == active => {
                    let sealed = provider.encrypt(key, CANARY_VALUE).await?;
                    let record = store
                        .save(NewCanary {
                            encrypted_value: sealed.ciphertext,
                            nonce: sealed.nonce,
                        })
                        .await?;
                    info!(canary = %record.id, "Minted a fresh canary for the active encryption key");
                    bindings.insert(record.id, key.clone());
                    active_id = Some(record.id);
                }
                None => {
                    debug!("No canary matched a retired encryption key; dropping it for this run");
                }
            }
        }

        // The active key always ends up bound: it either matched a stored
        // canary or had one minted above.
        let active_id = active_id.ok_or(EncryptionError::NoActiveKey)?;

        info!(
            keys = bindings.len(),
            active_canary = %active_id,
            "Encryption key reconciliation complete"
        );

        Ok(Self { bindings, active_id })
    }

    /// The full canary-id-to-key binding
    pub fn encryption_key_map(&self) -> &HashMap<Uuid, EncryptionKey> {
        &self.bindings
    }

    /// The canary id bound to the active key
    pub fn active_uuid(&self) -> Uuid {
        self.active_id
    }

    /// Resolve a canary id back to its key
    pub fn key_for(&self, id: &Uuid) -> CryptoResult<&EncryptionKey> {
        self.bindings
            .get(id)
            .ok_or(EncryptionError::UnknownCanary(*id))
    }
}
