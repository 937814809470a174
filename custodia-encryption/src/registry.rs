//! Ordered registry of configured encryption keys
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
use crate::key::EncryptionKey;
use custodia_config::KeyDescriptor;

/// The configured key set, with exactly one key marked active
///
/// Configured order is preserved; retired keys stay ahead of or behind the
/// active key exactly as the operator listed them, which decides tie-breaks
/// during canary reconciliation.
pub struct KeyRegistry {
    keys: Vec<EncryptionKey>,
    active: usize,
}

impl KeyRegistry {
    /// Materialize descriptors into key handles via a provider-supplied loader
    ///
    /// Fails with [`EncryptionError::NoActiveKey`] unless exactly one
    /// descriptor is marked active.
    pub fn from_descriptors<F>(descriptors: &[KeyDescriptor], mut load: F) -> CryptoResult<Self>
    where
        F: FnMut(&KeyDescriptor) -> CryptoResult<EncryptionKey>,
    {
        let mut keys = Vec::with_capacity(descriptors.len());
        let mut active = None;

        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.active && active.replace(index).is_some() {
                return Err(EncryptionError::NoActiveKey);
            }
            keys.push(load(descriptor)?);
        }

        let active = active.ok_or(EncryptionError::NoActiveKey)?;
        Ok(Self { keys, active })
    }

    /// All keys, in configured order
    pub fn keys(&self) -> &[EncryptionKey] {
        &self.keys
    }

    /// The key marked active in configuration
    pub fn active_key(&self) -> &EncryptionKey {
        &self.keys[self.active]
    }
}
