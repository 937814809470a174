//! Opaque handles to symmetric key material
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


use aes_gcm::Aes256Gcm;
use std::fmt;
use std::sync::Arc;

/// Handle to one configured symmetric key
///
/// The material lives inside whichever provider owns the key: an AEAD
/// cipher object for the in-process provider, a label the remote service
/// resolves for the remote provider. Handles are immutable for their
/// lifetime and compare by identity, so two handles created from the same
/// bytes are still distinct keys.
#[derive(Clone)]
pub struct EncryptionKey(Arc<KeyMaterial>);

enum KeyMaterial {
    Aead(Aes256Gcm),
    Label(String),
}

impl EncryptionKey {
    /// Wrap an in-process AEAD cipher
    pub fn from_aead_cipher(cipher: Aes256Gcm) -> Self {
        Self(Arc::new(KeyMaterial::Aead(cipher)))
    }

    /// Wrap a remote provider key label
    pub fn from_label(label: impl Into<String>) -> Self {
        Self(Arc::new(KeyMaterial::Label(label.into())))
    }

    /// The remote key label, if this handle belongs to a remote provider
    pub fn label(&self) -> Option<&str> {
        match self.0.as_ref() {
            KeyMaterial::Label(label) => Some(label),
            KeyMaterial::Aead(_) => None,
        }
    }

    pub(crate) fn cipher(&self) -> Option<&Aes256Gcm> {
        match self.0.as_ref() {
            KeyMaterial::Aead(cipher) => Some(cipher),
            KeyMaterial::Label(_) => None,
        }
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EncryptionKey {}

// Key material must never leak through logs or error messages.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            KeyMaterial::Aead(_) => f.write_str("EncryptionKey(aead)"),
            KeyMaterial::Label(label) => write!(f, "EncryptionKey(label={})", label),
        }
    }
}
