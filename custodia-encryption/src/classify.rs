//! Wrong-key classification of decrypt failures
//!
//! Canary reconciliation must tell "this canary was encrypted under a
//! different key" apart from real infrastructure failures. The in-process
//! AEAD makes that trivial (any tag mismatch is wrong-key); remote HSM and
//! DSM backends only expose the distinction through the text of their
//! error messages, so those exact markers are matched here.
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


use crate::error::EncryptionError;

/// PKCS#11-style HSM wrong-key return code, anywhere in the message
pub const HSM_WRONG_KEY_MARKER: &str = "function 'C_Decrypt' returns 0x40";

/// DSM wrong-key return code, at the start of the message
pub const DSM_WRONG_KEY_PREFIX: &str = "Decrypt error: rv=48";

/// Where a decrypt failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// In-process AEAD; failures are authentication-tag mismatches
    LocalAead,
    /// Error string reported by the remote encryption service
    RemoteService,
}

/// Whether a decrypt failure is consistent with presenting the wrong key
pub fn is_wrong_key(source: ErrorSource, message: &str) -> bool {
    match source {
        ErrorSource::LocalAead => true,
        ErrorSource::RemoteService => {
            message.contains(HSM_WRONG_KEY_MARKER) || message.starts_with(DSM_WRONG_KEY_PREFIX)
        }
    }
}

/// Convert a failed decrypt into the error the caller should observe
pub fn decrypt_failure(source: ErrorSource, message: String) -> EncryptionError {
    if is_wrong_key(source, &message) {
        EncryptionError::WrongKey(message)
    } else {
        EncryptionError::Infrastructure(message)
    }
}
