//! Error types for certificate generation
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

/// Certificate generation errors
#[derive(Error, Debug)]
pub enum CertGenError {
    /// The stored CA certificate or private key failed to parse
    #[error("Invalid CA material: {0}")]
    InvalidCaMaterial(String),

    /// The content signer or certificate assembly refused the input
    #[error("Signing failed: {0}")]
    SigningFailure(String),

    /// Caller-supplied parameters could not be encoded
    #[error("Invalid certificate parameters: {0}")]
    InvalidParameters(String),
}
