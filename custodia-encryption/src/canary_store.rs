//! Persistence contract for canary records
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
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted canary
///
/// The plaintext behind `encrypted_value` is always the fixed canary value;
/// a record identifies which key encrypted everything else carrying its id.
/// The id is assigned by the store on first save and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanaryRecord {
    pub id: Uuid,
    pub encrypted_value: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// A canary that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewCanary {
    pub encrypted_value: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Trait for canary record persistence backends
///
/// `find_all` makes no ordering guarantee. Records are written once and
/// never updated.
#[async_trait]
pub trait CanaryStore: Send + Sync {
    async fn find_all(&self) -> CryptoResult<Vec<CanaryRecord>>;

    /// Persist a new canary, assigning its id
    async fn save(&self, canary: NewCanary) -> CryptoResult<CanaryRecord>;
}
