//! Encryption core for Custodia
//!
//! Maintains the set of configured data-encryption keys, reconciles them
//! against persisted canary records at startup, and dispatches encrypt and
//! decrypt calls to the provider that owns each key.
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


pub mod canary_store;
pub mod classify;
pub mod error;
pub mod file_store;
pub mod gateway;
pub mod internal;
pub mod key;
pub mod mapper;
pub mod provider;
pub mod registry;

pub use canary_store::{CanaryRecord, CanaryStore, NewCanary};
pub use error::{CryptoResult, EncryptionError};
pub use file_store::FileCanaryStore;
pub use gateway::{EncryptionGateway, SealedValue};
pub use internal::InternalEncryptionProvider;
pub use key::EncryptionKey;
pub use mapper::{CanaryMapper, CANARY_VALUE};
pub use provider::{EncryptedValue, EncryptionProvider};
pub use registry::KeyRegistry;
