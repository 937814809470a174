//! Client for the remote Custodia encryption service
//!
//! Speaks length-prefixed protobuf over mutually authenticated TLS.
//! Each call is an independent, idempotent round-trip with a bounded
//! deadline; connections are pooled and never shared between in-flight
//! calls.
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


pub mod client;
pub mod connector;
pub mod framing;
pub mod proto;
pub mod provider;

pub use client::RemoteKmsClient;
pub use connector::{KmsConnector, KmsStream, TlsKmsConnector};
pub use provider::RemoteEncryptionProvider;
