//! X.509 certificate generation for Custodia
//!
//! Builds and signs v3 leaf and CA certificates, either self-signed or
//! signed by a stored CA credential. The clock and the serial-number
//! source are injected collaborators so issuance is deterministic under
//! test; the generator itself holds no state and performs no I/O.
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


pub mod clock;
pub mod error;
pub mod generator;
pub mod params;
pub mod serial;

pub use clock::{SystemTimeSource, TimeSource};
pub use error::CertGenError;
pub use generator::SignedCertificateGenerator;
pub use params::{CaCredential, CertificateParameters};
pub use serial::{RandomSerialNumberGenerator, SerialNumberGenerator};
