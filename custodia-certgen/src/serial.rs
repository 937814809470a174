//! Random serial numbers for issued certificates
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


use crate::error::CertGenError;
use rand::RngCore;
use x509_cert::serial_number::SerialNumber;

/// Source of certificate serial numbers
pub trait SerialNumberGenerator: Send + Sync {
    fn generate(&self) -> Result<SerialNumber, CertGenError>;
}

const SERIAL_LEN: usize = 16;

/// 128-bit serials drawn from the OS RNG
pub struct RandomSerialNumberGenerator;

impl SerialNumberGenerator for RandomSerialNumberGenerator {
    fn generate(&self) -> Result<SerialNumber, CertGenError> {
        let mut bytes = [0u8; SERIAL_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        // The encoded integer must be positive and nonzero.
        bytes[0] &= 0x7f;
        if bytes.iter().all(|b| *b == 0) {
            bytes[SERIAL_LEN - 1] = 1;
        }

        SerialNumber::new(&bytes)
            .map_err(|e| CertGenError::SigningFailure(format!("serial number: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serials_are_distinct() {
        let generator = RandomSerialNumberGenerator;
        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_serials_are_nonzero_and_bounded() {
        let generator = RandomSerialNumberGenerator;
        for _ in 0..32 {
            let serial = generator.generate().unwrap();
            let bytes = serial.as_bytes();
            assert!(!bytes.is_empty());
            assert!(bytes.len() <= SERIAL_LEN + 1);
            assert!(bytes.iter().any(|b| *b != 0));
        }
    }
}
