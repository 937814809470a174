//! Caller-facing certificate parameters
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
use std::str::FromStr;
use x509_cert::der::asn1::Ia5String;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{ExtendedKeyUsage, KeyUsage, SubjectAltName};
use x509_cert::name::Name;

/// A stored CA credential, both halves PEM-encoded
///
/// The private key must be a standalone unencrypted PEM key object
/// (traditional PKCS#1 or PKCS#8); encrypted PEM and PKCS#12 containers
/// are not accepted.
#[derive(Debug, Clone)]
pub struct CaCredential {
    pub certificate: String,
    pub private_key: String,
}

/// What to put in an issued certificate
#[derive(Debug, Clone)]
pub struct CertificateParameters {
    pub subject: Name,
    pub duration_days: u32,
    pub is_ca: bool,
    pub key_usage: Option<KeyUsage>,
    pub extended_key_usage: Option<ExtendedKeyUsage>,
    pub alternative_names: Option<SubjectAltName>,
}

impl CertificateParameters {
    /// Leaf defaults: not a CA, no optional extensions
    pub fn new(subject: &str, duration_days: u32) -> Result<Self, CertGenError> {
        let subject = Name::from_str(subject).map_err(|e| {
            CertGenError::InvalidParameters(format!("subject '{}': {}", subject, e))
        })?;

        Ok(Self {
            subject,
            duration_days,
            is_ca: false,
            key_usage: None,
            extended_key_usage: None,
            alternative_names: None,
        })
    }

    /// Attach dNSName subject alternative names
    pub fn with_dns_names(mut self, names: &[&str]) -> Result<Self, CertGenError> {
        let mut general_names = Vec::with_capacity(names.len());
        for name in names {
            let ia5 = Ia5String::new(name).map_err(|e| {
                CertGenError::InvalidParameters(format!("alternative name '{}': {}", name, e))
            })?;
            general_names.push(GeneralName::DnsName(ia5));
        }
        self.alternative_names = Some(SubjectAltName(general_names));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_x500_subjects() {
        let params = CertificateParameters::new("CN=example.test,O=Custodia", 30).unwrap();
        assert_eq!(params.duration_days, 30);
        assert!(!params.is_ca);
        assert!(params.key_usage.is_none());
    }

    #[test]
    fn test_rejects_malformed_subjects() {
        let result = CertificateParameters::new("not a distinguished name", 30);
        assert!(matches!(result, Err(CertGenError::InvalidParameters(_))));
    }

    #[test]
    fn test_collects_dns_alternative_names() {
        let params = CertificateParameters::new("CN=example.test", 30)
            .unwrap()
            .with_dns_names(&["a.test", "b.test"])
            .unwrap();
        assert_eq!(params.alternative_names.unwrap().0.len(), 2);
    }
}
