//! Construction and signing of X.509 v3 certificates
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


use crate::clock::TimeSource;
use crate::error::CertGenError;
use crate::params::{CaCredential, CertificateParameters};
use crate::serial::SerialNumberGenerator;
use const_oid::db::rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER;
use const_oid::AssociatedOid;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::sync::Arc;
use std::time::SystemTime;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::der::asn1::{ObjectIdentifier, OctetString};
use x509_cert::der::{self, Decode, DecodePem};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, BasicConstraints, SubjectKeyIdentifier};
use x509_cert::ext::{AsExtension, Extension};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

/// Builds and signs certificates with SHA-256/RSA PKCS#1 v1.5
///
/// Extensions are emitted in a fixed order: subject key identifier,
/// subject alternative names, key usage, extended key usage, authority
/// key identifier, basic constraints. Key usage and basic constraints
/// are critical; everything else is not.
pub struct SignedCertificateGenerator {
    time_source: Arc<dyn TimeSource>,
    serial_generator: Arc<dyn SerialNumberGenerator>,
}

struct IssuerInfo<'a> {
    dn: Name,
    key: &'a RsaPrivateKey,
    /// Subject key identifier of the issuer, when known
    ski: Option<Vec<u8>>,
    /// Serial of the issuer certificate; `None` for self-signed, where
    /// the new certificate's own serial stands in
    serial: Option<SerialNumber>,
}

impl SignedCertificateGenerator {
    pub fn new(
        time_source: Arc<dyn TimeSource>,
        serial_generator: Arc<dyn SerialNumberGenerator>,
    ) -> Self {
        Self {
            time_source,
            serial_generator,
        }
    }

    /// Issue a certificate signed with its own subject key
    pub fn self_signed(
        &self,
        key: &RsaPrivateKey,
        params: &CertificateParameters,
    ) -> Result<Certificate, CertGenError> {
        let spki = subject_public_key_info(&RsaPublicKey::from(key))?;
        let issuer = IssuerInfo {
            dn: params.subject.clone(),
            key,
            ski: Some(ski_digest(&spki)),
            serial: None,
        };
        self.issue(issuer, key, params)
    }

    /// Issue a certificate signed by a stored CA credential
    pub fn signed_by(
        &self,
        ca: &CaCredential,
        key: &RsaPrivateKey,
        params: &CertificateParameters,
    ) -> Result<Certificate, CertGenError> {
        let ca_certificate = Certificate::from_pem(ca.certificate.as_bytes())
            .map_err(|e| CertGenError::InvalidCaMaterial(format!("CA certificate: {}", e)))?;
        let ca_key = parse_ca_private_key(&ca.private_key)?;

        let issuer = IssuerInfo {
            dn: ca_certificate.tbs_certificate.subject.clone(),
            key: &ca_key,
            ski: ski_from_certificate(&ca_certificate)?,
            serial: Some(ca_certificate.tbs_certificate.serial_number.clone()),
        };
        self.issue(issuer, key, params)
    }

    fn issue(
        &self,
        issuer: IssuerInfo<'_>,
        subject_key: &RsaPrivateKey,
        params: &CertificateParameters,
    ) -> Result<Certificate, CertGenError> {
        let serial = self.serial_generator.generate()?;
        let issuer_serial = issuer.serial.clone().unwrap_or_else(|| serial.clone());

        let not_before = self.time_source.now();
        let not_after = not_before + chrono::Duration::days(i64::from(params.duration_days));
        let validity = Validity {
            not_before: asn1_time(not_before)?,
            not_after: asn1_time(not_after)?,
        };

        let spki = subject_public_key_info(&RsaPublicKey::from(subject_key))?;
        let subject_ski = SubjectKeyIdentifier(octet_string(ski_digest(&spki))?);

        let signer = SigningKey::<Sha256>::new(issuer.key.clone());
        let mut builder = CertificateBuilder::new(
            Profile::Manual {
                issuer: Some(issuer.dn.clone()),
            },
            serial,
            validity,
            params.subject.clone(),
            spki,
            &signer,
        )
        .map_err(|e| CertGenError::SigningFailure(e.to_string()))?;

        add_extension(&mut builder, subject_ski, false)?;
        if let Some(alternative_names) = &params.alternative_names {
            add_extension(&mut builder, alternative_names.clone(), false)?;
        }
        if let Some(key_usage) = &params.key_usage {
            add_extension(&mut builder, key_usage.clone(), true)?;
        }
        if let Some(extended_key_usage) = &params.extended_key_usage {
            add_extension(&mut builder, extended_key_usage.clone(), false)?;
        }
        if let Some(issuer_ski) = issuer.ski {
            let authority_key_identifier = AuthorityKeyIdentifier {
                key_identifier: Some(octet_string(issuer_ski)?),
                authority_cert_issuer: Some(vec![GeneralName::DirectoryName(issuer.dn)]),
                authority_cert_serial_number: Some(issuer_serial),
            };
            add_extension(&mut builder, authority_key_identifier, false)?;
        }
        add_extension(
            &mut builder,
            BasicConstraints {
                ca: params.is_ca,
                path_len_constraint: None,
            },
            true,
        )?;

        builder
            .build::<rsa::pkcs1v15::Signature>()
            .map_err(|e| CertGenError::SigningFailure(e.to_string()))
    }
}

/// Fixes an explicit criticality on an extension payload instead of the
/// payload type's default
struct WithCriticality<T> {
    value: T,
    critical: bool,
}

impl<T: AsExtension> AssociatedOid for WithCriticality<T> {
    const OID: ObjectIdentifier = T::OID;
}

impl<T: AsExtension> der::Encode for WithCriticality<T> {
    fn encoded_len(&self) -> der::Result<der::Length> {
        self.value.encoded_len()
    }

    fn encode(&self, encoder: &mut impl der::Writer) -> der::Result<()> {
        self.value.encode(encoder)
    }
}

impl<T: AsExtension> AsExtension for WithCriticality<T> {
    fn critical(&self, _subject: &Name, _extensions: &[Extension]) -> bool {
        self.critical
    }
}

fn add_extension<T: AsExtension>(
    builder: &mut CertificateBuilder<'_, SigningKey<Sha256>>,
    value: T,
    critical: bool,
) -> Result<(), CertGenError> {
    builder
        .add_extension(&WithCriticality { value, critical })
        .map_err(|e| CertGenError::SigningFailure(e.to_string()))
}

fn asn1_time(at: chrono::DateTime<chrono::Utc>) -> Result<Time, CertGenError> {
    Time::try_from(SystemTime::from(at))
        .map_err(|e| CertGenError::InvalidParameters(format!("validity instant: {}", e)))
}

fn octet_string(bytes: Vec<u8>) -> Result<OctetString, CertGenError> {
    OctetString::new(bytes).map_err(|e| CertGenError::SigningFailure(e.to_string()))
}

fn subject_public_key_info(
    public_key: &RsaPublicKey,
) -> Result<SubjectPublicKeyInfoOwned, CertGenError> {
    let encoded = public_key
        .to_public_key_der()
        .map_err(|e| CertGenError::SigningFailure(format!("subject public key: {}", e)))?;
    SubjectPublicKeyInfoOwned::from_der(encoded.as_bytes())
        .map_err(|e| CertGenError::SigningFailure(format!("subject public key: {}", e)))
}

/// RFC 5280 method 1: SHA-1 over the subject public key bits
fn ski_digest(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

fn ski_from_certificate(certificate: &Certificate) -> Result<Option<Vec<u8>>, CertGenError> {
    let Some(extensions) = certificate.tbs_certificate.extensions.as_ref() else {
        return Ok(None);
    };

    for extension in extensions {
        if extension.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER {
            let ski = SubjectKeyIdentifier::from_der(extension.extn_value.as_bytes()).map_err(
                |e| CertGenError::InvalidCaMaterial(format!("CA subject key identifier: {}", e)),
            )?;
            return Ok(Some(ski.0.as_bytes().to_vec()));
        }
    }
    Ok(None)
}

fn parse_ca_private_key(pem: &str) -> Result<RsaPrivateKey, CertGenError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
        return Ok(key);
    }
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|e| CertGenError::InvalidCaMaterial(format!("CA private key: {}", e)))
}
