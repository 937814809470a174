//! Transport dialing for the encryption RPC
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


use async_trait::async_trait;
use custodia_config::RemoteKmsConfig;
use custodia_encryption::{CryptoResult, EncryptionError};
use std::io::BufReader;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Byte stream capable of carrying the encryption RPC
pub trait KmsStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> KmsStream for T {}

/// Trait for dialing the encryption service
#[async_trait]
pub trait KmsConnector: Send + Sync {
    async fn connect(&self) -> CryptoResult<Box<dyn KmsStream>>;
}

/// Production connector: TCP wrapped in mutually authenticated TLS
pub struct TlsKmsConnector {
    endpoint: String,
    server_name: rustls::ServerName,
    tls: tokio_rustls::TlsConnector,
}

impl TlsKmsConnector {
    pub fn from_config(config: &RemoteKmsConfig) -> CryptoResult<Self> {
        let mut roots = rustls::RootCertStore::empty();
        for cert in read_pem_certs(&config.ca_cert_path)? {
            roots
                .add(&rustls::Certificate(cert))
                .map_err(|e| config_error(&config.ca_cert_path, &e.to_string()))?;
        }

        let client_certs = read_pem_certs(&config.client_cert_path)?
            .into_iter()
            .map(rustls::Certificate)
            .collect();
        let client_key = read_pem_private_key(&config.client_key_path)?;

        let tls_config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_client_auth_cert(client_certs, client_key)
            .map_err(|e| {
                EncryptionError::Infrastructure(format!("client identity rejected: {}", e))
            })?;

        let host = config
            .server_name
            .clone()
            .unwrap_or_else(|| config.endpoint.split(':').next().unwrap_or("").to_string());
        let server_name = rustls::ServerName::try_from(host.as_str()).map_err(|e| {
            EncryptionError::Infrastructure(format!("invalid TLS server name '{}': {}", host, e))
        })?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            server_name,
            tls: tokio_rustls::TlsConnector::from(Arc::new(tls_config)),
        })
    }
}

#[async_trait]
impl KmsConnector for TlsKmsConnector {
    async fn connect(&self) -> CryptoResult<Box<dyn KmsStream>> {
        let tcp = TcpStream::connect(&self.endpoint).await.map_err(|e| {
            EncryptionError::Infrastructure(format!(
                "failed to reach encryption service at {}: {}",
                self.endpoint, e
            ))
        })?;

        let stream = self
            .tls
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(|e| {
                EncryptionError::Infrastructure(format!(
                    "TLS handshake with encryption service failed: {}",
                    e
                ))
            })?;

        debug!(endpoint = %self.endpoint, "Connected to encryption service");
        Ok(Box::new(stream))
    }
}

fn config_error(path: &str, message: &str) -> EncryptionError {
    EncryptionError::Infrastructure(format!("{}: {}", path, message))
}

fn read_pem_certs(path: &str) -> CryptoResult<Vec<Vec<u8>>> {
    let pem = std::fs::read(path).map_err(|e| config_error(path, &e.to_string()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(pem.as_slice()))
        .map_err(|e| config_error(path, &e.to_string()))?;
    if certs.is_empty() {
        return Err(config_error(path, "no PEM certificates found"));
    }
    Ok(certs)
}

fn read_pem_private_key(path: &str) -> CryptoResult<rustls::PrivateKey> {
    let pem = std::fs::read(path).map_err(|e| config_error(path, &e.to_string()))?;

    let mut keys = rustls_pemfile::pkcs8_private_keys(&mut BufReader::new(pem.as_slice()))
        .map_err(|e| config_error(path, &e.to_string()))?;
    if keys.is_empty() {
        keys = rustls_pemfile::rsa_private_keys(&mut BufReader::new(pem.as_slice()))
            .map_err(|e| config_error(path, &e.to_string()))?;
    }

    keys.into_iter()
        .next()
        .map(rustls::PrivateKey)
        .ok_or_else(|| config_error(path, "no PEM private key found"))
}
