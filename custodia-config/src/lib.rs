//! Configuration management for Custodia services
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


use serde::Deserialize;
use std::env;

/// Which backend owns the configured encryption keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// In-process AES-256-GCM
    Internal,
    /// Remote encryption service spoken over mTLS
    Remote,
}

/// One configured encryption key
///
/// `material` is provider-specific: hex-encoded key bytes for the internal
/// provider, a key label for the remote provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyDescriptor {
    #[serde(default)]
    pub active: bool,
    pub material: String,
}

/// Encryption key set configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionConfig {
    pub provider: ProviderKind,
    #[serde(default)]
    pub keys: Vec<KeyDescriptor>,
}

impl EncryptionConfig {
    /// Create a configuration with an empty, appendable key list
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            keys: Vec::new(),
        }
    }
}

/// Remote encryption service (KMS) connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteKmsConfig {
    /// host:port of the encryption service
    pub endpoint: String,
    /// TLS server name; defaults to the endpoint host
    pub server_name: Option<String>,
    /// Path to the PEM CA bundle used to verify the server
    pub ca_cert_path: String,
    /// Path to the PEM client certificate chain presented to the server
    pub client_cert_path: String,
    /// Path to the PEM client private key
    pub client_key_path: String,
    /// Per-call deadline in milliseconds
    pub timeout_ms: Option<u64>,
    /// Upper bound on pooled connections
    pub max_connections: Option<usize>,
}

impl RemoteKmsConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(5_000)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections.unwrap_or(4)
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub encryption: EncryptionConfig,
    pub remote_kms: Option<RemoteKmsConfig>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let provider = match env::var("CUSTODIA_ENCRYPTION_PROVIDER").as_deref() {
            Ok("remote") => ProviderKind::Remote,
            Ok("internal") | Err(_) => ProviderKind::Internal,
            Ok(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown encryption provider '{}'",
                    other
                )))
            }
        };

        // The key list arrives as a JSON array so that a multi-key rollout
        // stays a single environment variable.
        let keys = match env::var("CUSTODIA_ENCRYPTION_KEYS") {
            Ok(raw) => serde_json::from_str::<Vec<KeyDescriptor>>(&raw).map_err(|e| {
                config::ConfigError::Message(format!("CUSTODIA_ENCRYPTION_KEYS: {}", e))
            })?,
            Err(_) => Vec::new(),
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        // Build remote KMS config if all required vars are present
        let remote_kms = if let (Ok(endpoint), Ok(ca_cert_path), Ok(client_cert_path), Ok(client_key_path)) = (
            env::var("CUSTODIA_KMS_ENDPOINT"),
            env::var("CUSTODIA_KMS_CA_CERT"),
            env::var("CUSTODIA_KMS_CLIENT_CERT"),
            env::var("CUSTODIA_KMS_CLIENT_KEY"),
        ) {
            Some(RemoteKmsConfig {
                endpoint,
                server_name: env::var("CUSTODIA_KMS_SERVER_NAME").ok(),
                ca_cert_path,
                client_cert_path,
                client_key_path,
                timeout_ms: env::var("CUSTODIA_KMS_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
                max_connections: env::var("CUSTODIA_KMS_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            })
        } else {
            None
        };

        Ok(Self {
            encryption: EncryptionConfig { provider, keys },
            remote_kms,
            log_level: Some(log_level),
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
