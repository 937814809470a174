//! Pooled RPC client for the encryption service
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


use crate::connector::{KmsConnector, KmsStream, TlsKmsConnector};
use crate::framing::{read_response, write_request, OP_DECRYPT, OP_ENCRYPT};
use crate::proto::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse};
use custodia_config::RemoteKmsConfig;
use custodia_encryption::classify::{decrypt_failure, ErrorSource};
use custodia_encryption::{CryptoResult, EncryptedValue, EncryptionError};
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

/// Client for the remote encryption service
///
/// Holds a bounded pool of connections. A connection carries one call at a
/// time; independent calls never serialize on a shared connection. Calls
/// carry a deadline and are not retried here.
pub struct RemoteKmsClient {
    connector: Arc<dyn KmsConnector>,
    idle: Mutex<Vec<Box<dyn KmsStream>>>,
    permits: Semaphore,
    timeout: Duration,
}

impl RemoteKmsClient {
    pub fn new(connector: Arc<dyn KmsConnector>, max_connections: usize, timeout: Duration) -> Self {
        Self {
            connector,
            idle: Mutex::new(Vec::new()),
            permits: Semaphore::new(max_connections),
            timeout,
        }
    }

    /// Build a client with the production TLS connector
    pub fn from_config(config: &RemoteKmsConfig) -> CryptoResult<Self> {
        let connector = TlsKmsConnector::from_config(config)?;
        Ok(Self::new(
            Arc::new(connector),
            config.max_connections(),
            Duration::from_millis(config.timeout_ms()),
        ))
    }

    /// Encrypt `data` under the server-side key named by `key_label`
    pub async fn encrypt(&self, key_label: &str, data: &[u8]) -> CryptoResult<EncryptedValue> {
        let request = EncryptRequest {
            data: data.to_vec(),
            key: key_label.to_string(),
        };
        let response: EncryptResponse = self.call(OP_ENCRYPT, &request).await?;

        if !response.error.is_empty() {
            return Err(EncryptionError::Infrastructure(response.error));
        }

        Ok(EncryptedValue {
            ciphertext: response.data,
            nonce: response.nonce,
        })
    }

    /// Decrypt a ciphertext under the server-side key named by `key_label`
    ///
    /// Server-reported errors are split into wrong-key and fatal classes;
    /// transport failures and deadline expiry are always fatal.
    pub async fn decrypt(
        &self,
        key_label: &str,
        data: &[u8],
        nonce: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let request = DecryptRequest {
            data: data.to_vec(),
            key: key_label.to_string(),
            nonce: nonce.to_vec(),
        };
        let response: DecryptResponse = self.call(OP_DECRYPT, &request).await?;

        if !response.error.is_empty() {
            return Err(decrypt_failure(ErrorSource::RemoteService, response.error));
        }

        Ok(response.data)
    }

    async fn call<Req, Resp>(&self, op: u8, request: &Req) -> CryptoResult<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        tokio::time::timeout(self.timeout, self.call_inner(op, request))
            .await
            .map_err(|_| {
                EncryptionError::Infrastructure(format!(
                    "encryption service call timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
    }

    async fn call_inner<Req, Resp>(&self, op: u8, request: &Req) -> CryptoResult<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EncryptionError::Infrastructure("connection pool closed".to_string()))?;

        let pooled = self.idle.lock().await.pop();
        let mut stream = match pooled {
            Some(stream) => stream,
            None => self.connector.connect().await?,
        };

        let result = async {
            write_request(&mut stream, op, request).await?;
            read_response(&mut stream).await
        }
        .await;

        match result {
            Ok(response) => {
                // Only a connection that completed its call cleanly goes
                // back in the pool.
                self.idle.lock().await.push(stream);
                Ok(response)
            }
            Err(e) => {
                debug!("Dropping encryption service connection after failed call");
                Err(e)
            }
        }
    }
}
