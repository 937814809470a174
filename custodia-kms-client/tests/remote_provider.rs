//! Wire client and remote provider behavior against a scripted in-process
//! encryption service
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
use custodia_config::KeyDescriptor;
use custodia_encryption::{CryptoResult, EncryptionError, EncryptionProvider};
use custodia_kms_client::framing::{OP_DECRYPT, OP_ENCRYPT};
use custodia_kms_client::proto::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse};
use custodia_kms_client::{KmsConnector, KmsStream, RemoteEncryptionProvider, RemoteKmsClient};
use prost::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

const SERVER_NONCE: &[u8] = b"remote-nonce";

/// How the scripted server behaves
#[derive(Clone)]
enum ServerMode {
    /// XOR "encryption" keyed by label, so round trips are real
    Xor,
    /// Every decrypt fails with this error string
    DecryptError(String),
    /// Every encrypt fails with this error string
    EncryptError(String),
    /// Read the request, never answer
    Silent,
    /// Announce a frame and hang up before sending it
    ShortFrame,
}

fn xor_key(label: &str) -> u8 {
    label.bytes().fold(0, |acc, b| acc ^ b)
}

async fn serve(mut stream: DuplexStream, mode: ServerMode) {
    loop {
        let op = match stream.read_u8().await {
            Ok(op) => op,
            Err(_) => return,
        };
        let len = stream.read_u32().await.unwrap();
        let mut body = vec![0u8; len as usize];
        stream.read_exact(&mut body).await.unwrap();

        match &mode {
            ServerMode::Silent => {
                // Hold the connection open without answering.
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return;
            }
            ServerMode::ShortFrame => {
                stream.write_u32(64).await.unwrap();
                return;
            }
            _ => {}
        }

        let response = match op {
            OP_ENCRYPT => {
                let request = EncryptRequest::decode(body.as_slice()).unwrap();
                match &mode {
                    ServerMode::EncryptError(error) => EncryptResponse {
                        data: Vec::new(),
                        nonce: Vec::new(),
                        error: error.clone(),
                    },
                    _ => {
                        let key = xor_key(&request.key);
                        EncryptResponse {
                            data: request.data.iter().map(|b| b ^ key).collect(),
                            nonce: SERVER_NONCE.to_vec(),
                            error: String::new(),
                        }
                    }
                }
                .encode_to_vec()
            }
            OP_DECRYPT => {
                let request = DecryptRequest::decode(body.as_slice()).unwrap();
                match &mode {
                    ServerMode::DecryptError(error) => DecryptResponse {
                        data: Vec::new(),
                        error: error.clone(),
                    },
                    _ => {
                        assert_eq!(request.nonce, SERVER_NONCE);
                        let key = xor_key(&request.key);
                        DecryptResponse {
                            data: request.data.iter().map(|b| b ^ key).collect(),
                            error: String::new(),
                        }
                    }
                }
                .encode_to_vec()
            }
            other => panic!("unknown operation code {}", other),
        };

        stream.write_u32(response.len() as u32).await.unwrap();
        stream.write_all(&response).await.unwrap();
    }
}

struct ScriptedConnector {
    mode: ServerMode,
    refuse: bool,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    fn new(mode: ServerMode) -> Self {
        Self {
            mode,
            refuse: false,
            connects: AtomicUsize::new(0),
        }
    }

    fn refusing() -> Self {
        Self {
            mode: ServerMode::Xor,
            refuse: true,
            connects: AtomicUsize::new(0),
        }
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KmsConnector for ScriptedConnector {
    async fn connect(&self) -> CryptoResult<Box<dyn KmsStream>> {
        if self.refuse {
            return Err(EncryptionError::Infrastructure(
                "failed to reach encryption service: connection refused".to_string(),
            ));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (client_side, server_side) = tokio::io::duplex(4096);
        tokio::spawn(serve(server_side, self.mode.clone()));
        Ok(Box::new(client_side))
    }
}

fn client_with(connector: Arc<ScriptedConnector>) -> RemoteKmsClient {
    RemoteKmsClient::new(connector, 4, Duration::from_millis(500))
}

fn descriptors() -> Vec<KeyDescriptor> {
    vec![
        KeyDescriptor {
            active: false,
            material: "retired-label".to_string(),
        },
        KeyDescriptor {
            active: true,
            material: "primary-label".to_string(),
        },
    ]
}

#[tokio::test]
async fn encrypt_decrypt_round_trip() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::Xor));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();

    let key = provider.active_key().unwrap();
    assert_eq!(key.label(), Some("primary-label"));

    let sealed = provider.encrypt(&key, "remote secret").await.unwrap();
    assert_eq!(sealed.nonce, SERVER_NONCE);
    assert_ne!(sealed.ciphertext, b"remote secret");

    let opened = provider
        .decrypt(&key, &sealed.ciphertext, &sealed.nonce)
        .await
        .unwrap();
    assert_eq!(opened, "remote secret");
}

#[tokio::test]
async fn keys_follow_configured_order() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::Xor));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();

    let labels: Vec<_> = provider
        .keys()
        .iter()
        .map(|k| k.label().unwrap().to_string())
        .collect();
    assert_eq!(labels, vec!["retired-label", "primary-label"]);
}

#[tokio::test]
async fn known_hsm_error_is_wrong_key() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::DecryptError(
        "Could not process input data: function 'C_Decrypt' returns 0x40".to_string(),
    )));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();
    let key = provider.active_key().unwrap();

    let result = provider.decrypt(&key, b"whatever", SERVER_NONCE).await;
    assert!(matches!(result, Err(EncryptionError::WrongKey(_))));
}

#[tokio::test]
async fn known_dsm_error_is_wrong_key() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::DecryptError(
        "Decrypt error: rv=48".to_string(),
    )));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();
    let key = provider.active_key().unwrap();

    let result = provider.decrypt(&key, b"whatever", SERVER_NONCE).await;
    assert!(matches!(result, Err(EncryptionError::WrongKey(_))));
}

#[tokio::test]
async fn unknown_server_error_is_fatal() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::DecryptError(
        "I don't know what 0x41 means and neither do you".to_string(),
    )));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();
    let key = provider.active_key().unwrap();

    let result = provider.decrypt(&key, b"whatever", SERVER_NONCE).await;
    assert!(matches!(result, Err(EncryptionError::Infrastructure(_))));
}

#[tokio::test]
async fn encrypt_errors_are_never_wrong_key() {
    // Even a wrong-key-looking message is fatal on the encrypt path.
    let connector = Arc::new(ScriptedConnector::new(ServerMode::EncryptError(
        "Decrypt error: rv=48".to_string(),
    )));
    let provider = RemoteEncryptionProvider::new(client_with(connector), &descriptors()).unwrap();
    let key = provider.active_key().unwrap();

    let result = provider.encrypt(&key, "anything").await;
    assert!(matches!(result, Err(EncryptionError::Infrastructure(_))));
}

#[tokio::test]
async fn timed_out_call_is_fatal() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::Silent));
    let client = RemoteKmsClient::new(connector, 1, Duration::from_millis(50));

    let result = client.encrypt("primary-label", b"data").await;
    match result {
        Err(EncryptionError::Infrastructure(message)) => {
            assert!(message.contains("timed out"), "unexpected message: {}", message);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn connection_refused_is_fatal() {
    let connector = Arc::new(ScriptedConnector::refusing());
    let client = client_with(connector);

    let result = client.encrypt("primary-label", b"data").await;
    assert!(matches!(result, Err(EncryptionError::Infrastructure(_))));
}

#[tokio::test]
async fn short_frame_is_fatal() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::ShortFrame));
    let client = client_with(connector);

    let result = client.encrypt("primary-label", b"data").await;
    assert!(matches!(result, Err(EncryptionError::Infrastructure(_))));
}

#[tokio::test]
async fn healthy_connections_are_reused() {
    let connector = Arc::new(ScriptedConnector::new(ServerMode::Xor));
    let client = client_with(connector.clone());

    client.encrypt("primary-label", b"one").await.unwrap();
    client.encrypt("primary-label", b"two").await.unwrap();
    client.decrypt("primary-label", b"ct", SERVER_NONCE).await.unwrap();

    assert_eq!(connector.connects(), 1);
}
