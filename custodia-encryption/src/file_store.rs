//! File-backed canary record store
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


use crate::canary_store::{CanaryRecord, CanaryStore, NewCanary};
use crate::error::{CryptoResult, EncryptionError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const CANARY_EXTENSION: &str = "canary";

/// Canary store that keeps one JSON document per record on disk
pub struct FileCanaryStore {
    storage_path: PathBuf,
}

impl FileCanaryStore {
    /// Open a store rooted at the given directory, creating it if needed
    pub async fn new<P: AsRef<Path>>(storage_path: P) -> CryptoResult<Self> {
        let storage_path = storage_path.as_ref().to_path_buf();
        fs::create_dir_all(&storage_path)
            .await
            .map_err(|e| EncryptionError::Store(e.to_string()))?;
        Ok(Self { storage_path })
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.storage_path.join(format!("{}.{}", id, CANARY_EXTENSION))
    }
}

#[async_trait]
impl CanaryStore for FileCanaryStore {
    async fn find_all(&self) -> CryptoResult<Vec<CanaryRecord>> {
        let mut records = Vec::new();

        let mut entries = fs::read_dir(&self.storage_path)
            .await
            .map_err(|e| EncryptionError::Store(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EncryptionError::Store(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CANARY_EXTENSION) {
                continue;
            }

            match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<CanaryRecord>(&content) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable canary record");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read canary record");
                }
            }
        }

        debug!("Loaded {} canary records", records.len());
        Ok(records)
    }

    async fn save(&self, canary: NewCanary) -> CryptoResult<CanaryRecord> {
        let record = CanaryRecord {
            id: Uuid::new_v4(),
            encrypted_value: canary.encrypted_value,
            nonce: canary.nonce,
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| EncryptionError::Store(e.to_string()))?;
        fs::write(self.record_path(&record.id), json)
            .await
            .map_err(|e| EncryptionError::Store(e.to_string()))?;

        debug!(canary = %record.id, "Canary record saved");
        Ok(record)
    }
}
