use crate::traits::{StorageError, StorageGateway, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use clipcast_core::models::{CompletedObject, PartAuthorization, PartReceipt};

/// Filesystem storage gateway for development and tests.
///
/// Sessions live under `{base}/.sessions/{session_id}/` with one file per
/// part; receipt tags are hex SHA-256 digests of the part bytes. Completion
/// verifies every receipt against the stored part and concatenates the parts
/// into the final key path. Part authorizations point at the relay endpoint
/// under `base_url` since the filesystem cannot accept direct PUTs.
#[derive(Clone)]
pub struct LocalGateway {
    base_path: PathBuf,
    base_url: String,
}

impl LocalGateway {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".sessions")).await?;

        Ok(LocalGateway {
            base_path,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn validate_key(key: &str) -> StorageResult<()> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.base_path.join(".sessions").join(session_id)
    }

    fn part_path(&self, session_id: &str, part_number: i32) -> PathBuf {
        self.session_dir(session_id).join(format!("part.{}", part_number))
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn digest(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }
}

#[async_trait]
impl StorageGateway for LocalGateway {
    async fn create_session(&self, key: &str, _content_type: &str) -> StorageResult<String> {
        Self::validate_key(key)?;

        let session_id = Uuid::new_v4().to_string();
        fs::create_dir_all(self.session_dir(&session_id))
            .await
            .map_err(|e| StorageError::SessionCreation(e.to_string()))?;

        tracing::info!(key = %key, session_id = %session_id, "Local multipart session created");

        Ok(session_id)
    }

    async fn authorize_part(
        &self,
        session_id: &str,
        key: &str,
        part_number: i32,
        ttl: Duration,
    ) -> StorageResult<PartAuthorization> {
        Self::validate_key(key)?;

        // No presigning on a filesystem; parts are relayed through the API.
        Ok(PartAuthorization {
            part_number,
            url: format!(
                "{}/uploads/{}/parts/{}",
                self.base_url, session_id, part_number
            ),
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default(),
        })
    }

    async fn upload_part(
        &self,
        session_id: &str,
        key: &str,
        part_number: i32,
        bytes: Bytes,
    ) -> StorageResult<String> {
        Self::validate_key(key)?;

        if !fs::try_exists(self.session_dir(session_id)).await? {
            return Err(StorageError::NotFound(format!(
                "upload session {}",
                session_id
            )));
        }

        let receipt_tag = Self::digest(&bytes);
        let path = self.part_path(session_id, part_number);

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StorageError::PartUploadFailed(e.to_string()))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| StorageError::PartUploadFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| StorageError::PartUploadFailed(e.to_string()))?;

        tracing::info!(
            key = %key,
            session_id = %session_id,
            part_number = part_number,
            size_bytes = bytes.len(),
            "Local part stored"
        );

        Ok(receipt_tag)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        key: &str,
        receipts: &[PartReceipt],
    ) -> StorageResult<CompletedObject> {
        Self::validate_key(key)?;

        let session_dir = self.session_dir(session_id);
        if !fs::try_exists(&session_dir).await? {
            return Err(StorageError::NotFound(format!(
                "upload session {}",
                session_id
            )));
        }

        let object_path = self.object_path(key);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut object = fs::File::create(&object_path)
            .await
            .map_err(|e| StorageError::CompletionFailed(e.to_string()))?;
        let mut whole = Sha256::new();

        for receipt in receipts {
            let part_bytes = fs::read(self.part_path(session_id, receipt.part_number))
                .await
                .map_err(|_| {
                    StorageError::CompletionFailed(format!(
                        "part {} was never uploaded",
                        receipt.part_number
                    ))
                })?;

            if Self::digest(&part_bytes) != receipt.receipt_tag {
                return Err(StorageError::CompletionFailed(format!(
                    "receipt tag mismatch for part {}",
                    receipt.part_number
                )));
            }

            whole.update(&part_bytes);
            object
                .write_all(&part_bytes)
                .await
                .map_err(|e| StorageError::CompletionFailed(e.to_string()))?;
        }

        object
            .flush()
            .await
            .map_err(|e| StorageError::CompletionFailed(e.to_string()))?;

        fs::remove_dir_all(&session_dir).await.ok();

        tracing::info!(
            key = %key,
            session_id = %session_id,
            parts = receipts.len(),
            "Local multipart session completed"
        );

        Ok(CompletedObject {
            location: format!("{}/{}", self.base_url, key),
            checksum: Some(hex::encode(whole.finalize())),
        })
    }

    async fn abort_session(&self, session_id: &str, key: &str) -> StorageResult<()> {
        Self::validate_key(key)?;

        match fs::remove_dir_all(self.session_dir(session_id)).await {
            Ok(()) => {
                tracing::info!(key = %key, session_id = %session_id, "Local multipart session aborted");
                Ok(())
            }
            // Already-gone sessions count as aborted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::BackendUnavailable(e.to_string())),
        }
    }

    async fn authorize_read(&self, key: &str, _ttl: Duration) -> StorageResult<String> {
        Self::validate_key(key)?;

        if !fs::try_exists(self.object_path(key)).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        Self::validate_key(key)?;

        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::BackendUnavailable(e.to_string())),
        }
    }
}
