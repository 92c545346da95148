use crate::traits::{StorageError, StorageGateway, StorageResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::Utc;
use std::time::Duration;

use clipcast_core::models::{CompletedObject, PartAuthorization, PartReceipt};

/// S3 storage gateway
///
/// Drives native S3 multipart uploads: sessions map to multipart upload ids,
/// part authorizations are presigned UploadPart requests, and receipt tags
/// are the ETags the backend returns per part.
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Gateway {
    /// Create a new S3Gateway instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(ref endpoint) = endpoint_url {
            // S3-compatible providers generally require path-style addressing
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        Ok(S3Gateway {
            client,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Generate public URL for an S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses the endpoint URL if provided
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            // Path-style for compatibility: {endpoint}/{bucket}/{key}
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl StorageGateway for S3Gateway {
    async fn create_session(&self, key: &str, content_type: &str) -> StorageResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 multipart session creation failed"
                );
                StorageError::SessionCreation(e.to_string())
            })?;

        let session_id = output.upload_id().ok_or_else(|| {
            StorageError::SessionCreation("backend returned no upload id".to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            session_id = %session_id,
            "S3 multipart session created"
        );

        Ok(session_id.to_string())
    }

    async fn authorize_part(
        &self,
        session_id: &str,
        key: &str,
        part_number: i32,
        ttl: Duration,
    ) -> StorageResult<PartAuthorization> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let presigned = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .part_number(part_number)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::BackendUnavailable(e.to_string()))?;

        Ok(PartAuthorization {
            part_number,
            url: presigned.uri().to_string(),
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
        let size = bytes.len() as u64;
        let start = std::time::Instant::now();

        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .part_number(part_number)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    part_number = part_number,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 part upload failed"
                );
                StorageError::PartUploadFailed(e.to_string())
            })?;

        let receipt_tag = output
            .e_tag()
            .ok_or_else(|| {
                StorageError::PartUploadFailed(format!(
                    "no receipt tag returned for part {}",
                    part_number
                ))
            })?
            .to_string();

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            part_number = part_number,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 part upload successful"
        );

        Ok(receipt_tag)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        key: &str,
        receipts: &[PartReceipt],
    ) -> StorageResult<CompletedObject> {
        let parts: Vec<CompletedPart> = receipts
            .iter()
            .map(|r| {
                CompletedPart::builder()
                    .part_number(r.part_number)
                    .e_tag(r.receipt_tag.clone())
                    .build()
            })
            .collect();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    session_id = %session_id,
                    parts = receipts.len(),
                    "S3 multipart completion failed"
                );
                StorageError::CompletionFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            session_id = %session_id,
            parts = receipts.len(),
            "S3 multipart session completed"
        );

        Ok(CompletedObject {
            location: output
                .location()
                .map(String::from)
                .unwrap_or_else(|| self.generate_url(key)),
            checksum: output.e_tag().map(String::from),
        })
    }

    async fn abort_session(&self, session_id: &str, key: &str) -> StorageResult<()> {
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .send()
            .await;

        if let Err(e) = result {
            let service_err = e.into_service_error();
            // A session that is already gone counts as aborted.
            if service_err.meta().code() == Some("NoSuchUpload") {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %key,
                    session_id = %session_id,
                    "S3 multipart session already gone on abort"
                );
                return Ok(());
            }
            return Err(StorageError::BackendUnavailable(service_err.to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            session_id = %session_id,
            "S3 multipart session aborted"
        );

        Ok(())
    }

    async fn authorize_read(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::BackendUnavailable(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::BackendUnavailable(e.to_string()))?;

        tracing::info!(bucket = %self.bucket, key = %key, "S3 object deleted");

        Ok(())
    }
}
