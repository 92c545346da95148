#[cfg(feature = "storage-local")]
use crate::LocalGateway;
#[cfg(feature = "storage-s3")]
use crate::S3Gateway;
use crate::{StorageBackend, StorageError, StorageGateway, StorageResult};
use clipcast_core::Config;
use std::sync::Arc;

/// Create a storage gateway based on configuration
pub async fn create_gateway(config: &Config) -> StorageResult<Arc<dyn StorageGateway>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let gateway = S3Gateway::new(bucket, region, endpoint).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config
                .local_storage_base_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}/media", config.server_port));

            let gateway = LocalGateway::new(base_path, base_url).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
