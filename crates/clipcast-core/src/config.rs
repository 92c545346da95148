//! Configuration module
//!
//! Env-based configuration for the API and services: database, storage
//! backend, authentication, upload limits, and invitation settings.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 168; // 7 days
const PART_URL_TTL_SECS: u64 = 3600;
const READ_URL_TTL_SECS: u64 = 86400;
const INVITE_EXPIRY_DAYS: i64 = 7;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload coordination
    pub max_upload_size_bytes: u64,
    pub upload_part_size_bytes: u64,
    pub part_url_ttl_secs: u64,
    pub read_url_ttl_secs: u64,
    // Invitations
    pub invite_expiry_days: i64,
    pub email_invites_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    /// Base URL used to build invitation accept links.
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                    other
                ))
            }
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(crate::constants::MAX_UPLOAD_SIZE_BYTES),
            upload_part_size_bytes: env::var("UPLOAD_PART_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(crate::constants::UPLOAD_PART_SIZE_BYTES),
            part_url_ttl_secs: env::var("PART_URL_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PART_URL_TTL_SECS),
            read_url_ttl_secs: env::var("READ_URL_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(READ_URL_TTL_SECS),
            invite_expiry_days: env::var("INVITE_EXPIRY_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(INVITE_EXPIRY_DAYS),
            email_invites_enabled: env::var("EMAIL_INVITES_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|s| s.parse().ok()),
            smtp_user: env::var("SMTP_USER").ok(),
            smtp_password: env::var("SMTP_PASS")
                .or_else(|_| env::var("SMTP_PASSWORD"))
                .ok(),
            smtp_from: env::var("SMTP_FROM").or_else(|_| env::var("FROM_EMAIL")).ok(),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            frontend_url: env::var("FRONTEND_URL").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.upload_part_size_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_PART_SIZE_BYTES must be greater than 0"));
        }
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_BYTES must be greater than 0"));
        }
        if self.email_invites_enabled && self.smtp_host.is_none() {
            return Err(anyhow::anyhow!(
                "SMTP_HOST must be set when EMAIL_INVITES_ENABLED=true"
            ));
        }

        Ok(())
    }
}
