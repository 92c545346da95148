use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Content kind: a long-form podcast upload or a clip cut from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "content_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Podcast,
    Clip,
}

/// Processing status of an uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "content_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Processing,
    Processed,
    Failed,
}

/// A validated (start, end) offset pair for a clip, in seconds.
///
/// Invariant: 0 <= start < end <= parent duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClipRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl ClipRange {
    pub fn new(start_secs: f64, end_secs: f64, parent_duration_secs: f64) -> Result<Self, AppError> {
        if start_secs < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "Clip start must not be negative (got {})",
                start_secs
            )));
        }
        if start_secs >= end_secs {
            return Err(AppError::InvalidInput(format!(
                "Clip start ({}) must be before end ({})",
                start_secs, end_secs
            )));
        }
        if end_secs > parent_duration_secs {
            return Err(AppError::InvalidInput(format!(
                "Clip end ({}) exceeds parent duration ({})",
                end_secs, parent_duration_secs
            )));
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// An uploaded artifact: podcast or clip, unified shape.
///
/// Clips additionally reference a parent podcast and carry an offset pair.
/// A row is created only after its upload completes; there are no
/// "processing ghost" rows from failed uploads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Content {
    pub id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub description: Option<String>,
    /// Owning studio.
    pub studio_id: Uuid,
    /// Creating agency; clips only.
    pub agency_id: Option<Uuid>,
    pub filename: String,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration_secs: Option<f64>,
    pub storage_key: String,
    /// Parent podcast; clips only.
    pub parent_id: Option<Uuid>,
    pub start_secs: Option<f64>,
    pub end_secs: Option<f64>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new content row. IDs and timestamps are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub kind: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub studio_id: Uuid,
    pub agency_id: Option<Uuid>,
    pub filename: String,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration_secs: Option<f64>,
    pub storage_key: String,
    pub parent_id: Option<Uuid>,
    pub clip_range: Option<ClipRange>,
    pub status: ContentStatus,
}

impl Content {
    pub fn is_clip(&self) -> bool {
        self.kind == ContentKind::Clip
    }

    /// Whether `user_id` owns this content outright (studio) or created it
    /// (agency clip). Ownership here is about delegable rights, not grants.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.studio_id == user_id || self.agency_id == Some(user_id)
    }
}
