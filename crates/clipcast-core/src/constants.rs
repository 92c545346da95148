//! Shared constants for upload coordination and content limits.

/// Fixed part size for multipart uploads: 5 MiB.
pub const UPLOAD_PART_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Upper bound on a single upload: 100 GiB.
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024 * 1024;

/// Maximum size for a clip: 1 GiB.
pub const MAX_CLIP_SIZE_BYTES: u64 = 1024 * 1024 * 1024;

/// Content types accepted for upload.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "audio/mp3",
    "audio/wav",
    "audio/mpeg",
    "audio/mp4",
];

/// Number of random bytes in an invitation token (hex-encoded on the wire).
pub const INVITE_TOKEN_BYTES: usize = 32;
