//! Shared key generation for storage backends.
//!
//! Key format: `media/{content_id}.{ext}` for podcast uploads and
//! `clips/{content_id}.{ext}` for clips. Key generation is centralized here
//! so all backends stay consistent.

use uuid::Uuid;

/// Lowercased extension of a filename, defaulting to `bin`.
fn extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != filename)
        .unwrap_or("bin")
        .to_lowercase()
}

/// Storage key for a long-form upload.
pub fn podcast_key(content_id: Uuid, filename: &str) -> String {
    format!("media/{}.{}", content_id, extension(filename))
}

/// Storage key for a clip cut from a podcast.
pub fn clip_key(content_id: Uuid, filename: &str) -> String {
    format!("clips/{}.{}", content_id, extension(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_lowercased_extension() {
        let id = Uuid::nil();
        assert_eq!(
            podcast_key(id, "Episode.MP4"),
            format!("media/{}.mp4", id)
        );
        assert_eq!(clip_key(id, "cut.webm"), format!("clips/{}.webm", id));
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        let id = Uuid::nil();
        assert_eq!(podcast_key(id, "noext"), format!("media/{}.bin", id));
    }
}
