//! Store backends and shared key layout

pub mod file;
pub mod memory;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use photoguard_core::{PhotoGuardError, PhotoGuardResult};
use serde::{Deserialize, Serialize};

/// Prefix under which every upload is written
pub const KEY_PREFIX: &str = "photos";

/// File extension for a content type
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Fresh object key for an upload
///
/// Keys are random per call and never derived from the content, so identical
/// uploads land under different keys.
pub fn object_key(content_type: &str) -> String {
    format!(
        "{}/{}.{}",
        KEY_PREFIX,
        uuid::Uuid::new_v4(),
        extension_for(content_type)
    )
}

/// Metadata recorded alongside each stored object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl StoredObject {
    fn new(key: &str, content_type: &str, size: usize) -> Self {
        Self {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size,
            created_at: Utc::now(),
        }
    }
}

/// Reject empty uploads before touching the backend
pub(crate) fn ensure_not_empty(bytes: &Bytes) -> PhotoGuardResult<()> {
    if bytes.is_empty() {
        return Err(PhotoGuardError::storage("Refusing to store an empty object"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_common_types() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("IMAGE/PNG"), "png");
        assert_eq!(extension_for("image/webp; q=0.9"), "webp");
        assert_eq!(extension_for("application/octet-stream"), "bin");
        assert_eq!(extension_for(""), "bin");
    }

    #[test]
    fn test_object_keys_are_unique() {
        let a = object_key("image/jpeg");
        let b = object_key("image/jpeg");

        assert_ne!(a, b);
        assert!(a.starts_with("photos/"));
        assert!(a.ends_with(".jpg"));
    }
}
