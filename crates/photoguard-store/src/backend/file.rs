//! File-based object store
//!
//! Writes each object to `<root>/<bucket>/<key>` with a `<key>.meta.json`
//! sidecar next to it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use photoguard_core::{ObjectRef, ObjectStore, PhotoGuardError, PhotoGuardResult};
use tracing::debug;

use super::{ensure_not_empty, object_key, StoredObject};

/// Persistent store rooted at a local directory
///
/// ## Example
///
/// ```rust,no_run
/// use photoguard_store::FileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileStore::new("/var/lib/photoguard", "uploads").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    bucket: String,
}

impl FileStore {
    /// Create a store, creating `<root>/<bucket>` if needed
    pub async fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> PhotoGuardResult<Self> {
        let root = root.into();
        let bucket = bucket.into();

        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(PhotoGuardError::config(format!("Invalid bucket name: {:?}", bucket)));
        }

        let dir = root.join(&bucket);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PhotoGuardError::storage(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;

        Ok(Self { root, bucket })
    }

    /// Directory holding this store's bucket
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Local path of a stored object
    pub fn path_for(&self, object: &ObjectRef) -> PathBuf {
        self.root.join(&object.bucket).join(&object.key)
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// Read back the metadata sidecar of a stored object
    pub async fn metadata(&self, object: &ObjectRef) -> PhotoGuardResult<StoredObject> {
        let path = Self::meta_path(&self.path_for(object));
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PhotoGuardError::storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PhotoGuardError::storage(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl ObjectStore for FileStore {
    async fn put(&self, bytes: Bytes, content_type: &str) -> PhotoGuardResult<ObjectRef> {
        ensure_not_empty(&bytes)?;

        let object = ObjectRef::new(self.bucket.clone(), object_key(content_type));
        let path = self.path_for(&object);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PhotoGuardError::storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let meta = StoredObject::new(&object.key, content_type, bytes.len());
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| PhotoGuardError::storage(format!("Failed to serialize metadata: {}", e)))?;

        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            PhotoGuardError::storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        let meta_path = Self::meta_path(&path);
        tokio::fs::write(&meta_path, meta_json).await.map_err(|e| {
            PhotoGuardError::storage(format!("Failed to write {}: {}", meta_path.display(), e))
        })?;

        debug!(path = %path.display(), size = bytes.len(), "Stored object on disk");
        Ok(object)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_writes_object_and_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path(), "uploads").await.unwrap();

        let object = store
            .put(Bytes::from_static(b"\x89PNG fake"), "image/png")
            .await
            .unwrap();

        assert!(object.key.ends_with(".png"));
        let written = tokio::fs::read(store.path_for(&object)).await.unwrap();
        assert_eq!(written, b"\x89PNG fake");

        let meta = store.metadata(&object).await.unwrap();
        assert_eq!(meta.content_type, "image/png");
        assert_eq!(meta.size, 9);
        assert_eq!(meta.key, object.key);
    }

    #[tokio::test]
    async fn test_identical_bytes_get_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path(), "uploads").await.unwrap();

        let a = store.put(Bytes::from_static(b"abc"), "image/jpeg").await.unwrap();
        let b = store.put(Bytes::from_static(b"abc"), "image/jpeg").await.unwrap();

        assert_ne!(a, b);
        assert!(store.path_for(&a).exists());
        assert!(store.path_for(&b).exists());
    }

    #[tokio::test]
    async fn test_empty_upload_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path(), "uploads").await.unwrap();

        let result = store.put(Bytes::new(), "image/jpeg").await;
        assert!(matches!(result, Err(PhotoGuardError::Storage(_))));
        assert!(!store.bucket_dir().join("photos").exists());
    }

    #[tokio::test]
    async fn test_rejects_bucket_with_separator() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileStore::new(temp_dir.path(), "../escape").await;
        assert!(matches!(result, Err(PhotoGuardError::Config(_))));
    }

    #[tokio::test]
    async fn test_rejects_dot_buckets() {
        let temp_dir = TempDir::new().unwrap();
        for bucket in [".", "..", ""] {
            let result = FileStore::new(temp_dir.path(), bucket).await;
            assert!(matches!(result, Err(PhotoGuardError::Config(_))), "bucket: {:?}", bucket);
        }
    }

    #[tokio::test]
    async fn test_unwritable_root_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path(), "uploads").await.unwrap();

        // Replace the bucket directory with a plain file so writes below it fail
        tokio::fs::remove_dir_all(store.bucket_dir()).await.unwrap();
        tokio::fs::write(store.bucket_dir(), b"not a dir").await.unwrap();

        let err = store.put(Bytes::from_static(b"data"), "image/jpeg").await.unwrap_err();
        assert!(matches!(err, PhotoGuardError::Storage(_)));
    }
}
