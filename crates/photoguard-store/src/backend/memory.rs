//! In-memory object store

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use photoguard_core::{ObjectRef, ObjectStore, PhotoGuardResult};
use tracing::debug;

use super::{ensure_not_empty, object_key, StoredObject};

/// Ephemeral store backed by a concurrent map
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what the pipeline wrote.
#[derive(Clone)]
pub struct InMemoryStore {
    bucket: String,
    objects: Arc<DashMap<String, (StoredObject, Bytes)>>,
}

impl InMemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Bytes stored under `key`
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|entry| entry.1.clone())
    }

    /// Metadata for `key`
    pub fn metadata(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.0.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put(&self, bytes: Bytes, content_type: &str) -> PhotoGuardResult<ObjectRef> {
        ensure_not_empty(&bytes)?;

        let key = object_key(content_type);
        let meta = StoredObject::new(&key, content_type, bytes.len());
        debug!(key = %key, size = bytes.len(), "Storing object in memory");

        self.objects.insert(key.clone(), (meta, bytes));
        Ok(ObjectRef::new(self.bucket.clone(), key))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
