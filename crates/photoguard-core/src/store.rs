//! Object store abstraction for uploaded photos

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PhotoGuardResult;
use crate::object::ObjectRef;

/// Durable storage for raw photo bytes
///
/// Every call is an independent write under a fresh key: two uploads of the
/// same bytes get two objects. Implementations must not return a reference
/// unless the write itself succeeded.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` and return where they landed
    ///
    /// Fails with [`crate::PhotoGuardError::Storage`] on empty input or any
    /// backend write error.
    async fn put(&self, bytes: Bytes, content_type: &str) -> PhotoGuardResult<ObjectRef>;

    /// Bucket this store writes into
    fn bucket(&self) -> &str;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}
