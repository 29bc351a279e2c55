//! Detection capability abstraction

use async_trait::async_trait;

use crate::error::PhotoGuardResult;
use crate::label::Label;
use crate::object::ObjectRef;

/// External moderation detector
///
/// Given a stored photo, returns the detector's labels in the order it
/// reported them. Transport failures and unusable responses map to
/// [`crate::PhotoGuardError::Detection`].
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, object: &ObjectRef) -> PhotoGuardResult<Vec<Label>>;

    /// Detector name for logs
    fn name(&self) -> &str;
}
