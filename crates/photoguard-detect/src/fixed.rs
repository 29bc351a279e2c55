//! Fixed-response detector

use async_trait::async_trait;
use photoguard_core::{Detector, Label, ObjectRef, PhotoGuardResult};
use tracing::debug;

/// Detector that answers every request with the same labels
///
/// Used for local runs without a moderation service and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    labels: Vec<Label>,
}

impl StaticDetector {
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Detector that never finds anything
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Detector for StaticDetector {
    async fn detect(&self, object: &ObjectRef) -> PhotoGuardResult<Vec<Label>> {
        debug!(object = %object, count = self.labels.len(), "Returning static labels");
        Ok(self.labels.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
