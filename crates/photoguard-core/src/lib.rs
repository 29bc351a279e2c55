// PhotoGuard Core - Foundation types for photo moderation
//
// This crate holds the data model shared by every other PhotoGuard crate and
// the classification engine that turns detector labels into a risk tier.
// Nothing in here performs I/O.

pub mod classifier;
pub mod detector;
pub mod error;
pub mod label;
pub mod object;
pub mod store;
pub mod verdict;

// Re-export core types
pub use classifier::{classify, ClassificationEngine, Thresholds};
pub use detector::Detector;
pub use error::{ErrorKind, PhotoGuardError, PhotoGuardResult};
pub use label::Label;
pub use object::ObjectRef;
pub use store::ObjectStore;
pub use verdict::{PipelineResult, Stage, StageFailure, Tier, Verdict};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Content type assumed for uploads that do not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Bucket used when no bucket is configured
pub const DEFAULT_BUCKET: &str = "photo-recognition-bucket";
