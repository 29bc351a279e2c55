//! PhotoGuard Detect - Moderation detector clients
//!
//! Implementations of [`Detector`]:
//!
//! - **HttpDetector**: calls a DetectModerationLabels-style HTTP endpoint
//! - **StaticDetector**: returns a fixed label list (local runs, tests)

pub mod fixed;
pub mod http;
pub mod response;

pub use fixed::StaticDetector;
pub use http::{HttpDetector, HttpDetectorConfig};
pub use response::{parse_labels, ModerationRequest, ModerationResponse};

pub use photoguard_core::{Detector, Label, ObjectRef};
