//! Label Classification - Map detector labels to a risk tier
//!
//! Each label is bucketed on its own confidence:
//! - unsafe: confidence >= 90
//! - warn: 70 <= confidence < 90
//! - safe: confidence < 70
//!
//! The verdict takes the most severe bucket that has any label in it. Labels
//! without a usable confidence are left out of every bucket.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::label::Label;
use crate::verdict::{Tier, Verdict};

/// Message returned when the detector found nothing
pub const NO_LABELS_MESSAGE: &str = "No moderation labels detected. The image appears safe.";

/// Confidence thresholds, inclusive on the more severe side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Labels at or above this are unsafe
    pub unsafe_at: f64,
    /// Labels at or above this (and below `unsafe_at`) are warnings
    pub warn_at: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            unsafe_at: 90.0,
            warn_at: 70.0,
        }
    }
}

impl Thresholds {
    /// Tier implied by a single confidence value
    pub fn tier_for(&self, confidence: f64) -> Tier {
        if confidence >= self.unsafe_at {
            Tier::Unsafe
        } else if confidence >= self.warn_at {
            Tier::Warn
        } else {
            Tier::Safe
        }
    }
}

/// Classifier that turns a label list into a [`Verdict`]
#[derive(Debug, Clone, Default)]
pub struct ClassificationEngine {
    thresholds: Thresholds,
}

impl ClassificationEngine {
    /// Create an engine with the standard 90/70 thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a list of labels
    ///
    /// Pure and deterministic: the same labels in the same order always give
    /// the same verdict.
    pub fn classify(&self, labels: &[Label]) -> Verdict {
        let mut unsafe_labels = Vec::new();
        let mut warn_labels = Vec::new();
        let mut safe_labels = Vec::new();
        let mut dropped = 0usize;

        for label in labels {
            let Some(confidence) = label.score() else {
                dropped += 1;
                continue;
            };
            match self.thresholds.tier_for(confidence) {
                Tier::Unsafe => unsafe_labels.push(label.clone()),
                Tier::Warn => warn_labels.push(label.clone()),
                Tier::Safe => safe_labels.push(label.clone()),
            }
        }

        if dropped > 0 {
            debug!(dropped, total = labels.len(), "Ignoring labels without a usable confidence");
        }

        if !unsafe_labels.is_empty() {
            return Verdict {
                tier: Tier::Unsafe,
                message: format!(
                    "This image contains unsafe content ({}) and cannot be accepted.",
                    join_names(&unsafe_labels)
                ),
                driver_labels: unsafe_labels,
            };
        }

        if !warn_labels.is_empty() {
            return Verdict {
                tier: Tier::Warn,
                message: format!(
                    "Caution: this image may contain sensitive content ({}). Please review it before sharing.",
                    join_names(&warn_labels)
                ),
                driver_labels: warn_labels,
            };
        }

        if !safe_labels.is_empty() {
            return Verdict {
                tier: Tier::Safe,
                message: format!(
                    "This image is mostly safe, but the following low-confidence flags were detected: {}.",
                    join_names(&safe_labels)
                ),
                driver_labels: safe_labels,
            };
        }

        Verdict {
            tier: Tier::Safe,
            driver_labels: Vec::new(),
            message: NO_LABELS_MESSAGE.to_string(),
        }
    }
}

/// Classify labels with the standard thresholds
pub fn classify(labels: &[Label]) -> Verdict {
    ClassificationEngine::new().classify(labels)
}

fn join_names(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
