//! Detection labels as returned by the moderation detector

use serde::{Deserialize, Deserializer, Serialize};

/// One moderation finding
///
/// Field names follow the detector's wire format (`Name`, `ParentName`,
/// `Confidence`, `TaxonomyLevel`) so labels can be passed straight through
/// to the response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    /// Detected concept, e.g. "Violence"
    pub name: String,

    /// Broader taxonomy category (empty for top-level labels)
    #[serde(default)]
    pub parent_name: String,

    /// Detector certainty in [0, 100]. `None` when the detector sent
    /// something that is not a finite number.
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<f64>,

    /// Depth in the detector's concept hierarchy
    #[serde(default)]
    pub taxonomy_level: u32,
}

impl Label {
    /// Create a top-level label with the given confidence
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
            confidence: Some(confidence),
            taxonomy_level: 0,
        }
    }

    /// Create a label whose confidence could not be read
    pub fn unscored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
            confidence: None,
            taxonomy_level: 0,
        }
    }

    /// Set the parent category
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = parent.into();
        self
    }

    /// Set the taxonomy depth
    pub fn with_taxonomy_level(mut self, level: u32) -> Self {
        self.taxonomy_level = level;
        self
    }

    /// Confidence usable for tiering, if any
    pub fn score(&self) -> Option<f64> {
        self.confidence.filter(|c| c.is_finite())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfidence {
    Number(f64),
    Other(serde::de::IgnoredAny),
}

/// Accept any JSON value for `Confidence`; anything but a finite number
/// becomes `None` instead of failing the whole response.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawConfidence::deserialize(deserializer)? {
        RawConfidence::Number(n) if n.is_finite() => Some(n),
        _ => None,
    })
}
