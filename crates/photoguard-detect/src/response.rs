//! Wire types for the moderation endpoint

use photoguard_core::{Label, ObjectRef, PhotoGuardError, PhotoGuardResult};
use serde::{Deserialize, Serialize};

/// Request body sent to the detector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModerationRequest {
    pub image: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "S3Object")]
    pub s3_object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Object {
    pub bucket: String,
    pub name: String,
}

impl ModerationRequest {
    pub fn for_object(object: &ObjectRef, min_confidence: Option<f64>) -> Self {
        Self {
            image: ImageSource {
                s3_object: S3Object {
                    bucket: object.bucket.clone(),
                    name: object.key.clone(),
                },
            },
            min_confidence,
        }
    }
}

/// Response body returned by the detector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModerationResponse {
    pub moderation_labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation_model_version: Option<String>,
}

/// Parse labels from a detector payload
///
/// Accepts either the full `{"ModerationLabels": [...]}` response or a bare
/// label array.
pub fn parse_labels(raw: &[u8]) -> PhotoGuardResult<Vec<Label>> {
    let value: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| PhotoGuardError::detection(format!("Response is not JSON: {}", e)))?;

    let labels = if value.is_array() {
        serde_json::from_value::<Vec<Label>>(value)
    } else {
        serde_json::from_value::<ModerationResponse>(value).map(|r| r.moderation_labels)
    };

    labels.map_err(|e| PhotoGuardError::detection(format!("Unexpected response shape: {}", e)))
}
