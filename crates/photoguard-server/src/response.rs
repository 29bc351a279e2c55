//! Response body returned to the caller

use photoguard_core::{ErrorKind, Label, PhotoGuardError, PipelineResult, Stage, StageFailure, Tier};
use serde::{Deserialize, Serialize};

/// Status field of the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Safe,
    Warn,
    Unsafe,
    Error,
}

impl From<Tier> for ResponseStatus {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Safe => Self::Safe,
            Tier::Warn => Self::Warn,
            Tier::Unsafe => Self::Unsafe,
        }
    }
}

/// Which stage failed and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub stage: Stage,
    pub kind: ErrorKind,
}

/// Body of every classification response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub status: ResponseStatus,
    /// Driver labels of the verdict; empty on failure
    pub labels: Vec<Label>,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ClassifyResponse {
    pub fn from_failure(failure: StageFailure) -> Self {
        Self {
            status: ResponseStatus::Error,
            labels: Vec::new(),
            user_message: failure.message,
            error: Some(ErrorBody {
                stage: failure.stage,
                kind: failure.kind,
            }),
        }
    }

    pub fn from_error(err: &PhotoGuardError) -> Self {
        Self::from_failure(StageFailure::from(err))
    }
}

impl From<PipelineResult> for ClassifyResponse {
    fn from(result: PipelineResult) -> Self {
        match result {
            PipelineResult::Classified(verdict) => Self {
                status: verdict.tier.into(),
                labels: verdict.driver_labels,
                user_message: verdict.message,
                error: None,
            },
            PipelineResult::Failed(failure) => Self::from_failure(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoguard_core::classify;

    #[test]
    fn test_verdict_response_shape() {
        let verdict = classify(&[Label::new("Violence", 95.2)]);
        let value = serde_json::to_value(ClassifyResponse::from(PipelineResult::from(verdict))).unwrap();

        assert_eq!(value["status"], "unsafe");
        assert_eq!(value["labels"][0]["Name"], "Violence");
        assert_eq!(value["labels"][0]["ParentName"], "");
        assert_eq!(value["labels"][0]["Confidence"], 95.2);
        assert_eq!(value["labels"][0]["TaxonomyLevel"], 0);
        assert!(value["userMessage"].as_str().unwrap().contains("Violence"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_response_shape() {
        let err = PhotoGuardError::Timeout {
            stage: Stage::Storage,
            deadline_ms: 1000,
        };
        let value = serde_json::to_value(ClassifyResponse::from_error(&err)).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["labels"], serde_json::json!([]));
        assert_eq!(value["error"]["stage"], "storage");
        assert_eq!(value["error"]["kind"], "timeout");
    }
}
