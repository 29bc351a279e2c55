//! HTTP moderation detector
//!
//! Posts a DetectModerationLabels-style request naming the stored object and
//! reads `ModerationLabels` from the response.

use async_trait::async_trait;
use photoguard_core::{Detector, Label, ObjectRef, PhotoGuardError, PhotoGuardResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::response::{parse_labels, ModerationRequest};

/// HTTP detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDetectorConfig {
    /// Moderation endpoint URL
    pub endpoint: String,

    /// Bearer token sent with each request
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Ask the detector to omit labels below this confidence
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

fn default_timeout() -> u64 {
    30
}

impl HttpDetectorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            timeout_secs: default_timeout(),
            min_confidence: None,
        }
    }
}

/// Detector backed by a remote moderation endpoint
pub struct HttpDetector {
    config: HttpDetectorConfig,
    client: reqwest::Client,
}

impl HttpDetector {
    /// Create a new detector; the HTTP client is built once and reused
    pub fn new(config: HttpDetectorConfig) -> PhotoGuardResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(PhotoGuardError::config("Detection endpoint is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(format!("PhotoGuard/{}", photoguard_core::VERSION))
            .build()
            .map_err(|e| PhotoGuardError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpDetectorConfig {
        &self.config
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, object: &ObjectRef) -> PhotoGuardResult<Vec<Label>> {
        let body = ModerationRequest::for_object(object, self.config.min_confidence);

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(ref token) = self.config.api_token {
            request = request.bearer_auth(token);
        }

        debug!(object = %object, endpoint = %self.config.endpoint, "Calling moderation endpoint");

        let response = request
            .send()
            .await
            .map_err(|e| PhotoGuardError::detection(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|e| PhotoGuardError::detection(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            // Body may carry provider internals, keep it out of the error text
            warn!(status = %status, body_len = raw.len(), "Moderation endpoint returned an error");
            return Err(PhotoGuardError::detection(format!(
                "Moderation endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let labels = parse_labels(&raw)?;
        debug!(object = %object, count = labels.len(), "Received moderation labels");
        Ok(labels)
    }

    fn name(&self) -> &str {
        "http"
    }
}
