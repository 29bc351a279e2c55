//! Moderation pipeline - store, detect, classify under one deadline
//!
//! State machine per request:
//!
//! ```text
//! RECEIVED -> AUTHENTICATED -> STORED -> DETECTED -> CLASSIFIED
//!     \            \             \          \
//!      +------------+-------------+----------+--> FAILED(stage)
//! ```
//!
//! Stages run strictly in sequence and are never retried. When the deadline
//! elapses the in-flight future is dropped, which aborts its network call, and
//! the run fails with a timeout naming that stage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use photoguard_core::{
    ClassificationEngine, Detector, ObjectRef, ObjectStore, PhotoGuardError, PhotoGuardResult,
    PipelineResult, Stage, Verdict, DEFAULT_CONTENT_TYPE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::auth::CredentialVerifier;

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wall-clock bound for one request, in milliseconds
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_deadline_ms() -> u64 {
    300_000 // 5 minutes
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl PipelineConfig {
    /// Build a config with a custom deadline of at least one millisecond
    pub fn with_deadline(deadline: Duration) -> PhotoGuardResult<Self> {
        let config = Self {
            deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which every request would time out
    pub fn validate(&self) -> PhotoGuardResult<()> {
        if self.deadline_ms == 0 {
            return Err(PhotoGuardError::config(
                "Pipeline deadline must be at least 1ms",
            ));
        }
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// A parsed upload ready for the pipeline
#[derive(Debug, Clone)]
pub struct PhotoSubmission {
    pub photo: Bytes,
    pub content_type: String,
    pub api_key: String,
}

impl PhotoSubmission {
    pub fn new(photo: impl Into<Bytes>, api_key: impl Into<String>) -> Self {
        Self {
            photo: photo.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Where a request is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Authenticated,
    Stored,
    Detected,
    Classified,
    Failed(Stage),
}

impl PipelineState {
    /// Stage that runs next from this state
    fn pending_stage(&self) -> Stage {
        match self {
            Self::Received => Stage::Auth,
            Self::Authenticated => Stage::Storage,
            Self::Stored => Stage::Detection,
            Self::Detected | Self::Classified => Stage::Classification,
            Self::Failed(stage) => *stage,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Classified | Self::Failed(_))
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub request_id: String,
    /// Terminal state reached
    pub state: PipelineState,
    pub result: PipelineResult,
    /// Where the photo was stored, if it got that far
    pub object: Option<ObjectRef>,
    pub elapsed: Duration,
}

/// Mutable progress of a single run
struct Progress {
    state: PipelineState,
    object: Option<ObjectRef>,
}

impl Progress {
    fn advance(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline transition");
        self.state = next;
    }
}

/// Sequences auth, storage, detection, and classification for each request
///
/// Collaborators are created once at process start and shared read-only; the
/// pipeline itself holds no per-request state, so one instance serves all
/// concurrent requests.
pub struct ModerationPipeline {
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn ObjectStore>,
    detector: Arc<dyn Detector>,
    engine: ClassificationEngine,
    config: PipelineConfig,
}

impl ModerationPipeline {
    /// Create a pipeline with the default deadline
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn Detector>,
    ) -> Self {
        Self::with_config(verifier, store, detector, PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn Detector>,
        config: PipelineConfig,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "Every request will time out under this pipeline config");
        }
        Self {
            verifier,
            store,
            detector,
            engine: ClassificationEngine::new(),
            config,
        }
    }

    /// Replace the classification engine
    pub fn with_engine(mut self, engine: ClassificationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one submission to a terminal state
    pub async fn run(&self, submission: PhotoSubmission) -> PipelineRun {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("moderation", request_id = %request_id);

        async move {
            let started = Instant::now();
            let deadline = self.config.deadline();
            let mut progress = Progress {
                state: PipelineState::Received,
                object: None,
            };

            let outcome = tokio::time::timeout(deadline, self.execute(submission, &mut progress)).await;

            let result = match outcome {
                Ok(Ok(verdict)) => {
                    info!(
                        tier = %verdict.tier,
                        drivers = verdict.driver_labels.len(),
                        "Photo classified"
                    );
                    PipelineResult::Classified(verdict)
                }
                Ok(Err(err)) => {
                    warn!(stage = %err.stage(), error = %err, "Pipeline stage failed");
                    progress.advance(PipelineState::Failed(err.stage()));
                    err.into()
                }
                Err(_) => {
                    let stage = progress.state.pending_stage();
                    let err = PhotoGuardError::Timeout {
                        stage,
                        deadline_ms: self.config.deadline_ms,
                    };
                    warn!(stage = %stage, "Pipeline deadline exceeded");
                    progress.advance(PipelineState::Failed(stage));
                    err.into()
                }
            };

            PipelineRun {
                request_id,
                state: progress.state,
                result,
                object: progress.object,
                elapsed: started.elapsed(),
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        submission: PhotoSubmission,
        progress: &mut Progress,
    ) -> PhotoGuardResult<Verdict> {
        if !self.verifier.verify(&submission.api_key) {
            return Err(PhotoGuardError::auth("API key rejected"));
        }
        progress.advance(PipelineState::Authenticated);

        let object = self
            .store
            .put(submission.photo, &submission.content_type)
            .await
            .map_err(|e| as_stage_error(Stage::Storage, e))?;
        debug!(object = %object, backend = self.store.backend_name(), "Photo stored");
        progress.object = Some(object.clone());
        progress.advance(PipelineState::Stored);

        let labels = self
            .detector
            .detect(&object)
            .await
            .map_err(|e| as_stage_error(Stage::Detection, e))?;
        debug!(count = labels.len(), detector = self.detector.name(), "Labels detected");
        progress.advance(PipelineState::Detected);

        let verdict = self.engine.classify(&labels);
        progress.advance(PipelineState::Classified);
        Ok(verdict)
    }
}

/// Pin a collaborator error to the stage that produced it
fn as_stage_error(stage: Stage, err: PhotoGuardError) -> PhotoGuardError {
    match (stage, err) {
        (Stage::Storage, err @ PhotoGuardError::Storage(_)) => err,
        (Stage::Detection, err @ PhotoGuardError::Detection(_)) => err,
        (Stage::Storage, other) => PhotoGuardError::storage(other.to_string()),
        (_, other) => PhotoGuardError::detection(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_stage_per_state() {
        assert_eq!(PipelineState::Received.pending_stage(), Stage::Auth);
        assert_eq!(PipelineState::Authenticated.pending_stage(), Stage::Storage);
        assert_eq!(PipelineState::Stored.pending_stage(), Stage::Detection);
        assert_eq!(PipelineState::Detected.pending_stage(), Stage::Classification);
        assert!(PipelineState::Failed(Stage::Auth).is_terminal());
        assert!(!PipelineState::Stored.is_terminal());
    }

    #[test]
    fn test_collaborator_errors_pinned_to_stage() {
        let err = as_stage_error(Stage::Storage, PhotoGuardError::config("bad bucket"));
        assert!(matches!(err, PhotoGuardError::Storage(_)));

        let err = as_stage_error(Stage::Detection, PhotoGuardError::storage("odd"));
        assert!(matches!(err, PhotoGuardError::Detection(_)));
    }

    #[test]
    fn test_deadline_config() {
        assert_eq!(PipelineConfig::default().deadline(), Duration::from_secs(300));
        assert_eq!(
            PipelineConfig::with_deadline(Duration::from_secs(5)).unwrap().deadline(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_sub_second_deadline_keeps_precision() {
        let config = PipelineConfig::with_deadline(Duration::from_millis(500)).unwrap();
        assert_eq!(config.deadline(), Duration::from_millis(500));

        let config = PipelineConfig::with_deadline(Duration::from_millis(1500)).unwrap();
        assert_eq!(config.deadline_ms, 1500);
    }

    #[test]
    fn test_zero_deadline_rejected() {
        assert!(matches!(
            PipelineConfig::with_deadline(Duration::ZERO),
            Err(PhotoGuardError::Config(_))
        ));
        assert!(PipelineConfig::with_deadline(Duration::from_micros(900)).is_err());

        let config: PipelineConfig = serde_json::from_str(r#"{"deadline_ms": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
