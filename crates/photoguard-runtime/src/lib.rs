//! PhotoGuard Runtime - Moderation pipeline orchestration
//!
//! Sequences one request through
//! `RECEIVED -> AUTHENTICATED -> STORED -> DETECTED -> CLASSIFIED` under a
//! single deadline. Collaborators are injected once at startup and shared
//! read-only across requests.

pub mod auth;
pub mod pipeline;

pub use auth::{hash_api_key, CredentialVerifier, Sha256KeyVerifier};
pub use pipeline::{ModerationPipeline, PhotoSubmission, PipelineConfig, PipelineRun, PipelineState};
