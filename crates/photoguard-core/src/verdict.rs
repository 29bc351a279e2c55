//! Classification outcomes and pipeline results

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PhotoGuardError};
use crate::label::Label;

/// Risk tier assigned to a photo
///
/// Variants are declared in severity order so the derived `Ord` gives
/// `Safe < Warn < Unsafe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Nothing or only low-confidence findings
    Safe,
    /// Medium-confidence findings, caller should review
    Warn,
    /// High-confidence findings, upload must be rejected
    Unsafe,
}

impl Tier {
    /// Get risk level (0 = safe, 2 = most severe)
    pub fn severity(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Warn => 1,
            Self::Unsafe => 2,
        }
    }

    /// Whether an upload with this tier may be accepted
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, Self::Unsafe)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Warn => write!(f, "warn"),
            Self::Unsafe => write!(f, "unsafe"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "safe" => Ok(Self::Safe),
            "warn" => Ok(Self::Warn),
            "unsafe" => Ok(Self::Unsafe),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// Classification outcome for one photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub tier: Tier,
    /// Labels that justified the tier, in detector order
    pub driver_labels: Vec<Label>,
    /// Human-readable explanation
    pub message: String,
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Request parsing, before the pipeline starts
    Request,
    Auth,
    Storage,
    Detection,
    Classification,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Auth => write!(f, "auth"),
            Self::Storage => write!(f, "storage"),
            Self::Detection => write!(f, "detection"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

/// A failed pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    /// Stage that failed or was in flight when the deadline hit
    pub stage: Stage,
    pub kind: ErrorKind,
    /// User-safe description
    pub message: String,
}

impl From<&PhotoGuardError> for StageFailure {
    fn from(err: &PhotoGuardError) -> Self {
        Self {
            stage: err.stage(),
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

impl From<PhotoGuardError> for StageFailure {
    fn from(err: PhotoGuardError) -> Self {
        Self::from(&err)
    }
}

/// Outcome of one request: a verdict or a stage failure
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Classified(Verdict),
    Failed(StageFailure),
}

impl PipelineResult {
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Classified(_))
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Classified(verdict) => Some(verdict),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            Self::Classified(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

impl From<Verdict> for PipelineResult {
    fn from(verdict: Verdict) -> Self {
        Self::Classified(verdict)
    }
}

impl From<PhotoGuardError> for PipelineResult {
    fn from(err: PhotoGuardError) -> Self {
        Self::Failed(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_follows_severity() {
        assert!(Tier::Unsafe > Tier::Warn);
        assert!(Tier::Warn > Tier::Safe);
        assert_eq!(
            [Tier::Warn, Tier::Unsafe, Tier::Safe].iter().max(),
            Some(&Tier::Unsafe)
        );
    }

    #[test]
    fn test_tier_severity_and_acceptance() {
        assert_eq!(Tier::Safe.severity(), 0);
        assert_eq!(Tier::Warn.severity(), 1);
        assert_eq!(Tier::Unsafe.severity(), 2);

        assert!(Tier::Safe.is_acceptable());
        assert!(Tier::Warn.is_acceptable());
        assert!(!Tier::Unsafe.is_acceptable());
    }

    #[test]
    fn test_tier_parse_and_display() {
        assert_eq!("UNSAFE".parse::<Tier>().unwrap(), Tier::Unsafe);
        assert_eq!(Tier::Warn.to_string(), "warn");
        assert!("maybe".parse::<Tier>().is_err());
    }

    #[test]
    fn test_failure_from_error() {
        let result: PipelineResult = PhotoGuardError::detection("503 from provider").into();
        assert!(!result.is_classified());
        assert!(result.verdict().is_none());
        let failure = result.failure().unwrap();

        assert_eq!(failure.stage, Stage::Detection);
        assert_eq!(failure.kind, ErrorKind::Detection);
        assert!(!failure.message.contains("503"));
    }

    #[test]
    fn test_classified_result() {
        let verdict = Verdict {
            tier: Tier::Safe,
            driver_labels: vec![],
            message: "ok".to_string(),
        };
        let result = PipelineResult::from(verdict.clone());

        assert!(result.is_classified());
        assert_eq!(result.verdict(), Some(&verdict));
        assert!(result.failure().is_none());
    }
}
