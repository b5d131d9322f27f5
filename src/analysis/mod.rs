//! Per-frame landmark analyzers.
//!
//! Both analyzers share the same boundary contract: `analyze` always returns
//! a fully populated metrics value. A frame that is too short yields the
//! canonical "insufficient" result; an internal fault yields a zero-valued
//! "error" result with a single diagnostic indicator. Nothing propagates;
//! the next frame is the retry.

pub mod face;
pub mod posture;

pub use face::{AsymmetryMetrics, FacialAsymmetryAnalyzer};
pub use posture::{PostureAnalyzer, PostureMetrics};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum detector visibility for a landmark to count as present.
pub(crate) const MIN_VISIBILITY: f32 = 0.5;

/// Internal analyzer failures, caught at the `analyze` boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("landmark frame too short: {got} points (need {need})")]
    InsufficientLandmarks { need: usize, got: usize },

    #[error("analysis fault: {0}")]
    Fault(String),
}

/// Reliability grade for a metrics value, bucketed from confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// Frame was too short or missing; all ratios are zero.
    Insufficient,
    /// An internal fault was caught; all ratios are zero.
    Error,
}

impl DataQuality {
    /// Bucket a [0, 100] confidence score.
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 80.0 {
            Self::Excellent
        } else if confidence > 60.0 {
            Self::Good
        } else if confidence > 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Insufficient => "insufficient",
            Self::Error => "error",
        }
    }

    /// Whether metrics with this grade carry measured (non-placeholder) values.
    pub fn is_measured(&self) -> bool {
        !matches!(self, Self::Insufficient | Self::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_buckets() {
        assert_eq!(DataQuality::from_confidence(100.0), DataQuality::Excellent);
        assert_eq!(DataQuality::from_confidence(80.0), DataQuality::Good);
        assert_eq!(DataQuality::from_confidence(61.0), DataQuality::Good);
        assert_eq!(DataQuality::from_confidence(60.0), DataQuality::Fair);
        assert_eq!(DataQuality::from_confidence(40.0), DataQuality::Poor);
        assert_eq!(DataQuality::from_confidence(0.0), DataQuality::Poor);
    }

    #[test]
    fn test_quality_measured_flag() {
        assert!(DataQuality::Excellent.is_measured());
        assert!(DataQuality::Poor.is_measured());
        assert!(!DataQuality::Insufficient.is_measured());
        assert!(!DataQuality::Error.is_measured());
    }
}
