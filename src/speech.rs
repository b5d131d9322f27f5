//! Speech analysis input.
//!
//! Speech metrics are produced by an external analysis collaborator once per
//! completed speech phase. This core treats them as read-only: it derives
//! finding strings from them for the aggregator but never recomputes or
//! adjusts the scores.

use serde::{Deserialize, Serialize};

use crate::risk::RiskLevel;

// Screening thresholds for the derived indicators.
const SLURRED_THRESHOLD: f32 = 0.3;
const WORD_FINDING_THRESHOLD: f32 = 0.3;
const COHERENCE_FLOOR: f32 = 0.6;

/// Externally produced speech screening result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechMetrics {
    /// [0, 1]; higher is more coherent.
    pub coherence_score: f32,
    /// [0, 1]; higher means more slurring detected.
    pub slurred_speech_score: f32,
    /// [0, 1]; higher means more word-finding difficulty.
    pub word_finding_score: f32,
    pub overall_risk: RiskLevel,
}

impl SpeechMetrics {
    /// Clinical indicator strings for this result, in a fixed order.
    ///
    /// The external analyzer supplies only scores, so the flags are derived
    /// here with the same fixed-cutoff style as the visual analyzers.
    pub fn clinical_indicators(&self) -> Vec<String> {
        let mut indicators = Vec::new();
        match self.overall_risk {
            RiskLevel::High => {
                indicators.push("Speech analysis indicates high risk".to_string());
            }
            RiskLevel::Medium => {
                indicators.push("Speech analysis indicates elevated risk".to_string());
            }
            RiskLevel::Low => {}
        }
        if self.slurred_speech_score > SLURRED_THRESHOLD {
            indicators.push("Slurred speech indicators present".to_string());
        }
        if self.word_finding_score > WORD_FINDING_THRESHOLD {
            indicators.push("Word-finding difficulty indicators present".to_string());
        }
        if self.coherence_score < COHERENCE_FLOOR {
            indicators.push("Reduced speech coherence".to_string());
        }
        indicators
    }

    /// Whether the result shows sub-threshold elevation on any axis.
    pub fn is_elevated(&self) -> bool {
        self.overall_risk > RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(coherence: f32, slurred: f32, word_finding: f32, risk: RiskLevel) -> SpeechMetrics {
        SpeechMetrics {
            coherence_score: coherence,
            slurred_speech_score: slurred,
            word_finding_score: word_finding,
            overall_risk: risk,
        }
    }

    #[test]
    fn test_clear_speech_has_no_indicators() {
        let metrics = speech(0.95, 0.05, 0.05, RiskLevel::Low);
        assert!(metrics.clinical_indicators().is_empty());
        assert!(!metrics.is_elevated());
    }

    #[test]
    fn test_slurred_speech_flags() {
        let metrics = speech(0.8, 0.5, 0.1, RiskLevel::Medium);
        let indicators = metrics.clinical_indicators();
        assert!(indicators.iter().any(|s| s.contains("Slurred speech")));
        assert!(indicators.iter().any(|s| s.contains("elevated risk")));
        assert!(metrics.is_elevated());
    }

    #[test]
    fn test_high_risk_leads_ordering() {
        let metrics = speech(0.3, 0.6, 0.6, RiskLevel::High);
        let indicators = metrics.clinical_indicators();
        assert_eq!(indicators[0], "Speech analysis indicates high risk");
        assert_eq!(indicators.len(), 4);
    }
}
