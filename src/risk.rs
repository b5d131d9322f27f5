//! Multimodal risk aggregation.
//!
//! Pure classification over the three modality results. Each modality is
//! graded independently against its own cutoffs, then combined with the
//! conservative single-high rule: one high modality is enough to grade the
//! whole screening high.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::face::AsymmetryMetrics;
use crate::analysis::posture::PostureMetrics;
use crate::speech::SpeechMetrics;

// Facial cutoffs on overall asymmetry.
const FACIAL_HIGH: f32 = 0.15;
const FACIAL_MEDIUM: f32 = 0.10;
const FACIAL_ELEVATED: f32 = 0.05;

// Posture cutoffs.
const POSTURE_SHOULDER_HIGH: f32 = 0.12;
const POSTURE_SHOULDER_MEDIUM: f32 = 0.08;
const POSTURE_STABILITY_MEDIUM: f32 = 0.6;
const POSTURE_AXIS_ELEVATED: f32 = 0.05;

/// Screening risk grade, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Low
    }
}

/// Combined screening outcome across all modalities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub overall_risk: RiskLevel,
    /// Per-modality indicators in fixed order (facial, postural, speech);
    /// cross-modal repetition is retained because it is itself signal.
    pub findings: Vec<String>,
}

/// One modality's independent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModalityGrade {
    level: RiskLevel,
    elevated: bool,
}

fn grade_facial(metrics: &AsymmetryMetrics) -> ModalityGrade {
    let overall = metrics.overall_asymmetry;
    let level = if overall > FACIAL_HIGH {
        RiskLevel::High
    } else if overall > FACIAL_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    ModalityGrade {
        level,
        elevated: overall > FACIAL_ELEVATED,
    }
}

fn grade_posture(metrics: &PostureMetrics) -> ModalityGrade {
    let level = if metrics.shoulder_imbalance > POSTURE_SHOULDER_HIGH {
        RiskLevel::High
    } else if metrics.shoulder_imbalance > POSTURE_SHOULDER_MEDIUM
        || (metrics.data_quality.is_measured()
            && metrics.postural_stability < POSTURE_STABILITY_MEDIUM)
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    let elevated = [
        metrics.shoulder_imbalance,
        metrics.head_tilt,
        metrics.body_lean,
    ]
    .iter()
    .any(|&axis| axis > POSTURE_AXIS_ELEVATED);
    ModalityGrade { level, elevated }
}

fn grade_speech(metrics: &SpeechMetrics) -> ModalityGrade {
    ModalityGrade {
        level: metrics.overall_risk,
        elevated: metrics.is_elevated(),
    }
}

/// Combine the modality results into one assessment.
///
/// Overall risk is high when any modality grades high, medium when any
/// modality grades medium or at least two show sub-threshold elevation, low
/// otherwise; monotone non-decreasing in each modality's severity. Findings
/// concatenate each modality's indicators in facial → postural → speech
/// order, duplicates retained.
pub fn aggregate(
    facial: &AsymmetryMetrics,
    posture: &PostureMetrics,
    speech: Option<&SpeechMetrics>,
) -> RiskAssessment {
    let grades = [
        Some(grade_facial(facial)),
        Some(grade_posture(posture)),
        speech.map(grade_speech),
    ];

    let worst = grades
        .iter()
        .flatten()
        .map(|g| g.level)
        .max()
        .unwrap_or(RiskLevel::Low);
    let elevated_count = grades.iter().flatten().filter(|g| g.elevated).count();

    let overall_risk = if worst >= RiskLevel::High {
        RiskLevel::High
    } else if worst >= RiskLevel::Medium || elevated_count >= 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    // Strict concatenation: diagnostic notes from unmeasured modalities ride
    // along, and cross-modal duplicates are kept.
    let mut findings = Vec::new();
    findings.extend(facial.clinical_indicators.iter().cloned());
    findings.extend(posture.clinical_indicators.iter().cloned());
    if let Some(speech) = speech {
        findings.extend(speech.clinical_indicators());
    }

    debug!(
        "Risk aggregation: overall={} ({} findings, {} elevated modalities)",
        overall_risk.as_str(),
        findings.len(),
        elevated_count
    );

    RiskAssessment {
        overall_risk,
        findings,
    }
}
