//! Persistence handoff.
//!
//! The core stores nothing: on request it packages the session's current
//! results into a self-contained value that an external save operation can
//! serialize wherever it likes.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::face::AsymmetryMetrics;
use crate::analysis::posture::PostureMetrics;
use crate::risk::RiskAssessment;
use crate::session::AssessmentPhase;
use crate::speech::SpeechMetrics;

/// One screening session's results at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSnapshot {
    pub session_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub asymmetry: AsymmetryMetrics,
    pub posture: PostureMetrics,
    pub speech: Option<SpeechMetrics>,
    pub risk: RiskAssessment,
    pub completed_phases: Vec<String>,
}

impl AssessmentSnapshot {
    pub fn capture(
        session_id: Uuid,
        asymmetry: AsymmetryMetrics,
        posture: PostureMetrics,
        speech: Option<SpeechMetrics>,
        risk: RiskAssessment,
        completed: &BTreeSet<AssessmentPhase>,
    ) -> Self {
        Self {
            session_id,
            captured_at: Utc::now(),
            asymmetry,
            posture,
            speech,
            risk,
            completed_phases: completed.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }

    /// Human-readable one-paragraph summary for logs and previews.
    pub fn summary(&self) -> String {
        let findings = if self.risk.findings.is_empty() {
            "no findings".to_string()
        } else {
            self.risk.findings.join("; ")
        };
        format!(
            "Screening {} at {}: overall risk {} ({})",
            self.session_id,
            self.captured_at.to_rfc3339(),
            self.risk.overall_risk.as_str(),
            findings
        )
    }
}
