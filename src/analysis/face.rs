//! Facial asymmetry analysis over a dense face-mesh frame.
//!
//! Bilateral features are measured against a facial midline derived from
//! three axial landmarks (forehead top, nose tip, chin bottom) rather than
//! symmetric point-to-point, which keeps the measures stable under moderate
//! head yaw.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AnalysisError, DataQuality, MIN_VISIBILITY};
use crate::geometry::{asymmetry_ratio, distance, normalize};
use crate::landmarks::{face_index as idx, LandmarkFrame, LandmarkPoint, FACE_LANDMARK_COUNT};

// Screening thresholds for clinical indicators. These are fixed screening
// cutoffs, not diagnostic criteria.
const OVERALL_THRESHOLD: f32 = 0.15;
const EYE_THRESHOLD: f32 = 0.12;
const MOUTH_THRESHOLD: f32 = 0.10;
const EYEBROW_THRESHOLD: f32 = 0.08;

// Feature-group weights. Mouth droop and eye-region droop are the most
// screening-relevant signs, so they dominate the overall score.
const EYE_WEIGHT: f32 = 0.4;
const MOUTH_WEIGHT: f32 = 0.4;
const EYEBROW_WEIGHT: f32 = 0.2;

// Confidence deductions.
const DROPOUT_PENALTY: f32 = 5.0;
const YAW_PENALTY_MAX: f32 = 30.0;
const FACE_SIZE_PENALTY: f32 = 20.0;
// Nose offset of a quarter of the inter-ocular span counts as fully
// non-frontal.
const YAW_PROXY_MAX: f32 = 0.25;
// Usable outer-eye-corner spans in normalized image space; outside this the
// subject is too far or too close for reliable sub-ratios.
const FACE_WIDTH_MIN: f32 = 0.12;
const FACE_WIDTH_MAX: f32 = 0.60;

/// Per-feature asymmetry sub-ratios, all in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacialDetail {
    pub eye_width: f32,
    pub eye_height: f32,
    pub eyelid_gap: f32,
    pub eye_position: f32,
    pub mouth_corner: f32,
    pub upper_lip: f32,
    pub lower_lip: f32,
    pub eyebrow_length: f32,
    pub eyebrow_height: f32,
}

/// Result of one facial analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetryMetrics {
    pub eye_asymmetry: f32,
    pub mouth_asymmetry: f32,
    pub eyebrow_asymmetry: f32,
    pub overall_asymmetry: f32,
    /// [0, 100] reliability estimate; not a probability.
    pub confidence: f32,
    pub data_quality: DataQuality,
    pub clinical_indicators: Vec<String>,
    pub detailed_metrics: FacialDetail,
}

impl AsymmetryMetrics {
    /// Canonical zero-valued result for a short or missing frame.
    pub fn insufficient(got: usize) -> Self {
        Self {
            eye_asymmetry: 0.0,
            mouth_asymmetry: 0.0,
            eyebrow_asymmetry: 0.0,
            overall_asymmetry: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Insufficient,
            clinical_indicators: vec![format!(
                "Insufficient facial landmark data ({} of {} points)",
                got, FACE_LANDMARK_COUNT
            )],
            detailed_metrics: FacialDetail::default(),
        }
    }

    /// Canonical zero-valued result for a caught internal fault.
    pub fn fault(note: &str) -> Self {
        Self {
            eye_asymmetry: 0.0,
            mouth_asymmetry: 0.0,
            eyebrow_asymmetry: 0.0,
            overall_asymmetry: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Error,
            clinical_indicators: vec![format!("Facial analysis fault: {}", note)],
            detailed_metrics: FacialDetail::default(),
        }
    }

    /// Zero-valued default used before the first analyzed frame.
    pub fn empty() -> Self {
        Self {
            eye_asymmetry: 0.0,
            mouth_asymmetry: 0.0,
            eyebrow_asymmetry: 0.0,
            overall_asymmetry: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Insufficient,
            clinical_indicators: vec!["No facial data captured".to_string()],
            detailed_metrics: FacialDetail::default(),
        }
    }
}

/// Stateless facial asymmetry analyzer.
#[derive(Debug, Default)]
pub struct FacialAsymmetryAnalyzer;

impl FacialAsymmetryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one face-mesh frame. Total: every failure mode maps to a
    /// flagged zero-valued result.
    pub fn analyze(&self, frame: &LandmarkFrame) -> AsymmetryMetrics {
        match self.compute(frame) {
            Ok(metrics) => metrics,
            Err(AnalysisError::InsufficientLandmarks { need, got }) => {
                debug!("Facial frame too short: {} points (need {})", got, need);
                AsymmetryMetrics::insufficient(got)
            }
            Err(AnalysisError::Fault(note)) => {
                warn!("Facial analysis fault: {}", note);
                AsymmetryMetrics::fault(&note)
            }
        }
    }

    fn compute(&self, frame: &LandmarkFrame) -> Result<AsymmetryMetrics, AnalysisError> {
        if frame.len() < FACE_LANDMARK_COUNT {
            return Err(AnalysisError::InsufficientLandmarks {
                need: FACE_LANDMARK_COUNT,
                got: frame.len(),
            });
        }

        let midline_x = Self::midline_x(frame)?;

        // Eye group: width, height, lid gap, distance from midline.
        let eye_width = asymmetry_ratio(
            distance(frame.get(idx::LEFT_EYE_OUTER), frame.get(idx::LEFT_EYE_INNER)),
            distance(frame.get(idx::RIGHT_EYE_OUTER), frame.get(idx::RIGHT_EYE_INNER)),
        );
        let eye_height = asymmetry_ratio(
            distance(frame.get(idx::LEFT_EYE_TOP), frame.get(idx::LEFT_EYE_BOTTOM)),
            distance(frame.get(idx::RIGHT_EYE_TOP), frame.get(idx::RIGHT_EYE_BOTTOM)),
        );
        let eyelid_gap = asymmetry_ratio(
            distance(frame.get(idx::LEFT_LID_UPPER), frame.get(idx::LEFT_LID_LOWER)),
            distance(frame.get(idx::RIGHT_LID_UPPER), frame.get(idx::RIGHT_LID_LOWER)),
        );
        let eye_position = asymmetry_ratio(
            Self::eye_center_offset(
                frame.get(idx::LEFT_EYE_OUTER),
                frame.get(idx::LEFT_EYE_INNER),
                midline_x,
            ),
            Self::eye_center_offset(
                frame.get(idx::RIGHT_EYE_OUTER),
                frame.get(idx::RIGHT_EYE_INNER),
                midline_x,
            ),
        );
        let eye_asymmetry = (eye_width + eye_height + eyelid_gap + eye_position) / 4.0;

        // Mouth group: corner offset from midline, lip spans to each corner.
        let mouth_corner = asymmetry_ratio(
            Self::midline_offset(frame.get(idx::MOUTH_LEFT), midline_x),
            Self::midline_offset(frame.get(idx::MOUTH_RIGHT), midline_x),
        );
        let upper_lip = asymmetry_ratio(
            distance(frame.get(idx::UPPER_LIP_CENTER), frame.get(idx::MOUTH_LEFT)),
            distance(frame.get(idx::UPPER_LIP_CENTER), frame.get(idx::MOUTH_RIGHT)),
        );
        let lower_lip = asymmetry_ratio(
            distance(frame.get(idx::LOWER_LIP_CENTER), frame.get(idx::MOUTH_LEFT)),
            distance(frame.get(idx::LOWER_LIP_CENTER), frame.get(idx::MOUTH_RIGHT)),
        );
        let mouth_asymmetry = (mouth_corner + upper_lip + lower_lip) / 3.0;

        // Eyebrow group: brow length and brow-to-eye height.
        let eyebrow_length = asymmetry_ratio(
            distance(frame.get(idx::LEFT_BROW_OUTER), frame.get(idx::LEFT_BROW_INNER)),
            distance(frame.get(idx::RIGHT_BROW_OUTER), frame.get(idx::RIGHT_BROW_INNER)),
        );
        let eyebrow_height = asymmetry_ratio(
            distance(frame.get(idx::LEFT_BROW_PEAK), frame.get(idx::LEFT_EYE_TOP)),
            distance(frame.get(idx::RIGHT_BROW_PEAK), frame.get(idx::RIGHT_EYE_TOP)),
        );
        let eyebrow_asymmetry = (eyebrow_length + eyebrow_height) / 2.0;

        let overall_asymmetry = EYE_WEIGHT * eye_asymmetry
            + MOUTH_WEIGHT * mouth_asymmetry
            + EYEBROW_WEIGHT * eyebrow_asymmetry;

        if !overall_asymmetry.is_finite() {
            return Err(AnalysisError::Fault(
                "non-finite asymmetry score".to_string(),
            ));
        }

        let confidence = Self::confidence(frame);
        let data_quality = DataQuality::from_confidence(confidence);

        let mut clinical_indicators = Vec::new();
        if overall_asymmetry > OVERALL_THRESHOLD {
            clinical_indicators
                .push("Overall facial asymmetry above screening threshold".to_string());
        }
        if eye_asymmetry > EYE_THRESHOLD {
            clinical_indicators.push("Eye asymmetry above screening threshold".to_string());
        }
        if mouth_asymmetry > MOUTH_THRESHOLD {
            clinical_indicators.push("Mouth asymmetry above screening threshold".to_string());
        }
        if eyebrow_asymmetry > EYEBROW_THRESHOLD {
            clinical_indicators.push("Eyebrow asymmetry above screening threshold".to_string());
        }

        Ok(AsymmetryMetrics {
            eye_asymmetry,
            mouth_asymmetry,
            eyebrow_asymmetry,
            overall_asymmetry,
            confidence,
            data_quality,
            clinical_indicators,
            detailed_metrics: FacialDetail {
                eye_width,
                eye_height,
                eyelid_gap,
                eye_position,
                mouth_corner,
                upper_lip,
                lower_lip,
                eyebrow_length,
                eyebrow_height,
            },
        })
    }

    /// Midline x from the mean of the usable axial landmarks.
    fn midline_x(frame: &LandmarkFrame) -> Result<f32, AnalysisError> {
        let axial = [idx::FOREHEAD_TOP, idx::NOSE_TIP, idx::CHIN_BOTTOM];
        let xs: Vec<f32> = axial
            .iter()
            .filter_map(|&i| frame.get(i))
            .filter(|p| p.is_finite())
            .map(|p| p.x)
            .collect();
        if xs.is_empty() {
            return Err(AnalysisError::Fault("axial midline landmarks missing".to_string()));
        }
        Ok(xs.iter().sum::<f32>() / xs.len() as f32)
    }

    /// Horizontal offset of a landmark from the facial midline; 0 if missing.
    fn midline_offset(p: Option<&LandmarkPoint>, midline_x: f32) -> f32 {
        match p {
            Some(p) if p.is_finite() => (p.x - midline_x).abs(),
            _ => 0.0,
        }
    }

    /// Horizontal offset of an eye center (corner midpoint) from the midline.
    fn eye_center_offset(
        outer: Option<&LandmarkPoint>,
        inner: Option<&LandmarkPoint>,
        midline_x: f32,
    ) -> f32 {
        match (outer, inner) {
            (Some(o), Some(i)) if o.is_finite() && i.is_finite() => {
                ((o.x + i.x) / 2.0 - midline_x).abs()
            }
            _ => 0.0,
        }
    }

    /// Confidence starts at 100 and is deducted for key-landmark dropout, a
    /// non-frontal face, and an out-of-range face size.
    fn confidence(frame: &LandmarkFrame) -> f32 {
        let mut confidence = 100.0;

        let dropped = idx::KEY_LANDMARKS
            .iter()
            .filter(|&&i| !frame.get(i).is_some_and(|p| p.is_usable(MIN_VISIBILITY)))
            .count();
        confidence -= dropped as f32 * DROPOUT_PENALTY;

        let face_width = distance(
            frame.get(idx::LEFT_EYE_OUTER),
            frame.get(idx::RIGHT_EYE_OUTER),
        );
        if face_width > f32::EPSILON {
            if let (Some(nose), Some(lo), Some(ro)) = (
                frame.get(idx::NOSE_TIP),
                frame.get(idx::LEFT_EYE_OUTER),
                frame.get(idx::RIGHT_EYE_OUTER),
            ) {
                if nose.is_finite() && lo.is_finite() && ro.is_finite() {
                    let eye_mid_x = (lo.x + ro.x) / 2.0;
                    let yaw_proxy = (nose.x - eye_mid_x).abs() / face_width;
                    confidence -= normalize(yaw_proxy, YAW_PROXY_MAX) * YAW_PENALTY_MAX;
                }
            }
            if !(FACE_WIDTH_MIN..=FACE_WIDTH_MAX).contains(&face_width) {
                confidence -= FACE_SIZE_PENALTY;
            }
        } else {
            // No measurable eye span at all: treat as both non-frontal and
            // out of range.
            confidence -= YAW_PENALTY_MAX + FACE_SIZE_PENALTY;
        }

        confidence.clamp(0.0, 100.0)
    }
}
