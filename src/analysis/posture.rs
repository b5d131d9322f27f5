//! Body-posture analysis over a 33-point pose frame.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AnalysisError, DataQuality, MIN_VISIBILITY};
use crate::geometry::{angle_deg, asymmetry_ratio, distance, normalize, slope};
use crate::landmarks::{pose_index as idx, LandmarkFrame, LandmarkPoint, POSE_LANDMARK_COUNT};

// Screening thresholds for clinical indicators.
const SHOULDER_THRESHOLD: f32 = 0.15;
const HEAD_TILT_THRESHOLD: f32 = 0.12;
const BODY_LEAN_THRESHOLD: f32 = 0.10;
// Two or more axes above this count as a combined deviation.
const COMBINED_AXIS_THRESHOLD: f32 = 0.08;
const STABILITY_FLOOR: f32 = 0.6;

// Clinical maxima for normalization.
// Shoulder line slope at which imbalance saturates (~20.6°).
const SHOULDER_SLOPE_MAX_RAD: f32 = 0.36;
// Shoulder height difference relative to shoulder width (tan-equivalent of
// the slope cutoff).
const SHOULDER_HEIGHT_RATIO_MAX: f32 = 0.35;
// Head deviation from vertical at which tilt saturates.
const HEAD_ANGLE_MAX_DEG: f32 = 15.0;
// Eye-line slope cutoff (~14.9°).
const EYE_SLOPE_MAX_RAD: f32 = 0.26;
// Trunk deviation from vertical at which lean saturates.
const LEAN_ANGLE_MAX_DEG: f32 = 10.0;
// Bilateral segment-length discrepancy that zeroes a coordination component.
const SEGMENT_DIFF_MAX: f32 = 0.5;

// Stability axis weights.
const STABILITY_SHOULDER_WEIGHT: f32 = 0.4;
const STABILITY_HEAD_WEIGHT: f32 = 0.3;
const STABILITY_LEAN_WEIGHT: f32 = 0.3;

// Confidence blend: key-landmark visibility dominates, frame completeness
// fills in the rest.
const KEY_VISIBILITY_WEIGHT: f32 = 0.7;
const COMPLETENESS_WEIGHT: f32 = 0.3;

/// Normalized per-axis components behind the posture scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureDetail {
    pub shoulder_slope: f32,
    pub shoulder_height: f32,
    pub head_angle: f32,
    pub eye_line: f32,
    pub trunk_lean: f32,
    pub upper_arm_diff: f32,
    pub forearm_diff: f32,
}

/// Result of one posture analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureMetrics {
    pub shoulder_imbalance: f32,
    pub head_tilt: f32,
    pub body_lean: f32,
    pub postural_stability: f32,
    pub coordination_score: f32,
    /// [0, 100] reliability estimate; not a probability.
    pub confidence: f32,
    pub data_quality: DataQuality,
    pub clinical_indicators: Vec<String>,
    pub detailed_metrics: PostureDetail,
}

impl PostureMetrics {
    /// Canonical zero-valued result for a short or missing frame.
    pub fn insufficient(got: usize) -> Self {
        Self {
            shoulder_imbalance: 0.0,
            head_tilt: 0.0,
            body_lean: 0.0,
            postural_stability: 0.0,
            coordination_score: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Insufficient,
            clinical_indicators: vec![format!(
                "Insufficient pose landmark data ({} of {} points)",
                got, POSE_LANDMARK_COUNT
            )],
            detailed_metrics: PostureDetail::default(),
        }
    }

    /// Canonical zero-valued result for a caught internal fault.
    pub fn fault(note: &str) -> Self {
        Self {
            shoulder_imbalance: 0.0,
            head_tilt: 0.0,
            body_lean: 0.0,
            postural_stability: 0.0,
            coordination_score: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Error,
            clinical_indicators: vec![format!("Posture analysis fault: {}", note)],
            detailed_metrics: PostureDetail::default(),
        }
    }

    /// Zero-valued default used before the first analyzed frame.
    pub fn empty() -> Self {
        Self {
            shoulder_imbalance: 0.0,
            head_tilt: 0.0,
            body_lean: 0.0,
            postural_stability: 0.0,
            coordination_score: 0.0,
            confidence: 0.0,
            data_quality: DataQuality::Insufficient,
            clinical_indicators: vec!["No pose data captured".to_string()],
            detailed_metrics: PostureDetail::default(),
        }
    }
}

/// Stateless posture analyzer.
#[derive(Debug, Default)]
pub struct PostureAnalyzer;

impl PostureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one pose frame. Total: every failure mode maps to a flagged
    /// zero-valued result.
    pub fn analyze(&self, frame: &LandmarkFrame) -> PostureMetrics {
        match self.compute(frame) {
            Ok(metrics) => metrics,
            Err(AnalysisError::InsufficientLandmarks { need, got }) => {
                debug!("Pose frame too short: {} points (need {})", got, need);
                PostureMetrics::insufficient(got)
            }
            Err(AnalysisError::Fault(note)) => {
                warn!("Posture analysis fault: {}", note);
                PostureMetrics::fault(&note)
            }
        }
    }

    fn compute(&self, frame: &LandmarkFrame) -> Result<PostureMetrics, AnalysisError> {
        if frame.len() < POSE_LANDMARK_COUNT {
            return Err(AnalysisError::InsufficientLandmarks {
                need: POSE_LANDMARK_COUNT,
                got: frame.len(),
            });
        }

        // Shoulder imbalance: the steeper of the shoulder-line angle and the
        // height difference relative to shoulder width.
        let shoulder_slope_rad = slope(
            frame.get(idx::LEFT_SHOULDER),
            frame.get(idx::RIGHT_SHOULDER),
        )
        .atan()
        .abs();
        let shoulder_slope = normalize(shoulder_slope_rad, SHOULDER_SLOPE_MAX_RAD);
        let shoulder_height = match (
            frame.get(idx::LEFT_SHOULDER),
            frame.get(idx::RIGHT_SHOULDER),
        ) {
            (Some(l), Some(r)) if l.is_finite() && r.is_finite() => {
                let width = (l.x - r.x).abs();
                normalize((l.y - r.y).abs() / width, SHOULDER_HEIGHT_RATIO_MAX)
            }
            _ => 0.0,
        };
        let shoulder_imbalance = shoulder_slope.max(shoulder_height);

        // Head tilt: deviation of the ear-midpoint-to-nose axis from
        // vertical, or the eye-line slope, whichever is worse.
        let head_angle = normalize(
            Self::vertical_deviation(
                Self::midpoint(frame.get(idx::LEFT_EAR), frame.get(idx::RIGHT_EAR)),
                frame.get(idx::NOSE).copied(),
            ),
            HEAD_ANGLE_MAX_DEG,
        );
        let eye_line = normalize(
            slope(frame.get(idx::LEFT_EYE), frame.get(idx::RIGHT_EYE))
                .atan()
                .abs(),
            EYE_SLOPE_MAX_RAD,
        );
        let head_tilt = head_angle.max(eye_line);

        // Body lean: deviation of the hip-midpoint-to-shoulder-midpoint axis
        // from vertical.
        let trunk_lean = normalize(
            Self::vertical_deviation(
                Self::midpoint(frame.get(idx::LEFT_HIP), frame.get(idx::RIGHT_HIP)),
                Self::midpoint(frame.get(idx::LEFT_SHOULDER), frame.get(idx::RIGHT_SHOULDER)),
            ),
            LEAN_ANGLE_MAX_DEG,
        );
        let body_lean = trunk_lean;

        // Coordination: bilateral arm segment length agreement.
        let upper_arm_diff = asymmetry_ratio(
            distance(frame.get(idx::LEFT_SHOULDER), frame.get(idx::LEFT_ELBOW)),
            distance(frame.get(idx::RIGHT_SHOULDER), frame.get(idx::RIGHT_ELBOW)),
        );
        let forearm_diff = asymmetry_ratio(
            distance(frame.get(idx::LEFT_ELBOW), frame.get(idx::LEFT_WRIST)),
            distance(frame.get(idx::RIGHT_ELBOW), frame.get(idx::RIGHT_WRIST)),
        );
        let coordination_score = (1.0
            - 0.5 * normalize(upper_arm_diff, SEGMENT_DIFF_MAX)
            - 0.5 * normalize(forearm_diff, SEGMENT_DIFF_MAX))
        .clamp(0.0, 1.0);

        let postural_stability = (1.0
            - (STABILITY_SHOULDER_WEIGHT * shoulder_imbalance
                + STABILITY_HEAD_WEIGHT * head_tilt
                + STABILITY_LEAN_WEIGHT * body_lean))
            .clamp(0.0, 1.0);

        if !postural_stability.is_finite() || !shoulder_imbalance.is_finite() {
            return Err(AnalysisError::Fault("non-finite posture score".to_string()));
        }

        let confidence = Self::confidence(frame);
        let data_quality = DataQuality::from_confidence(confidence);

        let mut clinical_indicators = Vec::new();
        if shoulder_imbalance > SHOULDER_THRESHOLD {
            clinical_indicators.push("Shoulder imbalance above screening threshold".to_string());
        }
        if head_tilt > HEAD_TILT_THRESHOLD {
            clinical_indicators.push("Head tilt above screening threshold".to_string());
        }
        if body_lean > BODY_LEAN_THRESHOLD {
            clinical_indicators.push("Body lean above screening threshold".to_string());
        }
        let elevated_axes = [shoulder_imbalance, head_tilt, body_lean]
            .iter()
            .filter(|&&axis| axis > COMBINED_AXIS_THRESHOLD)
            .count();
        if elevated_axes >= 2 {
            clinical_indicators.push("Postural deviation across multiple axes".to_string());
        }
        if postural_stability < STABILITY_FLOOR {
            clinical_indicators.push("Reduced postural stability".to_string());
        }

        Ok(PostureMetrics {
            shoulder_imbalance,
            head_tilt,
            body_lean,
            postural_stability,
            coordination_score,
            confidence,
            data_quality,
            clinical_indicators,
            detailed_metrics: PostureDetail {
                shoulder_slope,
                shoulder_height,
                head_angle,
                eye_line,
                trunk_lean,
                upper_arm_diff,
                forearm_diff,
            },
        })
    }

    fn midpoint(a: Option<&LandmarkPoint>, b: Option<&LandmarkPoint>) -> Option<LandmarkPoint> {
        match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some(LandmarkPoint::new(
                (a.x + b.x) / 2.0,
                (a.y + b.y) / 2.0,
            )),
            _ => None,
        }
    }

    /// Angle in degrees between the upward vertical through `base` and the
    /// segment `base -> target`; 0 when either point is unavailable.
    fn vertical_deviation(base: Option<LandmarkPoint>, target: Option<LandmarkPoint>) -> f32 {
        let (base, target) = match (base, target) {
            (Some(b), Some(t)) => (b, t),
            _ => return 0.0,
        };
        // Image-space y grows downward, so "up" is -y.
        let reference = LandmarkPoint::new(base.x, base.y - 0.1);
        angle_deg(Some(&reference), Some(&base), Some(&target))
    }

    fn confidence(frame: &LandmarkFrame) -> f32 {
        let key_visibility: f32 = idx::KEY_LANDMARKS
            .iter()
            .map(|&i| match frame.get(i) {
                Some(p) if p.is_finite() => p.visibility.unwrap_or(1.0).clamp(0.0, 1.0),
                _ => 0.0,
            })
            .sum::<f32>()
            / idx::KEY_LANDMARKS.len() as f32;

        let usable = frame
            .points()
            .iter()
            .filter(|p| p.is_usable(MIN_VISIBILITY))
            .count();
        let completeness = usable as f32 / POSE_LANDMARK_COUNT as f32;

        (100.0 * (KEY_VISIBILITY_WEIGHT * key_visibility + COMPLETENESS_WEIGHT * completeness))
            .clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::pose_index as idx;

    /// A squared-up subject facing the camera, arms hanging symmetrically.
    fn aligned_pose() -> Vec<LandmarkPoint> {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        points[idx::NOSE] = LandmarkPoint::new(0.5, 0.16);
        points[idx::LEFT_EYE] = LandmarkPoint::new(0.47, 0.18);
        points[idx::RIGHT_EYE] = LandmarkPoint::new(0.53, 0.18);
        points[idx::LEFT_EAR] = LandmarkPoint::new(0.44, 0.20);
        points[idx::RIGHT_EAR] = LandmarkPoint::new(0.56, 0.20);
        points[idx::LEFT_SHOULDER] = LandmarkPoint::new(0.35, 0.40);
        points[idx::RIGHT_SHOULDER] = LandmarkPoint::new(0.65, 0.40);
        points[idx::LEFT_ELBOW] = LandmarkPoint::new(0.30, 0.55);
        points[idx::RIGHT_ELBOW] = LandmarkPoint::new(0.70, 0.55);
        points[idx::LEFT_WRIST] = LandmarkPoint::new(0.28, 0.70);
        points[idx::RIGHT_WRIST] = LandmarkPoint::new(0.72, 0.70);
        points[idx::LEFT_HIP] = LandmarkPoint::new(0.42, 0.75);
        points[idx::RIGHT_HIP] = LandmarkPoint::new(0.58, 0.75);
        points
    }

    #[test]
    fn test_aligned_pose_is_neutral() {
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(aligned_pose()));
        assert!(metrics.shoulder_imbalance < 1e-5);
        assert!(metrics.head_tilt < 1e-5);
        assert!(metrics.body_lean < 1e-5);
        assert!((metrics.coordination_score - 1.0).abs() < 1e-5);
        assert!((metrics.postural_stability - 1.0).abs() < 1e-5);
        assert!(metrics.clinical_indicators.is_empty());
        assert_eq!(metrics.confidence, 100.0);
    }

    #[test]
    fn test_dropped_shoulder_scenario() {
        // Left shoulder at y=0.40, right at y=0.55, separation 0.30.
        let mut points = aligned_pose();
        points[idx::LEFT_SHOULDER] = LandmarkPoint::new(0.35, 0.40);
        points[idx::RIGHT_SHOULDER] = LandmarkPoint::new(0.65, 0.55);
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(points));

        assert!(metrics.shoulder_imbalance > 0.0);
        assert!(metrics.shoulder_imbalance > SHOULDER_THRESHOLD);
        assert!(metrics
            .clinical_indicators
            .iter()
            .any(|s| s.contains("Shoulder imbalance")));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let mut points = aligned_pose();
        points[idx::RIGHT_SHOULDER] = LandmarkPoint::new(0.65, 0.52);
        points[idx::NOSE] = LandmarkPoint::new(0.56, 0.16);
        points[idx::RIGHT_WRIST] = LandmarkPoint::new(0.72, 0.60);
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(points));

        for value in [
            metrics.shoulder_imbalance,
            metrics.head_tilt,
            metrics.body_lean,
            metrics.postural_stability,
            metrics.coordination_score,
        ] {
            assert!((0.0..=1.0).contains(&value), "score out of range: {}", value);
        }
        assert!((0.0..=100.0).contains(&metrics.confidence));
    }

    #[test]
    fn test_tilted_head_flags_indicator() {
        let mut points = aligned_pose();
        // Nose displaced sideways from the ear midline and a sloped eye line.
        points[idx::NOSE] = LandmarkPoint::new(0.56, 0.17);
        points[idx::LEFT_EYE] = LandmarkPoint::new(0.47, 0.16);
        points[idx::RIGHT_EYE] = LandmarkPoint::new(0.53, 0.21);
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(points));
        assert!(metrics.head_tilt > HEAD_TILT_THRESHOLD);
        assert!(metrics
            .clinical_indicators
            .iter()
            .any(|s| s.contains("Head tilt")));
    }

    #[test]
    fn test_uneven_arms_lower_coordination() {
        let mut points = aligned_pose();
        // Right forearm measures far shorter than the left.
        points[idx::RIGHT_WRIST] = LandmarkPoint::new(0.70, 0.58);
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(points));
        assert!(metrics.coordination_score < 1.0);
    }

    #[test]
    fn test_undersized_frame_is_insufficient() {
        let frame = LandmarkFrame::from_points(vec![LandmarkPoint::new(0.5, 0.5); 10]);
        let metrics = PostureAnalyzer::new().analyze(&frame);
        assert_eq!(metrics.data_quality, DataQuality::Insufficient);
        assert_eq!(metrics.shoulder_imbalance, 0.0);
        assert_eq!(metrics.postural_stability, 0.0);
        assert_eq!(metrics.confidence, 0.0);
        assert_eq!(metrics.clinical_indicators.len(), 1);
    }

    #[test]
    fn test_low_visibility_lowers_confidence() {
        let mut points = aligned_pose();
        points[idx::LEFT_HIP] = LandmarkPoint::with_visibility(0.42, 0.75, 0.1);
        points[idx::RIGHT_HIP] = LandmarkPoint::with_visibility(0.58, 0.75, 0.1);
        let metrics = PostureAnalyzer::new().analyze(&LandmarkFrame::from_points(points));
        assert!(metrics.confidence < 100.0);
    }
}
