//! Landmark geometry primitives.
//!
//! Every function here is total: missing or degenerate input produces a
//! defined value (usually 0), never a panic or NaN. Per-frame landmark
//! dropout is routine in live capture and must not take down the analysis
//! loop, so the fail-soft contract lives at this layer rather than at every
//! call site.

use crate::landmarks::LandmarkPoint;

/// Slope sentinel for a vertical segment (run = 0).
///
/// Downstream consumers take `atan` of slopes, and `atan(INFINITY)` is a
/// well-defined 90°, so the sentinel composes without special-casing.
pub const VERTICAL_SLOPE: f32 = f32::INFINITY;

/// 3D Euclidean distance between two landmarks.
///
/// `z` defaults to 0 when absent. Returns 0 when either point is missing or
/// carries non-finite coordinates.
pub fn distance(a: Option<&LandmarkPoint>, b: Option<&LandmarkPoint>) -> f32 {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0);
    let d = (dx * dx + dy * dy + dz * dz).sqrt();
    if d.is_finite() {
        d
    } else {
        0.0
    }
}

/// Bilateral asymmetry ratio: `1 - min(l, r) / max(l, r)`.
///
/// 0 means perfectly symmetric, values toward 1 mean one side dwarfs the
/// other. Defined as 0 when both measurements are 0 (no NaN). Negative
/// measurements are treated by magnitude.
pub fn asymmetry_ratio(l: f32, r: f32) -> f32 {
    let l = l.abs();
    let r = r.abs();
    let max = l.max(r);
    if max <= f32::EPSILON || !max.is_finite() {
        return 0.0;
    }
    1.0 - l.min(r) / max
}

/// Angle at vertex `p2` formed by `p1` and `p3`, in degrees, normalized to
/// [0, 180]. Returns 0 when any point is missing or either arm is degenerate.
pub fn angle_deg(
    p1: Option<&LandmarkPoint>,
    p2: Option<&LandmarkPoint>,
    p3: Option<&LandmarkPoint>,
) -> f32 {
    let (p1, p2, p3) = match (p1, p2, p3) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => return 0.0,
    };
    if !p1.is_finite() || !p2.is_finite() || !p3.is_finite() {
        return 0.0;
    }
    let v1 = (p1.x - p2.x, p1.y - p2.y);
    let v2 = (p3.x - p2.x, p3.y - p2.y);
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 <= f32::EPSILON || n2 <= f32::EPSILON {
        return 0.0;
    }
    // atan2 of cross/dot keeps precision near 0° and 180°, where the acos
    // form collapses to the rounding error of the cosine.
    let cross = v1.0 * v2.1 - v1.1 * v2.0;
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let deg = cross.abs().atan2(dot).to_degrees();
    deg.clamp(0.0, 180.0)
}

/// Slope of the segment `p1 -> p2` (dy/dx).
///
/// Returns [`VERTICAL_SLOPE`] when the run is 0, and 0 when either point is
/// missing or invalid.
pub fn slope(p1: Option<&LandmarkPoint>, p2: Option<&LandmarkPoint>) -> f32 {
    let (p1, p2) = match (p1, p2) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    if !p1.is_finite() || !p2.is_finite() {
        return 0.0;
    }
    let run = p2.x - p1.x;
    if run.abs() <= f32::EPSILON {
        return VERTICAL_SLOPE;
    }
    (p2.y - p1.y) / run
}

/// Scale `value` against a clinically chosen maximum into [0, 1]:
/// `min(|value| / max_value, 1)`.
///
/// Returns 0 when `max_value` is non-positive or either input is non-finite;
/// the maxima themselves are documented at each call site.
pub fn normalize(value: f32, max_value: f32) -> f32 {
    if max_value <= 0.0 || !max_value.is_finite() {
        return 0.0;
    }
    // A vertical-slope sentinel saturates rather than poisoning the scale.
    if !value.is_finite() {
        return 1.0;
    }
    (value.abs() / max_value).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkPoint;

    fn p(x: f32, y: f32) -> LandmarkPoint {
        LandmarkPoint::new(x, y)
    }

    #[test]
    fn test_distance_2d() {
        let a = p(0.0, 0.0);
        let b = p(0.3, 0.4);
        assert!((distance(Some(&a), Some(&b)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_distance_uses_z_when_present() {
        let a = LandmarkPoint::with_z(0.0, 0.0, 0.0);
        let b = LandmarkPoint::with_z(0.0, 0.0, 2.0);
        assert!((distance(Some(&a), Some(&b)) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_missing_input_is_zero() {
        let a = p(0.1, 0.2);
        assert_eq!(distance(None, Some(&a)), 0.0);
        assert_eq!(distance(Some(&a), None), 0.0);
        assert_eq!(distance(None, None), 0.0);
    }

    #[test]
    fn test_distance_non_finite_is_zero() {
        let a = p(f32::NAN, 0.2);
        let b = p(0.5, 0.5);
        assert_eq!(distance(Some(&a), Some(&b)), 0.0);
    }

    #[test]
    fn test_asymmetry_ratio_equal_sides_is_zero() {
        for v in [0.0, 0.01, 0.5, 1.0, 42.0] {
            assert_eq!(asymmetry_ratio(v, v), 0.0);
        }
    }

    #[test]
    fn test_asymmetry_ratio_both_zero_no_nan() {
        let r = asymmetry_ratio(0.0, 0.0);
        assert_eq!(r, 0.0);
        assert!(!r.is_nan());
    }

    #[test]
    fn test_asymmetry_ratio_half() {
        // One side twice the other: 1 - 1/2 = 0.5
        assert!((asymmetry_ratio(0.1, 0.2) - 0.5).abs() < 1e-6);
        assert!((asymmetry_ratio(0.2, 0.1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_asymmetry_ratio_bounded() {
        assert!(asymmetry_ratio(0.0, 1.0) <= 1.0);
        assert!(asymmetry_ratio(1e-8, 1.0) <= 1.0);
    }

    #[test]
    fn test_angle_right_angle() {
        let p1 = p(1.0, 0.0);
        let vertex = p(0.0, 0.0);
        let p3 = p(0.0, 1.0);
        assert!((angle_deg(Some(&p1), Some(&vertex), Some(&p3)) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_straight_line() {
        let p1 = p(-1.0, 0.0);
        let vertex = p(0.0, 0.0);
        let p3 = p(1.0, 0.0);
        assert!((angle_deg(Some(&p1), Some(&vertex), Some(&p3)) - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_degenerate_arm_is_zero() {
        let a = p(0.5, 0.5);
        assert_eq!(angle_deg(Some(&a), Some(&a), Some(&p(1.0, 1.0))), 0.0);
        assert_eq!(angle_deg(None, Some(&a), Some(&p(1.0, 1.0))), 0.0);
    }

    #[test]
    fn test_slope_vertical_sentinel() {
        let a = p(0.5, 0.1);
        let b = p(0.5, 0.9);
        assert_eq!(slope(Some(&a), Some(&b)), VERTICAL_SLOPE);
        // Sentinel still composes with atan.
        assert!((VERTICAL_SLOPE.atan() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_slope_basic() {
        let a = p(0.0, 0.0);
        let b = p(0.2, 0.1);
        assert!((slope(Some(&a), Some(&b)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_clamps_to_one() {
        assert_eq!(normalize(5.0, 1.0), 1.0);
        assert_eq!(normalize(-5.0, 1.0), 1.0);
    }

    #[test]
    fn test_normalize_scales() {
        assert!((normalize(0.18, 0.36) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate_max_is_zero() {
        assert_eq!(normalize(0.5, 0.0), 0.0);
        assert_eq!(normalize(0.5, -1.0), 0.0);
    }

    #[test]
    fn test_normalize_infinite_value_saturates() {
        assert_eq!(normalize(VERTICAL_SLOPE, 0.36), 1.0);
    }
}
