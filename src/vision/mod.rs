//! Face-distance input side of the pipeline.
//!
//! Camera access and face detection live in an external helper process; this
//! module converts its per-frame face widths into centimeter distances using
//! the pinhole approximation and hands the gate the closest face per frame.

mod detector;
mod distance_log;

pub use detector::{DetectorProcess, FramePayload};
pub use distance_log::DistanceLog;

use anyhow::Result;
use std::time::Instant;

/// Width of an average adult face in centimeters, used by the pinhole model.
pub const DEFAULT_FACE_WIDTH_CM: f32 = 14.3;

/// Focal length in pixels for a 640x480 webcam frame. Recalibrate with
/// [`DistanceEstimator::calibrated_focal_length_px`] if distances look off.
pub const DEFAULT_FOCAL_LENGTH_PX: f32 = 615.0;

/// Pinhole-model distance estimator: `distance = width_cm * focal / width_px`.
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    pub known_face_width_cm: f32,
    pub focal_length_px: f32,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self {
            known_face_width_cm: DEFAULT_FACE_WIDTH_CM,
            focal_length_px: DEFAULT_FOCAL_LENGTH_PX,
        }
    }
}

impl DistanceEstimator {
    pub fn new(known_face_width_cm: f32, focal_length_px: f32) -> Self {
        Self {
            known_face_width_cm,
            focal_length_px,
        }
    }

    /// Distance in centimeters for a detected face width in pixels.
    /// Non-positive widths carry no usable signal and yield `None`.
    pub fn distance_cm(&self, face_width_px: f32) -> Option<f32> {
        if face_width_px <= 0.0 {
            return None;
        }
        Some(self.known_face_width_cm * self.focal_length_px / face_width_px)
    }

    /// Derive a focal length from a measurement session: place a face at a
    /// known distance and record the detected pixel width.
    pub fn calibrated_focal_length_px(
        observed_width_px: f32,
        known_distance_cm: f32,
        face_width_cm: f32,
    ) -> Option<f32> {
        if observed_width_px <= 0.0 || known_distance_cm <= 0.0 || face_width_cm <= 0.0 {
            return None;
        }
        Some(observed_width_px * known_distance_cm / face_width_cm)
    }
}

/// All face distances detected in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub at: Instant,
    pub distances_cm: Vec<f32>,
}

impl FrameSample {
    pub fn new(at: Instant, distances_cm: Vec<f32>) -> Self {
        Self { at, distances_cm }
    }

    /// The closest detected face governs activation intent.
    pub fn min_distance_cm(&self) -> Option<f32> {
        self.distances_cm
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(None, |min, d| match min {
                Some(current) if current <= d => Some(current),
                _ => Some(d),
            })
    }
}

/// Per-frame producer of face distances.
///
/// `Ok(None)` means the stream ended (camera closed, detector exited);
/// errors are transient frame failures the loop may skip.
pub trait DistanceSource {
    fn next_frame(&mut self) -> Result<Option<FrameSample>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_matches_pinhole_formula() {
        let estimator = DistanceEstimator::default();
        // 14.3 * 615 / 176 ≈ 49.97 cm, i.e. a face filling 176 px sits at
        // roughly the default activation threshold.
        let d = estimator.distance_cm(176.0).unwrap();
        assert!((d - 49.97).abs() < 0.05, "got {d}");
    }

    #[test]
    fn estimator_rejects_degenerate_widths() {
        let estimator = DistanceEstimator::default();
        assert_eq!(estimator.distance_cm(0.0), None);
        assert_eq!(estimator.distance_cm(-10.0), None);
    }

    #[test]
    fn wider_faces_are_closer() {
        let estimator = DistanceEstimator::default();
        let near = estimator.distance_cm(300.0).unwrap();
        let far = estimator.distance_cm(100.0).unwrap();
        assert!(near < far);
    }

    #[test]
    fn calibration_round_trips_through_the_estimator() {
        let focal =
            DistanceEstimator::calibrated_focal_length_px(176.0, 50.0, DEFAULT_FACE_WIDTH_CM)
                .unwrap();
        let estimator = DistanceEstimator::new(DEFAULT_FACE_WIDTH_CM, focal);
        let d = estimator.distance_cm(176.0).unwrap();
        assert!((d - 50.0).abs() < 1e-3);
    }

    #[test]
    fn calibration_rejects_degenerate_inputs() {
        assert_eq!(
            DistanceEstimator::calibrated_focal_length_px(0.0, 50.0, 14.3),
            None
        );
        assert_eq!(
            DistanceEstimator::calibrated_focal_length_px(176.0, 0.0, 14.3),
            None
        );
    }

    #[test]
    fn min_distance_picks_the_closest_face() {
        let frame = FrameSample::new(Instant::now(), vec![80.0, 35.5, 120.0]);
        assert_eq!(frame.min_distance_cm(), Some(35.5));
    }

    #[test]
    fn min_distance_is_none_for_empty_frames() {
        let frame = FrameSample::new(Instant::now(), Vec::new());
        assert_eq!(frame.min_distance_cm(), None);
    }

    #[test]
    fn min_distance_ignores_non_finite_values() {
        let frame = FrameSample::new(Instant::now(), vec![f32::INFINITY, f32::NAN, 42.0]);
        assert_eq!(frame.min_distance_cm(), Some(42.0));
    }
}
