/// Activation threshold matching a conversational distance from a webcam.
pub const DEFAULT_DISTANCE_THRESHOLD_CM: f32 = 50.0;

/// Minimum dwell between microphone state changes.
pub const DEFAULT_DEBOUNCE_SECONDS: f64 = 1.0;

/// Width of an average adult face.
pub const DEFAULT_KNOWN_FACE_WIDTH_CM: f32 = crate::vision::DEFAULT_FACE_WIDTH_CM;

/// Focal length in pixels for a 640x480 webcam frame.
pub const DEFAULT_FOCAL_LENGTH_PX: f32 = crate::vision::DEFAULT_FOCAL_LENGTH_PX;

/// Helper script that owns the camera and Haar-cascade detection.
pub const DEFAULT_DETECTOR_CMD: &str = "python3 scripts/face_detector.py";

pub const DEFAULT_ACTIVITY_THRESHOLD_DB: f32 = -40.0;

pub const DEFAULT_AMBIENT_WINDOW_MS: u64 = 1_000;

pub const DEFAULT_DISTANCE_LOG: &str = "face_distances.csv";

/// Capacity of the callback-to-worker mic level channel.
pub const DEFAULT_LEVEL_CHANNEL_CAPACITY: usize = 64;

pub(super) const MIN_DISTANCE_THRESHOLD_CM: f32 = 1.0;
pub(super) const MAX_DISTANCE_THRESHOLD_CM: f32 = 1_000.0;
pub(super) const MAX_DEBOUNCE_SECONDS: f64 = 60.0;
pub(super) const MIN_FACE_WIDTH_CM: f32 = 5.0;
pub(super) const MAX_FACE_WIDTH_CM: f32 = 50.0;
pub(super) const MIN_FOCAL_LENGTH_PX: f32 = 50.0;
pub(super) const MAX_FOCAL_LENGTH_PX: f32 = 10_000.0;
pub(super) const MIN_AMBIENT_WINDOW_MS: u64 = 100;
pub(super) const MAX_AMBIENT_WINDOW_MS: u64 = 10_000;
pub(super) const MAX_DETECTOR_CMD_BYTES: usize = 1_024;
