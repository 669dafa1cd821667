//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::gate::GateConfig;
use crate::mic::ListenerConfig;
use crate::vision::DistanceEstimator;
pub use defaults::{
    DEFAULT_ACTIVITY_THRESHOLD_DB, DEFAULT_AMBIENT_WINDOW_MS, DEFAULT_DEBOUNCE_SECONDS,
    DEFAULT_DETECTOR_CMD, DEFAULT_DISTANCE_LOG, DEFAULT_DISTANCE_THRESHOLD_CM,
    DEFAULT_FOCAL_LENGTH_PX, DEFAULT_KNOWN_FACE_WIDTH_CM, DEFAULT_LEVEL_CHANNEL_CAPACITY,
};

/// CLI options for the proximity microphone controller. Validated values
/// keep the gate and the detector subprocess well-behaved.
#[derive(Debug, Parser, Clone)]
#[command(about = "Face-proximity microphone gate", author, version)]
pub struct AppConfig {
    /// Faces closer than this distance activate the microphone (cm)
    #[arg(long = "distance-threshold-cm", default_value_t = DEFAULT_DISTANCE_THRESHOLD_CM)]
    pub distance_threshold_cm: f32,

    /// Minimum time between microphone state changes (seconds)
    #[arg(long = "debounce-seconds", default_value_t = DEFAULT_DEBOUNCE_SECONDS)]
    pub debounce_seconds: f64,

    /// Physical face width assumed by the distance model (cm)
    #[arg(long = "known-face-width-cm", default_value_t = DEFAULT_KNOWN_FACE_WIDTH_CM)]
    pub known_face_width_cm: f32,

    /// Camera focal length in pixels (recalibrate per webcam)
    #[arg(long = "focal-length-px", default_value_t = DEFAULT_FOCAL_LENGTH_PX)]
    pub focal_length_px: f32,

    /// Face-detector command; must print one {"widths_px": [..]} JSON line per frame
    #[arg(long = "detector-cmd", env = "PROXMIC_DETECTOR_CMD", default_value = DEFAULT_DETECTOR_CMD)]
    pub detector_cmd: String,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Mic level counted as audible activity (dBFS)
    #[arg(long = "activity-threshold-db", default_value_t = DEFAULT_ACTIVITY_THRESHOLD_DB)]
    pub activity_threshold_db: f32,

    /// Ambient noise sampling window after capture starts (milliseconds)
    #[arg(long = "ambient-window-ms", default_value_t = DEFAULT_AMBIENT_WINDOW_MS)]
    pub ambient_window_ms: u64,

    /// Where to write the per-detection distance CSV
    #[arg(long = "distance-log", default_value = DEFAULT_DISTANCE_LOG)]
    pub distance_log: PathBuf,

    /// Disable the distance CSV entirely
    #[arg(long = "no-distance-log", default_value_t = false)]
    pub no_distance_log: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "PROXMIC_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "PROXMIC_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

impl AppConfig {
    /// Snapshot the gate thresholds for the controller.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            distance_threshold_cm: self.distance_threshold_cm,
            debounce: Duration::from_secs_f64(self.debounce_seconds),
        }
    }

    /// Snapshot the listener tunables for the capture adapter.
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            preferred_device: self.input_device.clone(),
            activity_threshold_db: self.activity_threshold_db,
            ambient_window_ms: self.ambient_window_ms,
            level_channel_capacity: DEFAULT_LEVEL_CHANNEL_CAPACITY,
        }
    }

    /// Snapshot the pinhole-model parameters for the vision side.
    pub fn distance_estimator(&self) -> DistanceEstimator {
        DistanceEstimator::new(self.known_face_width_cm, self.focal_length_px)
    }
}
