use super::defaults::{
    MAX_AMBIENT_WINDOW_MS, MAX_DEBOUNCE_SECONDS, MAX_DETECTOR_CMD_BYTES, MAX_DISTANCE_THRESHOLD_CM,
    MAX_FACE_WIDTH_CM, MAX_FOCAL_LENGTH_PX, MIN_AMBIENT_WINDOW_MS, MIN_DISTANCE_THRESHOLD_CM,
    MIN_FACE_WIDTH_CM, MIN_FOCAL_LENGTH_PX,
};
use super::AppConfig;
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the detector command.
    pub fn validate(&mut self) -> Result<()> {
        if !self.distance_threshold_cm.is_finite()
            || !(MIN_DISTANCE_THRESHOLD_CM..=MAX_DISTANCE_THRESHOLD_CM)
                .contains(&self.distance_threshold_cm)
        {
            bail!(
                "--distance-threshold-cm must be between {MIN_DISTANCE_THRESHOLD_CM} and {MAX_DISTANCE_THRESHOLD_CM}, got {}",
                self.distance_threshold_cm
            );
        }
        if !self.debounce_seconds.is_finite()
            || !(0.0..=MAX_DEBOUNCE_SECONDS).contains(&self.debounce_seconds)
        {
            bail!(
                "--debounce-seconds must be between 0 and {MAX_DEBOUNCE_SECONDS}, got {}",
                self.debounce_seconds
            );
        }
        if !self.known_face_width_cm.is_finite()
            || !(MIN_FACE_WIDTH_CM..=MAX_FACE_WIDTH_CM).contains(&self.known_face_width_cm)
        {
            bail!(
                "--known-face-width-cm must be between {MIN_FACE_WIDTH_CM} and {MAX_FACE_WIDTH_CM}, got {}",
                self.known_face_width_cm
            );
        }
        if !self.focal_length_px.is_finite()
            || !(MIN_FOCAL_LENGTH_PX..=MAX_FOCAL_LENGTH_PX).contains(&self.focal_length_px)
        {
            bail!(
                "--focal-length-px must be between {MIN_FOCAL_LENGTH_PX} and {MAX_FOCAL_LENGTH_PX}, got {}",
                self.focal_length_px
            );
        }
        if !(-120.0..=0.0).contains(&self.activity_threshold_db) {
            bail!(
                "--activity-threshold-db must be between -120.0 and 0.0 dB, got {}",
                self.activity_threshold_db
            );
        }
        if !(MIN_AMBIENT_WINDOW_MS..=MAX_AMBIENT_WINDOW_MS).contains(&self.ambient_window_ms) {
            bail!(
                "--ambient-window-ms must be between {MIN_AMBIENT_WINDOW_MS} and {MAX_AMBIENT_WINDOW_MS} ms, got {}",
                self.ambient_window_ms
            );
        }

        self.detector_cmd = sanitize_detector_cmd(&self.detector_cmd)?;

        if let Some(device) = &self.input_device {
            if device.trim().is_empty() {
                bail!("--input-device must not be empty");
            }
            if device.chars().any(|ch| matches!(ch, '\n' | '\r' | '\0')) {
                bail!("--input-device must not contain control characters");
            }
        }

        Ok(())
    }
}

/// The detector command is split shell-style and spawned directly; keep it
/// short and free of control characters.
pub(super) fn sanitize_detector_cmd(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("--detector-cmd cannot be empty");
    }
    if trimmed.len() > MAX_DETECTOR_CMD_BYTES {
        bail!("--detector-cmd exceeds {MAX_DETECTOR_CMD_BYTES} bytes");
    }
    if trimmed.chars().any(|ch| ch.is_control()) {
        bail!("--detector-cmd must not contain control characters");
    }
    if shell_words::split(trimmed).is_err() {
        bail!("--detector-cmd has unbalanced quoting");
    }
    Ok(trimmed.to_string())
}
