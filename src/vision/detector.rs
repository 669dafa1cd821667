//! External face-detector subprocess.
//!
//! The camera and Haar-cascade detection stay in a helper process (typically
//! a small OpenCV script); it prints one JSON object per processed frame on
//! stdout and we translate detected pixel widths into distances here.

use super::{DistanceEstimator, DistanceSource, FrameSample};
use crate::log_debug;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Instant;

/// One line of detector output: pixel widths of every face in the frame.
/// An empty array is a frame with no detections.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FramePayload {
    pub widths_px: Vec<f32>,
}

/// Spawns the detector command and streams its frames as distance samples.
pub struct DetectorProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    estimator: DistanceEstimator,
}

impl DetectorProcess {
    /// Split `command` shell-style, spawn it with piped stdout, and wrap the
    /// stream. The command inherits stderr so detector diagnostics reach the
    /// terminal.
    pub fn spawn(command: &str, estimator: DistanceEstimator) -> Result<Self> {
        let parts = shell_words::split(command)
            .with_context(|| format!("failed to parse detector command '{command}'"))?;
        let Some((program, args)) = parts.split_first() else {
            bail!("detector command is empty");
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn detector '{program}'"))?;
        let stdout = child
            .stdout
            .take()
            .context("detector stdout was not captured")?;
        log_debug(&format!("detector spawned: {command}"));
        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            estimator,
        })
    }

    fn parse_line(&self, line: &str) -> Result<FrameSample> {
        let payload: FramePayload = serde_json::from_str(line)
            .with_context(|| format!("bad detector frame: '{line}'"))?;
        Ok(frame_from_payload(&payload, &self.estimator, Instant::now()))
    }
}

impl DistanceSource for DetectorProcess {
    fn next_frame(&mut self) -> Result<Option<FrameSample>> {
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return self.parse_line(line.trim()).map(Some);
                }
                Some(Err(err)) => return Err(err).context("failed to read detector output"),
                None => {
                    log_debug("detector stream ended");
                    return Ok(None);
                }
            }
        }
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        // The helper owns the camera; make sure it does not outlive us.
        if self.child.try_wait().map(|s| s.is_none()).unwrap_or(false) {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

fn frame_from_payload(
    payload: &FramePayload,
    estimator: &DistanceEstimator,
    at: Instant,
) -> FrameSample {
    let distances_cm = payload
        .widths_px
        .iter()
        .filter_map(|&w| estimator.distance_cm(w))
        .collect();
    FrameSample::new(at, distances_cm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_payload_json() {
        let payload: FramePayload = serde_json::from_str(r#"{"widths_px": [176.0, 88.0]}"#)
            .expect("payload should parse");
        assert_eq!(payload.widths_px, vec![176.0, 88.0]);
    }

    #[test]
    fn parses_empty_frame() {
        let payload: FramePayload =
            serde_json::from_str(r#"{"widths_px": []}"#).expect("payload should parse");
        assert!(payload.widths_px.is_empty());
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(serde_json::from_str::<FramePayload>(r#"{"widths": [1.0]}"#).is_err());
    }

    #[test]
    fn payload_conversion_drops_degenerate_widths() {
        let payload = FramePayload {
            widths_px: vec![176.0, 0.0, -4.0],
        };
        let frame = frame_from_payload(&payload, &DistanceEstimator::default(), Instant::now());
        assert_eq!(frame.distances_cm.len(), 1);
        assert!((frame.distances_cm[0] - 49.97).abs() < 0.05);
    }
}
