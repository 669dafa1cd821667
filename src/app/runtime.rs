//! Frame evaluation loop.
//!
//! One sample is processed to completion, including any resulting start or
//! stop call, before the next is considered. The gate owns its state
//! exclusively; capture failures are logged, rolled back, and retried on
//! later samples rather than aborting the loop.

use crate::gate::{GateAction, ProximityGate, Sample};
use crate::log_debug;
use crate::mic::CaptureControl;
use crate::vision::{DistanceLog, DistanceSource};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set from a signal handler to end the loop after the current frame.
pub type ShutdownFlag = Arc<AtomicBool>;

/// Consecutive source failures tolerated before giving up on the stream.
const MAX_CONSECUTIVE_FRAME_ERRORS: u32 = 10;

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub frames_with_faces: u64,
    pub starts: u64,
    pub stops: u64,
    pub failed_starts: u64,
    pub failed_stops: u64,
    pub frame_errors: u64,
}

/// Drive the gate from a distance source until the stream ends or the
/// shutdown flag is set, mapping its decisions onto the capture controller.
///
/// When a start or stop call fails, the gate is restored to its pre-decision
/// snapshot so the debounce window still runs from the last transition that
/// actually took effect, and the next qualifying sample retries.
pub fn run_frame_loop(
    source: &mut dyn DistanceSource,
    gate: &mut ProximityGate,
    capture: &mut dyn CaptureControl,
    mut distance_log: Option<&mut DistanceLog>,
    shutdown: &ShutdownFlag,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut consecutive_errors = 0u32;

    while !shutdown.load(Ordering::Relaxed) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => {
                consecutive_errors = 0;
                frame
            }
            Ok(None) => break,
            Err(err) => {
                stats.frame_errors += 1;
                consecutive_errors += 1;
                log_debug(&format!("frame error: {err:#}"));
                if consecutive_errors >= MAX_CONSECUTIVE_FRAME_ERRORS {
                    log_debug("too many consecutive frame errors; stopping");
                    break;
                }
                continue;
            }
        };

        stats.frames += 1;
        if !frame.distances_cm.is_empty() {
            stats.frames_with_faces += 1;
        }
        if let Some(log) = distance_log.as_deref_mut() {
            for &distance_cm in &frame.distances_cm {
                if let Err(err) = log.record(distance_cm) {
                    log_debug(&format!("distance log write failed: {err:#}"));
                }
            }
        }

        let sample = Sample::new(frame.at, frame.min_distance_cm());
        let snapshot = gate.snapshot();
        match gate.evaluate(sample) {
            GateAction::None => {}
            GateAction::Start => {
                tracing::info!(
                    distance_cm = sample.distance_cm,
                    "face within threshold, starting capture"
                );
                match capture.start() {
                    Ok(()) => stats.starts += 1,
                    Err(err) => {
                        stats.failed_starts += 1;
                        gate.restore(snapshot);
                        log_debug(&format!("{err}"));
                        tracing::warn!(error = %err, "capture start failed, rolled back");
                    }
                }
            }
            GateAction::Stop => {
                tracing::info!(
                    distance_cm = sample.distance_cm,
                    "face beyond threshold, stopping capture"
                );
                match capture.stop() {
                    Ok(()) => stats.stops += 1,
                    Err(err) => {
                        stats.failed_stops += 1;
                        gate.restore(snapshot);
                        log_debug(&format!("{err}"));
                        tracing::warn!(error = %err, "capture stop failed, rolled back");
                    }
                }
            }
        }
    }

    // Debounce governs automatic transitions only; shutdown always releases
    // the microphone.
    if gate.listening() || capture.is_active() {
        match capture.stop() {
            Ok(()) => {
                stats.stops += 1;
                log_debug("final stop issued on shutdown");
            }
            Err(err) => {
                stats.failed_stops += 1;
                log_debug(&format!("final stop failed: {err}"));
            }
        }
    }

    Ok(stats)
}
