//! Microphone capture control.
//!
//! The gate decides *when* to listen; this module owns *how*. The
//! `CaptureControl` trait is the seam the frame loop talks to, and
//! `BackgroundListener` is the CPAL-backed implementation that keeps an
//! input stream open while a face is close.

mod listener;
mod meter;

pub use listener::{BackgroundListener, ListenerConfig};
pub use meter::LiveMeter;

use thiserror::Error;

/// Why a capture transition failed. Neither variant is fatal: the frame
/// loop logs, rolls the gate back, and retries on a later sample.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to start capture session: {0}")]
    StartFailed(String),
    #[error("failed to stop capture session: {0}")]
    StopFailed(String),
}

/// Start/stop surface of an audio capture session.
///
/// Implementations must be idempotent: `start` while already active and
/// `stop` while already inactive are no-ops, so defensive calls during
/// error recovery are safe. `stop` must not return until the underlying
/// session has released its resources, so a following `start` cannot race
/// in-flight teardown.
pub trait CaptureControl {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<(), CaptureError>;
    fn is_active(&self) -> bool;
}
