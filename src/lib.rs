//! Proximity-gated microphone controller.
//!
//! A face-detector helper process reports per-frame face widths; the gate
//! turns the resulting distances into debounced start/stop decisions for a
//! CPAL microphone session.

pub mod app;
pub mod config;
pub mod gate;
pub mod mic;
mod telemetry;
pub mod vision;

pub use app::{init_logging, log_debug, log_file_path, log_panic, run_frame_loop, RunStats};
pub use gate::{GateAction, GateConfig, ProximityGate, Sample};
pub use telemetry::init_tracing;
