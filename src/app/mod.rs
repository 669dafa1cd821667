//! Application wiring: debug logging and the frame evaluation loop.

mod logging;
mod runtime;

pub use logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use runtime::{run_frame_loop, RunStats, ShutdownFlag};
