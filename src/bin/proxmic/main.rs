//! proxmic entrypoint: wires the detector subprocess, the proximity gate,
//! and the CPAL listener into one frame loop.

use anyhow::{Context, Result};
use proxmic::app::{run_frame_loop, ShutdownFlag};
use proxmic::config::AppConfig;
use proxmic::gate::ProximityGate;
use proxmic::mic::BackgroundListener;
use proxmic::vision::{DetectorProcess, DistanceLog};
use proxmic::{init_logging, init_tracing, log_debug, log_file_path, log_panic};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag set by the SIGINT handler to end the frame loop.
static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Signal handler for Ctrl-C. Only flips an atomic flag, which is
/// async-signal-safe; the loop notices it on the next frame.
extern "C" fn handle_sigint(_: libc::c_int) {
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

fn install_sigint_handler() -> Result<()> {
    unsafe {
        // SAFETY: handle_sigint is an extern "C" signal handler with no side
        // effects beyond flipping an atomic flag.
        let handler = handle_sigint as *const () as libc::sighandler_t;
        if libc::signal(libc::SIGINT, handler) == libc::SIG_ERR {
            anyhow::bail!("failed to install SIGINT handler");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;

    if config.list_input_devices {
        let devices =
            BackgroundListener::list_devices().context("failed to enumerate input devices")?;
        if devices.is_empty() {
            println!("No audio input devices detected.");
        } else {
            for name in devices {
                println!("{name}");
            }
        }
        return Ok(());
    }

    init_logging(&config);
    init_tracing(&config);
    panic::set_hook(Box::new(|info| log_panic(info)));
    install_sigint_handler()?;

    let mut listener = BackgroundListener::new(config.listener_config())
        .context("failed to initialize microphone")?;
    eprintln!("Microphone: {}", listener.device_name());

    let mut detector = DetectorProcess::spawn(&config.detector_cmd, config.distance_estimator())
        .with_context(|| format!("failed to start detector '{}'", config.detector_cmd))?;

    let mut distance_log = if config.no_distance_log {
        None
    } else {
        let log = DistanceLog::create(&config.distance_log).with_context(|| {
            format!(
                "failed to create distance log '{}'",
                config.distance_log.display()
            )
        })?;
        eprintln!("Distance log: {}", log.path().display());
        Some(log)
    };

    let mut gate = ProximityGate::new(config.gate_config());
    let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
    let shutdown_probe = shutdown.clone();
    eprintln!(
        "Gate: threshold {:.0} cm, debounce {:.1} s. Press Ctrl-C to quit.",
        config.distance_threshold_cm, config.debounce_seconds
    );

    // Mirror the signal flag into the loop's shutdown flag each frame; the
    // loop only sees the Arc.
    let stats = {
        let mut source = SignalAwareSource {
            inner: &mut detector,
            shutdown: &shutdown_probe,
        };
        run_frame_loop(
            &mut source,
            &mut gate,
            &mut listener,
            distance_log.as_mut(),
            &shutdown,
        )?
    };

    log_debug(&format!("run stats: {stats:?}"));
    eprintln!(
        "Processed {} frames ({} with faces): {} starts, {} stops, {} failed transitions.",
        stats.frames,
        stats.frames_with_faces,
        stats.starts,
        stats.stops,
        stats.failed_starts + stats.failed_stops
    );
    if config.logs && !config.no_logs {
        eprintln!("Debug log: {}", log_file_path().display());
    }
    Ok(())
}

/// Wraps the detector so a pending SIGINT is folded into the shutdown flag
/// before each (potentially blocking) frame read.
struct SignalAwareSource<'a> {
    inner: &'a mut DetectorProcess,
    shutdown: &'a ShutdownFlag,
}

impl proxmic::vision::DistanceSource for SignalAwareSource<'_> {
    fn next_frame(&mut self) -> Result<Option<proxmic::vision::FrameSample>> {
        if SIGINT_RECEIVED.load(Ordering::SeqCst) {
            self.shutdown.store(true, Ordering::Relaxed);
            return Ok(None);
        }
        proxmic::vision::DistanceSource::next_frame(self.inner)
    }
}
