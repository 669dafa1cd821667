//! CPAL-backed background listener.
//!
//! Opens the system microphone when the gate says a face is close and keeps
//! a lightweight level worker running while the session is live. No audio is
//! persisted; the stream exists so downstream consumers (and the debug log)
//! can observe that the mic is hot.

use super::meter::{append_downmixed_samples, rms_db};
use super::{CaptureControl, CaptureError, LiveMeter};
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tunables for the background listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Force a specific input device by name; `None` uses the default.
    pub preferred_device: Option<String>,
    /// Levels at or above this count as audible activity (dBFS).
    pub activity_threshold_db: f32,
    /// How long after `start` to sample the ambient noise floor.
    pub ambient_window_ms: u64,
    /// Capacity of the callback-to-worker level channel.
    pub level_channel_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            preferred_device: None,
            activity_threshold_db: -40.0,
            ambient_window_ms: 1_000,
            level_channel_capacity: 64,
        }
    }
}

struct ActiveSession {
    stream: cpal::Stream,
    worker: thread::JoinHandle<()>,
    dropped: Arc<AtomicUsize>,
}

/// Microphone session owner implementing [`CaptureControl`].
///
/// `start`/`stop` are idempotent, and `stop` joins the level worker after
/// dropping the stream, so the device is fully released before it returns.
pub struct BackgroundListener {
    device: cpal::Device,
    cfg: ListenerConfig,
    meter: LiveMeter,
    session: Option<ActiveSession>,
}

impl BackgroundListener {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a listener, optionally forcing a specific device so users can
    /// pick the right microphone when a laptop exposes multiple inputs.
    pub fn new(cfg: ListenerConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = match cfg.preferred_device.as_deref() {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self {
            device,
            cfg,
            meter: LiveMeter::new(),
            session: None,
        })
    }

    /// Name of the active input device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Live mic level handle; readable from any thread.
    pub fn meter(&self) -> LiveMeter {
        self.meter.clone()
    }

    fn open_stream(&self) -> Result<ActiveSession> {
        let default_config = self.device.default_input_config()?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let sample_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "listener config: format={format:?} sample_rate={sample_rate}Hz channels={channels}"
        ));

        let (sender, receiver) = bounded::<f32>(self.cfg.level_channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));

        let activity_threshold_db = self.cfg.activity_threshold_db;
        let ambient_window = Duration::from_millis(self.cfg.ambient_window_ms);
        let worker = thread::spawn(move || {
            level_worker(receiver, activity_threshold_db, ambient_window);
        });

        // Keep the error callback quiet in the terminal and mirror issues
        // into the debug log.
        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));

        // Convert every supported sample type to f32 up front so the level
        // path stays format-agnostic.
        let stream = match format {
            SampleFormat::F32 => {
                let pump = LevelPump::new(self.meter.clone(), sender, dropped.clone());
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| pump.push(data, channels, |sample| sample),
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let pump = LevelPump::new(self.meter.clone(), sender, dropped.clone());
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        pump.push(data, channels, |sample| sample as f32 / 32_768.0)
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let pump = LevelPump::new(self.meter.clone(), sender, dropped.clone());
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        pump.push(data, channels, |sample| {
                            (sample as f32 - 32_768.0) / 32_768.0
                        })
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play()?;
        Ok(ActiveSession {
            stream,
            worker,
            dropped,
        })
    }
}

impl CaptureControl for BackgroundListener {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Ok(());
        }
        match self.open_stream() {
            Ok(session) => {
                log_debug(&format!("capture started on '{}'", self.device_name()));
                self.session = Some(session);
                Ok(())
            }
            Err(err) => Err(CaptureError::StartFailed(format!("{err:#}"))),
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        if let Err(err) = session.stream.pause() {
            // Keep the session live so a later sample can retry the stop.
            self.session = Some(session);
            return Err(CaptureError::StopFailed(err.to_string()));
        }
        let ActiveSession {
            stream,
            worker,
            dropped,
        } = session;
        // Dropping the stream releases the device and disconnects the level
        // channel; joining the worker blocks until teardown is complete.
        drop(stream);
        let _ = worker.join();
        self.meter.set_db(-60.0);
        let dropped = dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            log_debug(&format!("capture stopped; {dropped} level updates dropped"));
        } else {
            log_debug("capture stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for BackgroundListener {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.stop();
        }
    }
}

/// Shared per-callback state: downmix, meter update, and level hand-off to
/// the worker thread. The callback never blocks; full channels just bump the
/// dropped counter.
struct LevelPump {
    meter: LiveMeter,
    sender: Sender<f32>,
    dropped: Arc<AtomicUsize>,
    scratch: std::sync::Mutex<Vec<f32>>,
}

impl LevelPump {
    fn new(meter: LiveMeter, sender: Sender<f32>, dropped: Arc<AtomicUsize>) -> Self {
        Self {
            meter,
            sender,
            dropped,
            scratch: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn push<T, F>(&self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        let Ok(mut scratch) = self.scratch.try_lock() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        scratch.clear();
        append_downmixed_samples(&mut scratch, data, channels, convert);
        let db = rms_db(&scratch);
        self.meter.set_db(db);
        if let Err(TrySendError::Full(_)) = self.sender.try_send(db) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Drains level updates while a session is live. The first `ambient_window`
/// of levels establishes a noise floor (the analog of calibrating for
/// ambient noise before listening); after that, levels above the activity
/// threshold are logged at most once per second.
fn level_worker(receiver: Receiver<f32>, activity_threshold_db: f32, ambient_window: Duration) {
    let started = Instant::now();
    let mut ambient_sum = 0.0f64;
    let mut ambient_count = 0u32;
    let mut ambient_logged = false;
    let mut last_activity_log: Option<Instant> = None;

    while let Ok(db) = receiver.recv() {
        if !ambient_logged {
            if started.elapsed() < ambient_window {
                ambient_sum += f64::from(db);
                ambient_count += 1;
                continue;
            }
            let floor = if ambient_count > 0 {
                ambient_sum / f64::from(ambient_count)
            } else {
                -60.0
            };
            log_debug(&format!("ambient noise floor: {floor:.1} dBFS"));
            ambient_logged = true;
        }
        if db >= activity_threshold_db {
            let now = Instant::now();
            let due = last_activity_log
                .map(|at| now.duration_since(at) >= Duration::from_secs(1))
                .unwrap_or(true);
            if due {
                log_debug(&format!("audio detected (mic active): {db:.1} dBFS"));
                tracing::debug!(level_db = db, "mic_activity");
                last_activity_log = Some(now);
            }
        }
    }
}
