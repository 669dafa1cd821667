//! Debounced proximity gate for microphone activation.
//!
//! Turns a stream of per-frame face distances into discrete start/stop
//! decisions. The gate is a pure state machine: it never touches the
//! capture session itself, so decisions stay testable without audio
//! hardware.

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

/// Thresholds for the gate, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Faces closer than this start listening; at or beyond it stops.
    pub distance_threshold_cm: f32,
    /// Minimum dwell between consecutive state transitions.
    pub debounce: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            distance_threshold_cm: 50.0,
            debounce: Duration::from_secs_f64(1.0),
        }
    }
}

/// One processed camera frame: when it was seen and the closest face, if any.
///
/// `distance_cm: None` means no face was detected this frame and is treated
/// as infinitely far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub at: Instant,
    pub distance_cm: Option<f32>,
}

impl Sample {
    pub fn new(at: Instant, distance_cm: Option<f32>) -> Self {
        Self { at, distance_cm }
    }

    fn effective_distance_cm(&self) -> f32 {
        self.distance_cm.unwrap_or(f32::INFINITY)
    }
}

/// Decision returned for each evaluated sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    None,
    Start,
    Stop,
}

impl GateAction {
    pub fn label(self) -> &'static str {
        match self {
            GateAction::None => "none",
            GateAction::Stop => "stop",
            GateAction::Start => "start",
        }
    }
}

/// Restorable copy of the gate's mutable state.
///
/// Taken before acting on a `Start`/`Stop` so the caller can roll the gate
/// back if the capture session refuses the transition. After a restore, the
/// debounce window is still measured from the original transition, so the
/// next qualifying sample retries instead of getting stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    listening: bool,
    last_transition: Option<Instant>,
}

/// Debounced two-state controller mapping distance samples to actions.
///
/// `last_transition` starts out unset, so the very first transition is not
/// held back by the debounce window; from then on every flip requires more
/// than `debounce` to have elapsed since the previous one.
#[derive(Debug)]
pub struct ProximityGate {
    cfg: GateConfig,
    listening: bool,
    last_transition: Option<Instant>,
}

impl ProximityGate {
    pub fn new(cfg: GateConfig) -> Self {
        Self {
            cfg,
            listening: false,
            last_transition: None,
        }
    }

    pub fn listening(&self) -> bool {
        self.listening
    }

    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }

    pub fn config(&self) -> &GateConfig {
        &self.cfg
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            listening: self.listening,
            last_transition: self.last_transition,
        }
    }

    /// Roll the gate back to a previously taken snapshot.
    pub fn restore(&mut self, snapshot: GateSnapshot) {
        self.listening = snapshot.listening;
        self.last_transition = snapshot.last_transition;
    }

    /// Evaluate one sample and decide whether the capture state should flip.
    ///
    /// The sample's own monotonic timestamp is the evaluation time. Exactly
    /// at the threshold counts as "far": strict `<` enters listening, `>=`
    /// leaves it, so a face sitting on the boundary cannot oscillate the
    /// state.
    pub fn evaluate(&mut self, sample: Sample) -> GateAction {
        let distance_cm = sample.effective_distance_cm();
        if !self.listening
            && distance_cm < self.cfg.distance_threshold_cm
            && self.debounce_elapsed(sample.at)
        {
            self.listening = true;
            self.last_transition = Some(sample.at);
            return GateAction::Start;
        } else if self.listening
            && distance_cm >= self.cfg.distance_threshold_cm
            && self.debounce_elapsed(sample.at)
        {
            self.listening = false;
            self.last_transition = Some(sample.at);
            return GateAction::Stop;
        }
        GateAction::None
    }

    fn debounce_elapsed(&self, now: Instant) -> bool {
        match self.last_transition {
            // No transition yet; nothing to dwell on.
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cfg.debounce,
        }
    }
}
