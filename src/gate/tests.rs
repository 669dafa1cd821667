use super::{GateAction, GateConfig, ProximityGate, Sample};
use std::time::{Duration, Instant};

fn gate() -> ProximityGate {
    ProximityGate::new(GateConfig::default())
}

fn at(base: Instant, ms: u64) -> Instant {
    base + Duration::from_millis(ms)
}

fn sample(base: Instant, ms: u64, distance_cm: f32) -> Sample {
    Sample::new(at(base, ms), Some(distance_cm))
}

#[test]
fn default_thresholds_match_documented_values() {
    let cfg = GateConfig::default();
    assert_eq!(cfg.distance_threshold_cm, 50.0);
    assert_eq!(cfg.debounce, Duration::from_secs(1));
}

#[test]
fn walks_through_reference_sequence() {
    // threshold 50 cm, debounce 1.0 s
    let base = Instant::now();
    let mut gate = gate();

    assert_eq!(gate.evaluate(sample(base, 0, 60.0)), GateAction::None);
    assert!(!gate.listening());

    assert_eq!(gate.evaluate(sample(base, 200, 40.0)), GateAction::Start);
    assert!(gate.listening());

    // Still inside the debounce window.
    assert_eq!(gate.evaluate(sample(base, 500, 30.0)), GateAction::None);
    assert!(gate.listening());

    assert_eq!(gate.evaluate(sample(base, 1300, 55.0)), GateAction::Stop);
    assert!(!gate.listening());

    assert_eq!(gate.evaluate(sample(base, 1400, 10.0)), GateAction::None);
    assert!(!gate.listening());
}

#[test]
fn distance_exactly_at_threshold_counts_as_far() {
    let base = Instant::now();
    let mut gate = gate();
    assert_eq!(gate.evaluate(sample(base, 0, 50.0)), GateAction::None);
    assert!(!gate.listening());

    // Immediately below the boundary does start.
    assert_eq!(gate.evaluate(sample(base, 100, 49.9)), GateAction::Start);

    // And exactly at the boundary ends an active session.
    assert_eq!(gate.evaluate(sample(base, 1200, 50.0)), GateAction::Stop);
}

#[test]
fn missing_detection_behaves_like_infinite_distance() {
    let base = Instant::now();

    let mut with_none = gate();
    let mut with_inf = gate();
    let steps: [(u64, Option<f32>); 4] =
        [(0, Some(40.0)), (1200, None), (2500, Some(30.0)), (3800, None)];
    for (ms, distance) in steps {
        let a = with_none.evaluate(Sample::new(at(base, ms), distance));
        let b = with_inf.evaluate(Sample::new(
            at(base, ms),
            Some(distance.unwrap_or(f32::INFINITY)),
        ));
        assert_eq!(a, b, "diverged at t={ms}ms");
    }
    assert_eq!(with_none.listening(), with_inf.listening());
}

#[test]
fn holding_a_distance_produces_no_redundant_actions() {
    let base = Instant::now();
    let mut gate = gate();
    assert_eq!(gate.evaluate(sample(base, 0, 30.0)), GateAction::Start);
    for ms in (100..5000).step_by(100) {
        assert_eq!(gate.evaluate(sample(base, ms, 30.0)), GateAction::None);
    }

    assert_eq!(gate.evaluate(sample(base, 5000, 80.0)), GateAction::Stop);
    for ms in (5100..9000).step_by(100) {
        assert_eq!(gate.evaluate(sample(base, ms, 80.0)), GateAction::None);
    }
}

#[test]
fn consecutive_actions_respect_the_debounce_window() {
    let base = Instant::now();
    let mut gate = gate();
    let debounce = gate.config().debounce;

    // Noisy input flapping across the threshold every 50 ms.
    let mut actions: Vec<(u64, GateAction)> = Vec::new();
    for step in 0..200u64 {
        let ms = step * 50;
        let distance = if step % 2 == 0 { 20.0 } else { 90.0 };
        let action = gate.evaluate(sample(base, ms, distance));
        if action != GateAction::None {
            actions.push((ms, action));
        }
    }
    assert!(actions.len() >= 2, "expected the gate to keep toggling");
    for pair in actions.windows(2) {
        let gap = Duration::from_millis(pair[1].0 - pair[0].0);
        assert!(
            gap > debounce,
            "actions at {}ms and {}ms violate debounce",
            pair[0].0,
            pair[1].0
        );
    }
}

#[test]
fn rollback_allows_the_next_sample_to_retry_start() {
    let base = Instant::now();
    let mut gate = gate();

    let snapshot = gate.snapshot();
    assert_eq!(gate.evaluate(sample(base, 200, 40.0)), GateAction::Start);

    // Caller's start() failed; undo the transition.
    gate.restore(snapshot);
    assert!(!gate.listening());
    assert_eq!(gate.last_transition(), None);

    assert_eq!(gate.evaluate(sample(base, 300, 40.0)), GateAction::Start);
    assert!(gate.listening());
}

#[test]
fn rollback_measures_debounce_from_the_original_transition() {
    let base = Instant::now();
    let mut gate = gate();
    assert_eq!(gate.evaluate(sample(base, 0, 30.0)), GateAction::Start);

    let snapshot = gate.snapshot();
    assert_eq!(gate.evaluate(sample(base, 1500, 80.0)), GateAction::Stop);

    // stop() failed: the session is still live, so the gate must claim
    // listening again and keep the original transition time.
    gate.restore(snapshot);
    assert!(gate.listening());
    assert_eq!(gate.last_transition(), Some(at(base, 0)));

    assert_eq!(gate.evaluate(sample(base, 1600, 80.0)), GateAction::Stop);
}

#[test]
fn zero_debounce_transitions_on_every_crossing() {
    let base = Instant::now();
    let mut gate = ProximityGate::new(GateConfig {
        distance_threshold_cm: 50.0,
        debounce: Duration::ZERO,
    });
    assert_eq!(gate.evaluate(sample(base, 0, 10.0)), GateAction::Start);
    assert_eq!(gate.evaluate(sample(base, 1, 90.0)), GateAction::Stop);
    assert_eq!(gate.evaluate(sample(base, 2, 10.0)), GateAction::Start);
}

#[test]
fn far_samples_before_any_start_never_stop() {
    let base = Instant::now();
    let mut gate = gate();
    for ms in (0..3000).step_by(250) {
        assert_eq!(gate.evaluate(Sample::new(at(base, ms), None)), GateAction::None);
    }
    assert!(!gate.listening());
    assert_eq!(gate.last_transition(), None);
}
