//! Interaction scenario tests
//!
//! End-to-end dwell scenarios through the public engine API: raw samples
//! in, transitions and confirmations out.

use lamco_head_pointer::config::{Config, ConfirmMode};
use lamco_head_pointer::engine::{EngineEvent, EngineOutput, PointerEngine};
use lamco_head_pointer::interaction::{ConfirmSource, InteractionState};
use lamco_head_pointer::signal::RawSample;
use lamco_head_pointer::targets::{TargetId, TargetRect};

const FRAME_MS: u64 = 33;

/// 1000x1000 screen with identity mapping, so pixels = normalized * 1000
fn config(mode: ConfirmMode) -> Config {
    let mut config = Config::default();
    config.screen.width = 1000.0;
    config.screen.height = 1000.0;
    config.signal.mirror_x = false;
    config.signal.sensitivity = 1.0;
    config.signal.alpha = 1.0;
    config.dwell.duration_ms = 1000;
    config.dwell.confirm_mode = mode;
    config.dwell.cancel_on_up_gesture = false;
    config
}

fn engine_with(config: Config) -> PointerEngine {
    let engine = PointerEngine::new(config).unwrap();
    engine
        .registry()
        .register("want", TargetRect::new(100.0, 100.0, 200.0, 200.0))
        .unwrap();
    engine
}

fn engine(mode: ConfirmMode) -> PointerEngine {
    engine_with(config(mode))
}

fn at(engine: &mut PointerEngine, x: f64, y: f64, t: u64) -> EngineOutput {
    engine.feed(&RawSample {
        x: x / 1000.0,
        y: y / 1000.0,
        confidence: 1.0,
        timestamp_ms: t,
    })
}

/// Feed a still pointer every frame in `[from, to)`, returning confirmations seen
fn hold(engine: &mut PointerEngine, x: f64, y: f64, from: u64, to: u64) -> Vec<TargetId> {
    let mut confirmed = Vec::new();
    let mut t = from;
    while t < to {
        if let Some(c) = at(engine, x, y, t).transition.confirmation {
            confirmed.push(c.target);
        }
        t += FRAME_MS;
    }
    confirmed
}

#[test]
fn test_dwell_in_inner_region_reaches_ready() {
    let mut engine = engine(ConfirmMode::DwellGesture);

    let out = at(&mut engine, 150.0, 150.0, 0);
    assert_eq!(
        out.transition.to,
        InteractionState::Charging {
            target: "want".into(),
            start_ms: 0
        }
    );

    let out = at(&mut engine, 150.0, 150.0, 500);
    assert!((out.transition.progress - 0.5).abs() < 1e-9);

    let out = at(&mut engine, 150.0, 150.0, 1000);
    assert_eq!(
        out.transition.to,
        InteractionState::ReadyToConfirm {
            target: "want".into()
        }
    );
}

#[test]
fn test_dwell_mode_confirms_at_deadline() {
    let mut engine = engine(ConfirmMode::Dwell);

    at(&mut engine, 150.0, 150.0, 0);
    let out = at(&mut engine, 150.0, 150.0, 1000);
    let confirmation = out.transition.confirmation.expect("dwell should confirm");
    assert_eq!(confirmation.target.as_str(), "want");
    assert_eq!(confirmation.source, ConfirmSource::Dwell);
}

#[test]
fn test_charge_lost_when_pointer_leaves() {
    let mut engine = engine(ConfirmMode::DwellGesture);

    let out = at(&mut engine, 105.0, 105.0, 0);
    assert_eq!(
        out.transition.to,
        InteractionState::HoverOuter {
            target: "want".into()
        }
    );

    let out = at(&mut engine, 150.0, 150.0, 200);
    assert_eq!(
        out.transition.to,
        InteractionState::Charging {
            target: "want".into(),
            start_ms: 200
        }
    );

    let out = at(&mut engine, 400.0, 400.0, 700);
    assert_eq!(out.transition.to, InteractionState::Idle);
}

#[test]
fn test_short_dwell_never_confirms() {
    let mut engine = engine(ConfirmMode::Dwell);

    assert!(hold(&mut engine, 150.0, 150.0, 0, 990).is_empty());
    at(&mut engine, 600.0, 600.0, 990);

    let t = engine.poll_timers(10_000);
    assert!(t.confirmation.is_none());
    assert_eq!(engine.state(), &InteractionState::Idle);
}

#[test]
fn test_retarget_restarts_charge() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    engine
        .registry()
        .register("other", TargetRect::new(400.0, 100.0, 200.0, 200.0))
        .unwrap();

    hold(&mut engine, 150.0, 150.0, 0, 800);
    let out = at(&mut engine, 500.0, 150.0, 800);
    assert_eq!(
        out.transition.to,
        InteractionState::Charging {
            target: "other".into(),
            start_ms: 800
        }
    );
    assert_eq!(out.transition.progress, 0.0);

    let out = at(&mut engine, 500.0, 150.0, 1700);
    assert!(matches!(out.transition.to, InteractionState::Charging { .. }));
    let out = at(&mut engine, 500.0, 150.0, 1800);
    assert_eq!(
        out.transition.to,
        InteractionState::ReadyToConfirm {
            target: "other".into()
        }
    );
}

#[test]
fn test_one_confirmation_per_cycle_and_idempotent_reset() {
    let mut engine = engine(ConfirmMode::Dwell);

    let confirmed = hold(&mut engine, 150.0, 150.0, 0, 4000);
    assert_eq!(confirmed.len(), 1, "updates in Confirmed must be ignored");

    engine.reset(4000);
    engine.reset(4000);
    assert_eq!(engine.state(), &InteractionState::Idle);

    let confirmed = hold(&mut engine, 150.0, 150.0, 4000, 6000);
    assert_eq!(confirmed.len(), 1);
    assert_eq!(engine.stats().interaction.confirmations, 2);
}

#[test]
fn test_inactivity_forces_idle_without_reset() {
    let mut engine = engine(ConfirmMode::Dwell);
    hold(&mut engine, 150.0, 150.0, 0, 1100);
    assert!(engine.state().is_terminal());

    engine.on_inactivity_tick(12_000);
    assert!(engine.state().is_terminal());

    // Last update was the frame at 1089ms
    let t = engine.on_inactivity_tick(1089 + 12_001);
    assert_eq!(t.to, InteractionState::Idle);
}

#[test]
fn test_down_nod_confirms_when_ready() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    hold(&mut engine, 150.0, 150.0, 0, 1050);
    assert!(matches!(
        engine.state(),
        InteractionState::ReadyToConfirm { .. }
    ));

    let out = at(&mut engine, 150.0, 190.0, 1056);
    assert!(out.gesture.is_down_onset());
    let confirmation = out.transition.confirmation.expect("nod should confirm");
    assert_eq!(confirmation.source, ConfirmSource::Gesture);
}

#[test]
fn test_up_nod_cancels_charge() {
    let mut cfg = config(ConfirmMode::DwellGesture);
    cfg.dwell.cancel_on_up_gesture = true;
    let mut engine = engine_with(cfg);

    hold(&mut engine, 200.0, 250.0, 0, 500);
    let out = at(&mut engine, 200.0, 190.0, 500);
    assert!(out.gesture.is_up_onset());
    assert_eq!(
        out.transition.to,
        InteractionState::HoverOuter {
            target: "want".into()
        }
    );

    // Still in the inner region: no new charge until it is left
    assert!(hold(&mut engine, 200.0, 190.0, 533, 3000).is_empty());
    assert!(matches!(
        engine.state(),
        InteractionState::HoverOuter { .. }
    ));
    assert_eq!(engine.stats().interaction.cancellations, 1);
}

#[test]
fn test_grace_keeps_ready_for_secondary_control() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    hold(&mut engine, 150.0, 150.0, 0, 1050);

    // Sideways exit, no vertical motion
    let out = at(&mut engine, 350.0, 150.0, 1056);
    assert!(matches!(
        out.transition.to,
        InteractionState::ReadyToConfirm { .. }
    ));
    assert!(engine.snapshot().grace_remaining_ms.is_some());

    let t = engine.secondary_confirm(&"want".into(), 1400);
    assert_eq!(t.confirmation.unwrap().source, ConfirmSource::Secondary);
}

#[test]
fn test_grace_expiry_collapses_to_idle() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    hold(&mut engine, 150.0, 150.0, 0, 1050);
    at(&mut engine, 350.0, 150.0, 1056);

    let t = engine.poll_timers(1056 + 1000);
    assert_eq!(t.to, InteractionState::Idle);
}

#[test]
fn test_tracking_loss_drops_to_idle() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    let mut events = engine.subscribe_events();

    hold(&mut engine, 150.0, 150.0, 0, 300);
    let out = engine.feed(&RawSample {
        x: 0.15,
        y: 0.15,
        confidence: 0.0,
        timestamp_ms: 330,
    });
    assert!(!out.pointer.is_tracking);
    assert_eq!(out.transition.to, InteractionState::Idle);

    let mut tracking_changes = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::TrackingChanged { tracking } = event {
            tracking_changes.push(tracking);
        }
    }
    assert_eq!(tracking_changes, vec![true, false]);
}

#[test]
fn test_unregistered_target_degrades_to_idle() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    hold(&mut engine, 150.0, 150.0, 0, 300);

    engine.registry().unregister(&"want".into());
    let out = at(&mut engine, 150.0, 150.0, 330);
    assert_eq!(out.transition.to, InteractionState::Idle);

    // Timers armed for the removed target are gone too
    assert!(engine.poll_timers(5000).confirmation.is_none());
}

/// Grace also covers Charging; pointer leaves sideways at 528ms, grace runs to 1528ms
fn charging_in_grace() -> PointerEngine {
    let mut cfg = config(ConfirmMode::DwellGesture);
    cfg.grace.apply_to_charging = true;
    let mut engine = engine_with(cfg);

    hold(&mut engine, 150.0, 150.0, 0, 500);
    let out = at(&mut engine, 350.0, 150.0, 528);
    assert_eq!(
        out.transition.to,
        InteractionState::Charging {
            target: "want".into(),
            start_ms: 0
        }
    );
    assert_eq!(engine.snapshot().grace_remaining_ms, Some(1000));
    engine
}

#[test]
fn test_dwell_deadline_during_charging_grace_does_nothing() {
    let mut engine = charging_in_grace();

    let t = engine.poll_timers(1200);
    assert!(t.confirmation.is_none());
    assert_eq!(
        t.to,
        InteractionState::Charging {
            target: "want".into(),
            start_ms: 0
        }
    );
    assert!(engine.snapshot().grace_remaining_ms.is_some());
}

#[test]
fn test_return_after_deadline_becomes_ready() {
    let mut engine = charging_in_grace();
    engine.poll_timers(1200);

    let out = at(&mut engine, 150.0, 150.0, 1300);
    assert_eq!(
        out.transition.to,
        InteractionState::ReadyToConfirm {
            target: "want".into()
        }
    );
    assert!(engine.snapshot().grace_remaining_ms.is_none());
}

#[test]
fn test_charging_grace_expiry_collapses_to_idle() {
    let mut engine = charging_in_grace();

    let t = engine.poll_timers(1528);
    assert!(t.confirmation.is_none());
    assert_eq!(t.to, InteractionState::Idle);
    assert!(engine.next_deadline().is_none());
}

#[test]
fn test_charging_without_grace_option_drops_on_exit() {
    let mut engine = engine(ConfirmMode::DwellGesture);
    hold(&mut engine, 150.0, 150.0, 0, 500);
    let out = at(&mut engine, 350.0, 150.0, 528);
    assert_eq!(out.transition.to, InteractionState::Idle);
}
