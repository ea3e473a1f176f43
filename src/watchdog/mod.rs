//! Inactivity Watchdog
//!
//! Periodic safety net that calls `on_inactivity_tick()` independently of
//! the pointer update path. If the vision producer stalls, or a consumer
//! never calls `reset()` after a confirmation, the tick forces `Idle` once
//! the inactivity timeout has passed.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::PointerEngine;
use crate::interaction::Transition;
use crate::runtime::Clock;

/// Inactivity watchdog
pub struct InactivityWatchdog;

impl InactivityWatchdog {
    /// Spawn the periodic tick task
    ///
    /// Stops when `cancel` fires.
    pub fn spawn(
        engine: Arc<Mutex<PointerEngine>>,
        clock: Arc<dyn Clock>,
        tick: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;

            info!("Inactivity watchdog started ({}ms tick)", tick.as_millis());
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let now = clock.now_ms();
                        let mut engine = engine.lock();
                        Self::check(&mut engine, now);
                    }
                }
            }
            debug!("Inactivity watchdog stopped");
        })
    }

    /// Run one tick synchronously
    pub fn check(engine: &mut PointerEngine, now_ms: u64) -> Transition {
        engine.on_inactivity_tick(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfirmMode};
    use crate::interaction::InteractionState;
    use crate::runtime::ManualClock;
    use crate::signal::RawSample;
    use crate::targets::TargetRect;

    fn confirmed_engine() -> PointerEngine {
        let mut config = Config::default();
        config.signal.mirror_x = false;
        config.signal.sensitivity = 1.0;
        config.screen.width = 1000.0;
        config.screen.height = 1000.0;
        config.dwell.duration_ms = 1000;
        config.dwell.confirm_mode = ConfirmMode::Dwell;
        let mut engine = PointerEngine::new(config).unwrap();
        engine
            .registry()
            .register("want", TargetRect::new(100.0, 100.0, 200.0, 200.0))
            .unwrap();
        for t in [0, 1000] {
            engine.feed(&RawSample {
                x: 0.15,
                y: 0.15,
                confidence: 1.0,
                timestamp_ms: t,
            });
        }
        engine
    }

    #[test]
    fn test_check_forces_idle_after_timeout() {
        let mut engine = confirmed_engine();
        assert!(engine.state().is_terminal());

        assert!(InactivityWatchdog::check(&mut engine, 5_000).to.is_terminal());
        let t = InactivityWatchdog::check(&mut engine, 13_500);
        assert_eq!(t.to, InteractionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_watchdog_ticks() {
        let engine = Arc::new(Mutex::new(confirmed_engine()));
        let clock = ManualClock::new(1000);
        let cancel = CancellationToken::new();

        let handle = InactivityWatchdog::spawn(
            engine.clone(),
            Arc::new(clock.clone()),
            Duration::from_millis(1000),
            cancel.clone(),
        );

        clock.set(14_000);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.lock().state(), &InteractionState::Idle);

        cancel.cancel();
        handle.await.unwrap();
    }
}
