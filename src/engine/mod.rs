//! Pointer Engine
//!
//! Composes the signal conditioner, the target registry and the interaction
//! machine behind one synchronous API, and publishes the result:
//!
//! ```text
//! RawSample ──> SignalConditioner ──> InteractionMachine ──> Transition
//!                                          ▲                    │
//!           SharedTargetRegistry ──snapshot┘                    ├─> watch<InteractionSnapshot>
//!                                                               └─> broadcast<EngineEvent>
//! ```
//!
//! The engine never spawns anything itself. Hosts drive it from one task
//! (see [`crate::runtime`]) and call `poll_timers`/`on_inactivity_tick`
//! alongside `feed`.

mod events;

pub use events::{EngineEvent, EngineOutput, EngineStats};

use std::collections::BTreeMap;
use tokio::sync::{broadcast, watch};
use tracing::{info, trace};

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::interaction::{
    InteractionMachine, InteractionSnapshot, InteractionState, TargetStats, Transition,
};
use crate::signal::{RawSample, SignalConditioner};
use crate::targets::{SharedTargetRegistry, TargetId};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Head-pointer dwell interaction engine
pub struct PointerEngine {
    config: Config,
    conditioner: SignalConditioner,
    machine: InteractionMachine,
    registry: SharedTargetRegistry,

    state_tx: watch::Sender<InteractionSnapshot>,
    event_tx: broadcast::Sender<EngineEvent>,

    tracking: Option<bool>,
}

impl PointerEngine {
    /// Create an engine with its own registry
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, SharedTargetRegistry::new())
    }

    /// Create an engine over an existing registry handle
    pub fn with_registry(config: Config, registry: SharedTargetRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(format!("{:#}", e)))?;

        let machine = InteractionMachine::new(&config);
        let (state_tx, _) = watch::channel(InteractionSnapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            "Pointer engine ready: {}x{} screen, dwell {}ms, confirm mode {}",
            config.screen.width,
            config.screen.height,
            config.dwell.duration_ms,
            config.dwell.confirm_mode
        );

        Ok(Self {
            conditioner: SignalConditioner::new(&config),
            machine,
            registry,
            state_tx,
            event_tx,
            tracking: None,
            config,
        })
    }

    /// Process one raw sample at its own timestamp
    pub fn feed(&mut self, raw: &RawSample) -> EngineOutput {
        let now = raw.timestamp_ms;
        let conditioned = self.conditioner.feed(raw);
        trace!(
            "Frame {}ms: ({:.1}, {:.1}) tracking={}",
            now,
            conditioned.pointer.x,
            conditioned.pointer.y,
            conditioned.pointer.is_tracking
        );

        if self.tracking != Some(conditioned.pointer.is_tracking) {
            self.tracking = Some(conditioned.pointer.is_tracking);
            self.emit(EngineEvent::TrackingChanged {
                tracking: conditioned.pointer.is_tracking,
            });
        }
        if conditioned.gesture.is_onset() {
            self.emit(EngineEvent::Gesture(conditioned.gesture));
        }

        let targets = self.registry.snapshot();
        let transition = self.machine.on_pointer_update(
            &conditioned.pointer,
            &conditioned.gesture,
            &targets,
            now,
        );
        self.publish(&transition, now);

        EngineOutput {
            pointer: conditioned.pointer,
            gesture: conditioned.gesture,
            transition,
        }
    }

    /// Fire timers due at `now_ms`
    pub fn poll_timers(&mut self, now_ms: u64) -> Transition {
        let targets = self.registry.snapshot();
        let transition = self.machine.poll_timers(&targets, now_ms);
        self.publish(&transition, now_ms);
        transition
    }

    /// Watchdog tick
    pub fn on_inactivity_tick(&mut self, now_ms: u64) -> Transition {
        let transition = self.machine.on_inactivity_tick(now_ms);
        self.publish(&transition, now_ms);
        transition
    }

    /// Return to `Idle` after acting on a confirmation
    pub fn reset(&mut self, now_ms: u64) -> Transition {
        let transition = self.machine.reset(now_ms);
        self.publish(&transition, now_ms);
        transition
    }

    /// Secondary confirmation control bound to `target`
    pub fn secondary_confirm(&mut self, target: &TargetId, now_ms: u64) -> Transition {
        let targets = self.registry.snapshot();
        let transition = self.machine.secondary_confirm(target, &targets, now_ms);
        self.publish(&transition, now_ms);
        transition
    }

    /// Change pointer sensitivity at runtime
    pub fn set_sensitivity(&mut self, sensitivity: f64) -> Result<()> {
        if !(sensitivity > 0.0 && sensitivity.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "sensitivity must be positive, got {}",
                sensitivity
            )));
        }
        info!(
            "Sensitivity {:.2} -> {:.2}",
            self.conditioner.sensitivity(),
            sensitivity
        );
        self.conditioner.set_sensitivity(sensitivity);
        self.config.signal.sensitivity = sensitivity;
        Ok(())
    }

    /// Registry handle for the layout producer
    pub fn registry(&self) -> SharedTargetRegistry {
        self.registry.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> InteractionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Current state
    pub fn state(&self) -> &InteractionState {
        self.machine.state()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe_state(&self) -> watch::Receiver<InteractionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Subscribe to events
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.machine.next_deadline()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Diagnostic counters
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            signal: self.conditioner.stats(),
            gestures: self.conditioner.gestures_classified(),
            interaction: self.machine.stats(),
        }
    }

    /// Per-target counters, in id order
    pub fn target_stats(&self) -> &BTreeMap<TargetId, TargetStats> {
        self.machine.target_stats()
    }

    fn publish(&self, transition: &Transition, now_ms: u64) {
        if transition.changed() {
            self.emit(EngineEvent::StateChanged {
                from: transition.from.clone(),
                to: transition.to.clone(),
            });
        }

        if let InteractionState::Charging { target, .. } = &transition.to {
            self.emit(EngineEvent::Progress {
                target: target.clone(),
                progress: transition.progress,
            });
        }

        if let Some(confirmation) = &transition.confirmation {
            self.emit(EngineEvent::Confirmed(confirmation.clone()));
        }

        self.state_tx.send_replace(self.machine.snapshot(now_ms));
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        if self.event_tx.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

impl std::fmt::Debug for PointerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerEngine")
            .field("state", self.machine.state())
            .field("targets", &self.registry.len())
            .field("sensitivity", &self.conditioner.sensitivity())
            .finish()
    }
}
