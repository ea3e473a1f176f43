//! Engine output types

use serde::Serialize;

use crate::interaction::{Confirmation, InteractionState, MachineStats, Transition};
use crate::signal::{ConditionerStats, GestureEvent, PointerSample};
use crate::targets::TargetId;

/// Notification published to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// State moved
    StateChanged {
        /// Previous state
        from: InteractionState,
        /// New state
        to: InteractionState,
    },

    /// Dwell progress while charging
    Progress {
        /// Charging target
        target: TargetId,
        /// Progress (0.0-1.0)
        progress: f64,
    },

    /// One-shot confirmation; the consumer must call `reset()` after acting on it
    Confirmed(Confirmation),

    /// Tracking gained or lost
    TrackingChanged {
        /// Whether the pointer is tracked now
        tracking: bool,
    },

    /// Gesture onset
    Gesture(GestureEvent),
}

/// Result of feeding one raw sample
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// Conditioned pointer
    pub pointer: PointerSample,
    /// Gesture classification for this frame
    pub gesture: GestureEvent,
    /// Machine transition for this frame
    pub transition: Transition,
}

/// Combined diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Conditioner counters
    pub signal: ConditionerStats,
    /// Gestures classified
    pub gestures: u64,
    /// Machine counters
    pub interaction: MachineStats,
}
