//! Interaction state types

use serde::{Deserialize, Serialize};

use super::timers::TimerKind;
use crate::targets::TargetId;

/// The single process-wide interaction state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    /// Not over any target
    #[default]
    Idle,

    /// Over a target's margin band; no charge accumulates
    HoverOuter {
        /// Hovered target
        target: TargetId,
    },

    /// Inside a target's inner region, dwell timer running
    Charging {
        /// Charging target
        target: TargetId,
        /// Charge start (ms)
        start_ms: u64,
    },

    /// Dwell completed, waiting for the confirmation trigger
    ReadyToConfirm {
        /// Charged target
        target: TargetId,
    },

    /// Selection confirmed; terminal until `reset()`
    Confirmed {
        /// Confirmed target
        target: TargetId,
    },
}

impl InteractionState {
    /// Target referenced by this state
    pub fn target(&self) -> Option<&TargetId> {
        match self {
            Self::Idle => None,
            Self::HoverOuter { target }
            | Self::Charging { target, .. }
            | Self::ReadyToConfirm { target }
            | Self::Confirmed { target } => Some(target),
        }
    }

    /// Short state name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HoverOuter { .. } => "hover_outer",
            Self::Charging { .. } => "charging",
            Self::ReadyToConfirm { .. } => "ready_to_confirm",
            Self::Confirmed { .. } => "confirmed",
        }
    }

    /// Whether the machine ignores pointer updates in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// Whether this is `Idle`
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::HoverOuter { target } => write!(f, "HoverOuter({})", target),
            Self::Charging { target, start_ms } => {
                write!(f, "Charging({}, start={}ms)", target, start_ms)
            }
            Self::ReadyToConfirm { target } => write!(f, "ReadyToConfirm({})", target),
            Self::Confirmed { target } => write!(f, "Confirmed({})", target),
        }
    }
}

/// What triggered a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmSource {
    /// Dwell completion in dwell-only mode
    Dwell,
    /// Downward nod while ready
    Gesture,
    /// Secondary confirmation control bound to the target
    Secondary,
}

/// One-shot confirmation event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Confirmed target
    pub target: TargetId,

    /// Confirmation time (ms)
    pub timestamp_ms: u64,

    /// Monotonic confirmation counter (1-based)
    pub sequence: u64,

    /// Trigger
    pub source: ConfirmSource,
}

/// Why the machine was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Pointer sample
    PointerUpdate,
    /// Owned timer fired
    Timer(TimerKind),
    /// Due timers drained by the host
    TimerPoll,
    /// Inactivity watchdog
    Inactivity,
    /// Explicit reset
    Reset,
    /// Secondary confirmation control
    SecondaryConfirm,
}

/// Result of one machine call
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State before the call
    pub from: InteractionState,

    /// State after the call
    pub to: InteractionState,

    /// Confirmation emitted by this call (at most one)
    pub confirmation: Option<Confirmation>,

    /// Dwell progress after the call (0.0-1.0)
    pub progress: f64,

    /// What drove this call
    pub cause: TransitionCause,
}

impl Transition {
    /// Whether the state changed
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// Whether a confirmation was emitted
    pub fn confirmed(&self) -> bool {
        self.confirmation.is_some()
    }
}

/// Polling view of the machine for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InteractionSnapshot {
    /// Current state
    pub state: InteractionState,

    /// Dwell progress (0.0-1.0)
    pub progress: f64,

    /// Whether the latest pointer sample was tracked
    pub tracking: bool,

    /// Remaining grace time when a grace hold is active (ms)
    pub grace_remaining_ms: Option<u64>,

    /// Time of the latest pointer update (ms)
    pub last_update_ms: Option<u64>,
}
