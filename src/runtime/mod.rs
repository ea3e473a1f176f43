//! Host runtimes
//!
//! Two ways of driving a [`PointerEngine`]:
//!
//! - [`LiveRuntime`]: tokio event loop fed through an mpsc channel, with
//!   timer deadlines and the inactivity watchdog running in real time
//! - [`ReplayDriver`]: deterministic replay of a recorded JSONL trace on a
//!   [`ManualClock`]
//!
//! Both consume the same [`EngineInput`] records:
//!
//! ```text
//! {"type":"register","id":"yes","rect":{"x":100,"y":100,"width":200,"height":200}}
//! {"type":"sample","x":0.42,"y":0.51,"confidence":0.93,"timestamp_ms":1200}
//! {"type":"reset","at_ms":2600}
//! ```

mod clock;
mod live;
mod replay;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use live::{ConfirmationSink, LiveRuntime};
pub use replay::{parse_trace_line, ReplayDriver, ReplayReport, TransitionRecord};

use serde::{Deserialize, Serialize};

use crate::engine::PointerEngine;
use crate::error::Result;
use crate::interaction::Transition;
use crate::signal::RawSample;
use crate::targets::{TargetId, TargetRect};

/// One input record for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineInput {
    /// Raw pointer estimate
    Sample(RawSample),

    /// Target measured (mount, resize, re-measurement)
    Register {
        /// Target id
        id: TargetId,
        /// Measured rect
        rect: TargetRect,
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },

    /// Target unmounted
    Unregister {
        /// Target id
        id: TargetId,
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },

    /// View navigation: drop every target
    Clear {
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },

    /// Consumer finished acting on a confirmation
    Reset {
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },

    /// Secondary confirmation control pressed
    SecondaryConfirm {
        /// Target the control is bound to
        id: TargetId,
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },

    /// Runtime sensitivity change
    Sensitivity {
        /// New multiplier
        value: f64,
        /// Input time (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
    },
}

impl EngineInput {
    /// Time carried by the record, if any
    pub fn timestamp_ms(&self) -> Option<u64> {
        match self {
            Self::Sample(sample) => Some(sample.timestamp_ms),
            Self::Register { at_ms, .. }
            | Self::Unregister { at_ms, .. }
            | Self::Clear { at_ms }
            | Self::Reset { at_ms }
            | Self::SecondaryConfirm { at_ms, .. }
            | Self::Sensitivity { at_ms, .. } => *at_ms,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sample(_) => "sample",
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::Clear { .. } => "clear",
            Self::Reset { .. } => "reset",
            Self::SecondaryConfirm { .. } => "secondary_confirm",
            Self::Sensitivity { .. } => "sensitivity",
        }
    }
}

/// Apply one input at `now_ms`
///
/// Samples are re-stamped with `now_ms` so that timer deadlines and pointer
/// updates share one time base. Registry edits return `None`.
pub fn apply_input(
    engine: &mut PointerEngine,
    input: EngineInput,
    now_ms: u64,
) -> Result<Option<Transition>> {
    match input {
        EngineInput::Sample(sample) => {
            let sample = RawSample {
                timestamp_ms: now_ms,
                ..sample
            };
            Ok(Some(engine.feed(&sample).transition))
        }
        EngineInput::Register { id, rect, .. } => {
            engine.registry().register(id, rect)?;
            Ok(None)
        }
        EngineInput::Unregister { id, .. } => {
            engine.registry().unregister(&id);
            Ok(None)
        }
        EngineInput::Clear { .. } => {
            engine.registry().clear();
            Ok(None)
        }
        EngineInput::Reset { .. } => Ok(Some(engine.reset(now_ms))),
        EngineInput::SecondaryConfirm { id, .. } => Ok(Some(engine.secondary_confirm(&id, now_ms))),
        EngineInput::Sensitivity { value, .. } => {
            engine.set_sensitivity(value)?;
            Ok(None)
        }
    }
}
