//! # lamco-head-pointer
//!
//! Head-pointer dwell interaction engine: hands-free selection of on-screen
//! targets from a camera-tracked nose/head position.
//!
//! A vision collaborator delivers one raw estimate per frame; the engine
//! smooths it into a screen pointer, hit-tests registered targets and runs
//! the dwell state machine, emitting a one-shot confirmation when the user
//! has held the pointer on a target and (optionally) nodded.
//!
//! # Architecture
//!
//! ```text
//! lamco-head-pointer
//!   ├─> Signal Conditioner (EMA, mirror/sensitivity mapping, nod classification)
//!   ├─> Target Registry (id -> rect, snapshot per update)
//!   ├─> Interaction State Machine (Idle/HoverOuter/Charging/ReadyToConfirm/Confirmed)
//!   ├─> Inactivity Watchdog (periodic safety net)
//!   └─> Runtimes (live tokio loop, deterministic trace replay)
//! ```
//!
//! # Data Flow
//!
//! **Pointer Path:** Camera → RawSample → SignalConditioner → InteractionMachine → Transition
//!
//! **Layout Path:** Presentation layer → SharedTargetRegistry → snapshot per update
//!
//! **Output Path:** Transition → watch/broadcast → presentation + action layer → `reset()`
//!
//! # Example
//!
//! ```rust,ignore
//! use lamco_head_pointer::{Config, PointerEngine, RawSample, TargetRect};
//!
//! let mut engine = PointerEngine::new(Config::default())?;
//! engine.registry().register("yes", TargetRect::new(100.0, 100.0, 200.0, 200.0))?;
//!
//! let out = engine.feed(&RawSample { x: 0.8, y: 0.2, confidence: 0.9, timestamp_ms: 0 });
//! if let Some(confirmation) = out.transition.confirmation {
//!     act_on(&confirmation.target);
//!     engine.reset(confirmation.timestamp_ms);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Engine configuration
pub mod config;

/// Engine error types
pub mod error;

/// Signal conditioning (smoothing, mapping, gestures)
pub mod signal;

/// Target registry
pub mod targets;

/// Interaction state machine
pub mod interaction;

/// Engine facade and publication
pub mod engine;

/// Inactivity watchdog
pub mod watchdog;

/// Live and replay runtimes
pub mod runtime;

/// Utility functions
pub mod utils;

pub use config::{Config, ConfirmMode};
pub use engine::{EngineEvent, EngineOutput, PointerEngine};
pub use error::{EngineError, Result};
pub use interaction::{Confirmation, InteractionSnapshot, InteractionState, Transition};
pub use signal::{GestureDirection, GestureEvent, PointerSample, RawSample};
pub use targets::{SharedTargetRegistry, TargetId, TargetRect};
