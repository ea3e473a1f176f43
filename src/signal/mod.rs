//! Pointer signal conditioning
//!
//! Turns a noisy stream of raw nose/head estimates into a stable screen
//! pointer plus coarse vertical gestures. Pure function of the sample
//! stream: nothing here knows about targets or interaction state.
//!
//! # Pipeline
//!
//! ```text
//! RawSample (normalized, confidence)
//!   └─> tracking gate (confidence, finite)
//!       └─> PointerMapper (mirror, sensitivity, pixels)
//!           └─> EMA smoothing (reset on reacquire)
//!               ├─> PointerSample
//!               └─> GestureClassifier ──> GestureEvent
//! ```

mod conditioner;
mod gesture;
mod mapping;

pub use conditioner::{
    ConditionedSample, ConditionerStats, PointerSample, RawSample, SignalConditioner,
};
pub use gesture::{GestureClassifier, GestureDirection, GestureEvent};
pub use mapping::PointerMapper;
