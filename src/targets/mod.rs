//! Target Registry
//!
//! Selectable on-screen elements and their current rectangles. The
//! presentation layer registers a rect on mount, on resize, on view
//! navigation and on periodic re-measurement; the interaction machine
//! hit-tests against a snapshot taken once per update.
//!
//! Absence is never an error: a target removed between two updates simply
//! stops matching, and the machine degrades to `Idle`.

mod rect;
mod registry;

pub use rect::{HitRegion, TargetId, TargetRect};
pub use registry::{SharedTargetRegistry, TargetRegistry, TargetSnapshot};
