//! Interaction State Machine
//!
//! Dwell-to-select interaction over registered targets:
//!
//! - Inner/outer hit regions decide between charging and mere hover
//! - A dwell of `dwell.duration_ms` inside the inner region makes the target ready
//! - Confirmation is either automatic (`dwell`) or a down nod (`dwell_gesture`)
//! - `Confirmed` ignores every update until the consumer calls `reset()`
//! - An optional grace hold tolerates brief exits while reaching to confirm
//!
//! Timers are owned by the machine (`timers.rs`) and every firing is
//! re-validated against the current state before it mutates anything.

mod machine;
mod state;
mod timers;

pub use machine::{InteractionMachine, MachineStats, TargetStats};
pub use state::{
    ConfirmSource, Confirmation, InteractionSnapshot, InteractionState, Transition,
    TransitionCause,
};
pub use timers::{TimerKind, TimerSlots, TimerToken};
