//! Owned interaction timers
//!
//! The machine owns exactly one slot per timer kind. Scheduling into a
//! slot replaces whatever was there and bumps a generation counter, so a
//! token handed out for an earlier schedule can never match again. A host
//! that backs these with real async timers delivers the token back through
//! `InteractionMachine::on_timer`, which ignores anything stale.

use serde::{Deserialize, Serialize};

use crate::targets::TargetId;

/// Timer slots owned by the interaction machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Dwell completion
    Dwell,
    /// Periodic progress publication while charging
    ProgressTick,
    /// Grace hold expiry
    Grace,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dwell => write!(f, "dwell"),
            Self::ProgressTick => write!(f, "progress"),
            Self::Grace => write!(f, "grace"),
        }
    }
}

/// Handle identifying one scheduled firing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerToken {
    /// Slot
    pub kind: TimerKind,
    /// Schedule generation
    pub generation: u64,
    /// Target the timer was armed for
    pub target: TargetId,
}

#[derive(Debug, Clone)]
struct Scheduled {
    token: TimerToken,
    deadline_ms: u64,
}

/// One slot per timer kind
#[derive(Debug, Default)]
pub struct TimerSlots {
    dwell: Option<Scheduled>,
    progress: Option<Scheduled>,
    grace: Option<Scheduled>,
    generation: u64,
}

impl TimerSlots {
    /// Create empty slots
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: TimerKind) -> &Option<Scheduled> {
        match kind {
            TimerKind::Dwell => &self.dwell,
            TimerKind::ProgressTick => &self.progress,
            TimerKind::Grace => &self.grace,
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<Scheduled> {
        match kind {
            TimerKind::Dwell => &mut self.dwell,
            TimerKind::ProgressTick => &mut self.progress,
            TimerKind::Grace => &mut self.grace,
        }
    }

    /// Arm a slot, replacing any pending firing
    pub fn schedule(&mut self, kind: TimerKind, target: TargetId, deadline_ms: u64) -> TimerToken {
        self.generation += 1;
        let token = TimerToken {
            kind,
            generation: self.generation,
            target,
        };
        *self.slot_mut(kind) = Some(Scheduled {
            token: token.clone(),
            deadline_ms,
        });
        token
    }

    /// Disarm a slot
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slot_mut(kind).take().is_some()
    }

    /// Disarm every slot
    pub fn cancel_all(&mut self) {
        self.dwell = None;
        self.progress = None;
        self.grace = None;
    }

    /// Whether the token is the one currently armed in its slot
    pub fn is_current(&self, token: &TimerToken) -> bool {
        self.slot(token.kind)
            .as_ref()
            .map(|s| s.token == *token)
            .unwrap_or(false)
    }

    /// Consume the token if it is current
    pub fn take_if_current(&mut self, token: &TimerToken) -> bool {
        if self.is_current(token) {
            *self.slot_mut(token.kind) = None;
            true
        } else {
            false
        }
    }

    /// Whether a slot is armed
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Deadline of a slot
    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.slot(kind).as_ref().map(|s| s.deadline_ms)
    }

    /// Earliest deadline across all slots
    pub fn next_deadline(&self) -> Option<u64> {
        [&self.dwell, &self.progress, &self.grace]
            .into_iter()
            .flatten()
            .map(|s| s.deadline_ms)
            .min()
    }

    /// Every armed timer with its deadline
    pub fn pending(&self) -> Vec<(TimerToken, u64)> {
        [&self.dwell, &self.progress, &self.grace]
            .into_iter()
            .flatten()
            .map(|s| (s.token.clone(), s.deadline_ms))
            .collect()
    }

    /// Earliest timer due at `now_ms` (ties broken by kind order)
    pub fn next_due(&self, now_ms: u64) -> Option<TimerToken> {
        [&self.dwell, &self.progress, &self.grace]
            .into_iter()
            .flatten()
            .filter(|s| s.deadline_ms <= now_ms)
            .min_by_key(|s| (s.deadline_ms, s.token.kind))
            .map(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_invalidates_old_token() {
        let mut slots = TimerSlots::new();
        let first = slots.schedule(TimerKind::Dwell, "a".into(), 1000);
        let second = slots.schedule(TimerKind::Dwell, "a".into(), 1500);

        assert!(!slots.is_current(&first));
        assert!(slots.is_current(&second));
        assert_eq!(slots.deadline(TimerKind::Dwell), Some(1500));
    }

    #[test]
    fn test_cancel_invalidates_token() {
        let mut slots = TimerSlots::new();
        let token = slots.schedule(TimerKind::Grace, "a".into(), 1000);
        assert!(slots.cancel(TimerKind::Grace));
        assert!(!slots.take_if_current(&token));
        assert!(!slots.cancel(TimerKind::Grace));
    }

    #[test]
    fn test_next_due_in_deadline_order() {
        let mut slots = TimerSlots::new();
        slots.schedule(TimerKind::ProgressTick, "a".into(), 50);
        slots.schedule(TimerKind::Dwell, "a".into(), 1000);

        assert!(slots.next_due(10).is_none());
        assert_eq!(slots.next_due(2000).unwrap().kind, TimerKind::ProgressTick);
        assert_eq!(slots.next_deadline(), Some(50));
        assert_eq!(slots.pending().len(), 2);
    }
}
