//! Interaction State Machine
//!
//! Owns the single `InteractionState`, the dwell/progress/grace timer slots
//! and the confirmation counter. All mutation happens synchronously inside
//! one call; timers only ever act through `on_timer`/`poll_timers`, and
//! each firing re-validates the state it was armed against.
//!
//! ```text
//!            outer                  inner
//!   Idle ──────────► HoverOuter ──────────► Charging ──(dwell D)──► ReadyToConfirm
//!     ▲                  ▲   ◄──── outer ─────┘  ▲                       │
//!     │                  └──── up nod (latch) ───┴───────────────────────┤
//!     │                                                          down nod│ / auto
//!     └──────────── reset() / inactivity ◄──────────── Confirmed ◄───────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use super::state::{
    ConfirmSource, Confirmation, InteractionSnapshot, InteractionState, Transition,
    TransitionCause,
};
use super::timers::{TimerKind, TimerSlots, TimerToken};
use crate::config::{Config, ConfirmMode};
use crate::signal::{GestureEvent, PointerSample};
use crate::targets::{HitRegion, TargetId, TargetSnapshot};

/// Counters kept by the machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStats {
    /// Charges started
    pub charges_started: u64,
    /// Charges or ready states dropped by an up nod
    pub cancellations: u64,
    /// Confirmations emitted
    pub confirmations: u64,
    /// Grace holds started
    pub grace_holds: u64,
    /// Forced returns to Idle by the watchdog
    pub inactivity_resets: u64,
    /// Timer firings that no longer matched the state
    pub stale_timers: u64,
}

/// Counters kept per target id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStats {
    /// Charges started on this target
    pub charges_started: u64,
    /// Up-nod cancellations while charging or ready
    pub cancellations: u64,
    /// Confirmations emitted for this target
    pub confirmations: u64,
}

/// Interaction state machine
#[derive(Debug)]
pub struct InteractionMachine {
    state: InteractionState,
    timers: TimerSlots,

    dwell_ms: u64,
    inner_margin: f64,
    progress_tick_ms: u64,
    confirm_mode: ConfirmMode,
    cancel_on_up: bool,
    grace_ms: u64,
    grace_on_charging: bool,
    inactivity_timeout_ms: u64,

    /// Target whose inner region must be left before charging again
    cancel_latch: Option<TargetId>,

    tracking: bool,
    last_update_ms: Option<u64>,
    sequence: u64,
    stats: MachineStats,

    /// Survives unregistration so consumers can still read totals
    per_target: BTreeMap<TargetId, TargetStats>,
}

impl InteractionMachine {
    /// Create a machine in `Idle`
    pub fn new(config: &Config) -> Self {
        Self {
            state: InteractionState::Idle,
            timers: TimerSlots::new(),
            dwell_ms: config.dwell.duration_ms.max(1),
            inner_margin: config.dwell.inner_margin,
            progress_tick_ms: config.dwell.progress_tick_ms,
            confirm_mode: config.dwell.confirm_mode,
            cancel_on_up: config.dwell.cancel_on_up_gesture,
            grace_ms: config.grace.duration_ms,
            grace_on_charging: config.grace.apply_to_charging,
            inactivity_timeout_ms: config.watchdog.inactivity_timeout_ms,
            cancel_latch: None,
            tracking: false,
            last_update_ms: None,
            sequence: 0,
            stats: MachineStats::default(),
            per_target: BTreeMap::new(),
        }
    }

    /// Process one conditioned pointer sample
    ///
    /// `targets` must be a snapshot taken for this update; the machine
    /// re-derives its target from it every call.
    pub fn on_pointer_update(
        &mut self,
        pointer: &PointerSample,
        gesture: &GestureEvent,
        targets: &TargetSnapshot,
        now_ms: u64,
    ) -> Transition {
        let from = self.state.clone();
        self.last_update_ms = Some(now_ms);
        self.tracking = pointer.is_tracking;

        let mut confirmation = self.fire_due(targets, now_ms);

        if self.state.is_terminal() {
            trace!("Ignoring pointer update in {}", self.state);
            return self.finish(from, confirmation, now_ms, TransitionCause::PointerUpdate);
        }

        if let Some(id) = self.state.target() {
            if !targets.contains(id) {
                debug!("Target '{}' left the registry", id);
                self.go_idle();
            }
        }

        let hit = if pointer.is_tracking {
            self.hit_test(pointer, targets)
        } else {
            None
        };

        if let Some(c) = self.apply_gesture(gesture, now_ms) {
            confirmation = Some(c);
        }

        if !self.state.is_terminal() {
            if let Some(c) = self.apply_hit(hit, now_ms) {
                confirmation = Some(c);
            }
        }

        self.finish(from, confirmation, now_ms, TransitionCause::PointerUpdate)
    }

    /// Deliver a timer firing
    ///
    /// A token that is no longer current, or whose state has moved on, is
    /// ignored.
    pub fn on_timer(
        &mut self,
        token: &TimerToken,
        targets: &TargetSnapshot,
        now_ms: u64,
    ) -> Transition {
        let from = self.state.clone();
        let confirmation = if self.timers.take_if_current(token) {
            self.apply_timer(token, targets, now_ms)
        } else {
            debug!("Stale {} timer (generation {})", token.kind, token.generation);
            self.stats.stale_timers += 1;
            None
        };
        self.finish(from, confirmation, now_ms, TransitionCause::Timer(token.kind))
    }

    /// Fire every timer due at `now_ms`, in deadline order
    pub fn poll_timers(&mut self, targets: &TargetSnapshot, now_ms: u64) -> Transition {
        let from = self.state.clone();
        let confirmation = self.fire_due(targets, now_ms);
        self.finish(from, confirmation, now_ms, TransitionCause::TimerPoll)
    }

    /// Watchdog entry point
    ///
    /// Forces `Idle` and clears every timer once no pointer update has
    /// arrived for longer than the inactivity timeout, from any state.
    pub fn on_inactivity_tick(&mut self, now_ms: u64) -> Transition {
        let from = self.state.clone();
        let inactive = self
            .last_update_ms
            .map(|last| now_ms.saturating_sub(last) > self.inactivity_timeout_ms)
            .unwrap_or(false);

        if inactive && (!self.state.is_idle() || self.timers.next_deadline().is_some()) {
            info!(
                "No pointer update for {}ms, forcing Idle from {}",
                now_ms.saturating_sub(self.last_update_ms.unwrap_or(now_ms)),
                self.state
            );
            self.go_idle();
            self.stats.inactivity_resets += 1;
        }

        self.finish(from, None, now_ms, TransitionCause::Inactivity)
    }

    /// Return to `Idle` after the consumer acted on a confirmation
    ///
    /// Idempotent; clears every timer and the cancel latch.
    pub fn reset(&mut self, now_ms: u64) -> Transition {
        let from = self.state.clone();
        self.go_idle();
        self.finish(from, None, now_ms, TransitionCause::Reset)
    }

    /// Secondary confirmation control bound to `target`
    ///
    /// Only confirms from `ReadyToConfirm(target)`, including during grace.
    pub fn secondary_confirm(
        &mut self,
        target: &TargetId,
        targets: &TargetSnapshot,
        now_ms: u64,
    ) -> Transition {
        let from = self.state.clone();
        let mut confirmation = self.fire_due(targets, now_ms);

        if self.state.target() == Some(target) && !targets.contains(target) {
            debug!("Secondary confirm for unregistered '{}'", target);
            self.go_idle();
            return self.finish(from, confirmation, now_ms, TransitionCause::SecondaryConfirm);
        }

        match &self.state {
            InteractionState::ReadyToConfirm { target: ready } if ready == target => {
                let ready = ready.clone();
                confirmation = Some(self.confirm(ready, ConfirmSource::Secondary, now_ms));
            }
            state => debug!("Secondary confirm for '{}' ignored in {}", target, state),
        }

        self.finish(from, confirmation, now_ms, TransitionCause::SecondaryConfirm)
    }

    /// Dwell progress at `now_ms` (0.0-1.0)
    pub fn progress(&self, now_ms: u64) -> f64 {
        match &self.state {
            InteractionState::Charging { start_ms, .. } => {
                let elapsed = now_ms.saturating_sub(*start_ms) as f64;
                (elapsed / self.dwell_ms as f64).clamp(0.0, 1.0)
            }
            InteractionState::ReadyToConfirm { .. } | InteractionState::Confirmed { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// Polling view for presentation
    pub fn snapshot(&self, now_ms: u64) -> InteractionSnapshot {
        InteractionSnapshot {
            state: self.state.clone(),
            progress: self.progress(now_ms),
            tracking: self.tracking,
            grace_remaining_ms: self
                .timers
                .deadline(TimerKind::Grace)
                .map(|deadline| deadline.saturating_sub(now_ms)),
            last_update_ms: self.last_update_ms,
        }
    }

    /// Current state
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Every armed timer with its deadline
    pub fn pending_timers(&self) -> Vec<(TimerToken, u64)> {
        self.timers.pending()
    }

    /// Whether a grace hold is active
    pub fn in_grace(&self) -> bool {
        self.timers.is_armed(TimerKind::Grace)
    }

    /// Counters
    pub fn stats(&self) -> MachineStats {
        self.stats
    }

    /// Counters for every target seen so far, in id order
    pub fn target_stats(&self) -> &BTreeMap<TargetId, TargetStats> {
        &self.per_target
    }

    /// Counters for one target (zero when never seen)
    pub fn stats_for(&self, target: &TargetId) -> TargetStats {
        self.per_target.get(target).copied().unwrap_or_default()
    }

    /// Inner-region margin used for hit testing
    pub fn inner_margin(&self) -> f64 {
        self.inner_margin
    }

    /// Target under the pointer, preferring the current one
    fn hit_test(
        &self,
        pointer: &PointerSample,
        targets: &TargetSnapshot,
    ) -> Option<(TargetId, HitRegion)> {
        if let Some(current) = self.state.target() {
            match targets.region_of(current, pointer.x, pointer.y, self.inner_margin) {
                HitRegion::Miss => {}
                region => return Some((current.clone(), region)),
            }
        }
        targets
            .hit_test(pointer.x, pointer.y, self.inner_margin)
            .map(|(id, region)| (id.clone(), region))
    }

    fn apply_gesture(&mut self, gesture: &GestureEvent, now_ms: u64) -> Option<Confirmation> {
        if gesture.is_down_onset() && self.confirm_mode == ConfirmMode::DwellGesture {
            if let InteractionState::ReadyToConfirm { target } = &self.state {
                let target = target.clone();
                return Some(self.confirm(target, ConfirmSource::Gesture, now_ms));
            }
        }

        if gesture.is_up_onset() && self.cancel_on_up {
            let target = match &self.state {
                InteractionState::Charging { target, .. }
                | InteractionState::ReadyToConfirm { target } => target.clone(),
                _ => return None,
            };
            debug!("Up nod cancelled {}", self.state);
            self.timers.cancel_all();
            self.cancel_latch = Some(target.clone());
            self.stats.cancellations += 1;
            self.per_target.entry(target.clone()).or_default().cancellations += 1;
            self.state = InteractionState::HoverOuter { target };
        }

        None
    }

    fn apply_hit(
        &mut self,
        hit: Option<(TargetId, HitRegion)>,
        now_ms: u64,
    ) -> Option<Confirmation> {
        let hit = hit.map(|(id, region)| {
            let latched = self.cancel_latch.as_ref() == Some(&id);
            match region {
                HitRegion::Inner if latched => (id, HitRegion::Outer),
                region => {
                    self.cancel_latch = None;
                    (id, region)
                }
            }
        });

        let Some((id, region)) = hit else {
            self.cancel_latch = None;
            self.on_miss(now_ms);
            return None;
        };

        if self.state.target() != Some(&id) {
            if let Some(previous) = self.state.target() {
                debug!("Retarget '{}' -> '{}'", previous, id);
            }
            self.timers.cancel_all();
            match region {
                HitRegion::Inner => self.start_charging(id, now_ms),
                _ => self.state = InteractionState::HoverOuter { target: id },
            }
            return None;
        }

        self.end_grace();
        let inner = region == HitRegion::Inner;
        match self.state {
            InteractionState::HoverOuter { .. } if inner => {
                self.start_charging(id, now_ms);
                None
            }
            InteractionState::Charging { start_ms, .. } if inner => {
                if now_ms.saturating_sub(start_ms) >= self.dwell_ms {
                    self.become_ready(id, now_ms)
                } else {
                    None
                }
            }
            InteractionState::Charging { .. } => {
                self.timers.cancel(TimerKind::Dwell);
                self.timers.cancel(TimerKind::ProgressTick);
                self.state = InteractionState::HoverOuter { target: id };
                None
            }
            _ => None,
        }
    }

    fn on_miss(&mut self, now_ms: u64) {
        let holds = match &self.state {
            InteractionState::Idle | InteractionState::Confirmed { .. } => return,
            InteractionState::ReadyToConfirm { .. } => self.grace_ms > 0,
            _ => self.grace_ms > 0 && self.grace_on_charging,
        };

        if !holds {
            self.go_idle();
            return;
        }

        if !self.timers.is_armed(TimerKind::Grace) {
            if let Some(target) = self.state.target().cloned() {
                debug!("Grace hold for '{}' ({}ms)", target, self.grace_ms);
                self.timers
                    .schedule(TimerKind::Grace, target, now_ms + self.grace_ms);
                self.stats.grace_holds += 1;
            }
        }
    }

    fn end_grace(&mut self) {
        if self.timers.cancel(TimerKind::Grace) {
            trace!("Grace hold ended");
        }
    }

    fn start_charging(&mut self, target: TargetId, now_ms: u64) {
        self.timers.cancel_all();
        self.timers
            .schedule(TimerKind::Dwell, target.clone(), now_ms + self.dwell_ms);
        if self.progress_tick_ms > 0 {
            self.timers.schedule(
                TimerKind::ProgressTick,
                target.clone(),
                now_ms + self.progress_tick_ms,
            );
        }
        self.stats.charges_started += 1;
        self.per_target.entry(target.clone()).or_default().charges_started += 1;
        self.state = InteractionState::Charging {
            target,
            start_ms: now_ms,
        };
    }

    fn become_ready(&mut self, target: TargetId, now_ms: u64) -> Option<Confirmation> {
        self.timers.cancel(TimerKind::Dwell);
        self.timers.cancel(TimerKind::ProgressTick);
        match self.confirm_mode {
            ConfirmMode::Dwell => Some(self.confirm(target, ConfirmSource::Dwell, now_ms)),
            ConfirmMode::DwellGesture => {
                self.state = InteractionState::ReadyToConfirm { target };
                None
            }
        }
    }

    fn confirm(&mut self, target: TargetId, source: ConfirmSource, now_ms: u64) -> Confirmation {
        self.timers.cancel_all();
        self.cancel_latch = None;
        self.sequence += 1;
        self.stats.confirmations += 1;
        self.per_target.entry(target.clone()).or_default().confirmations += 1;
        info!("Confirmed '{}' via {:?} (#{})", target, source, self.sequence);
        self.state = InteractionState::Confirmed {
            target: target.clone(),
        };
        Confirmation {
            target,
            timestamp_ms: now_ms,
            sequence: self.sequence,
            source,
        }
    }

    fn go_idle(&mut self) {
        self.timers.cancel_all();
        self.cancel_latch = None;
        self.state = InteractionState::Idle;
    }

    fn fire_due(&mut self, targets: &TargetSnapshot, now_ms: u64) -> Option<Confirmation> {
        let mut confirmation = None;
        while let Some(token) = self.timers.next_due(now_ms) {
            self.timers.take_if_current(&token);
            if let Some(c) = self.apply_timer(&token, targets, now_ms) {
                confirmation = Some(c);
            }
        }
        confirmation
    }

    /// Act on a current token, re-validating the state it was armed for
    fn apply_timer(
        &mut self,
        token: &TimerToken,
        targets: &TargetSnapshot,
        now_ms: u64,
    ) -> Option<Confirmation> {
        trace!("{} timer fired for '{}'", token.kind, token.target);
        let armed_for = matches!(
            &self.state,
            InteractionState::Charging { target, .. } if *target == token.target
        );

        match token.kind {
            TimerKind::Dwell if armed_for => {
                if self.in_grace() {
                    // Completes when the pointer returns to the inner region
                    return None;
                }
                if !targets.contains(&token.target) {
                    self.go_idle();
                    return None;
                }
                self.become_ready(token.target.clone(), now_ms)
            }
            TimerKind::ProgressTick if armed_for => {
                self.timers.schedule(
                    TimerKind::ProgressTick,
                    token.target.clone(),
                    now_ms + self.progress_tick_ms,
                );
                None
            }
            TimerKind::Grace
                if self.state.target() == Some(&token.target) && !self.state.is_terminal() =>
            {
                debug!("Grace expired for '{}'", token.target);
                self.go_idle();
                None
            }
            _ => {
                debug!("{} timer no longer matches {}", token.kind, self.state);
                self.stats.stale_timers += 1;
                None
            }
        }
    }

    fn finish(
        &self,
        from: InteractionState,
        confirmation: Option<Confirmation>,
        now_ms: u64,
        cause: TransitionCause,
    ) -> Transition {
        if from != self.state {
            debug!("{} -> {} ({:?})", from, self.state, cause);
        }
        Transition {
            from,
            to: self.state.clone(),
            confirmation,
            progress: self.progress(now_ms),
            cause,
        }
    }
}
