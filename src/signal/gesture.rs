//! Vertical Gesture Classification
//!
//! Turns deliberate up/down head nods into one-shot discrete events.
//!
//! # Algorithm
//!
//! ```text
//! delta_y      = y(t) - y(t-1)            (frame-to-frame, pixels)
//! total_delta  = y(t) - y(anchor)         (since window start, pixels)
//!
//! Down: delta_y >  min_frame_delta  &&  total_delta >  down_fraction * height
//! Up:   delta_y < -min_frame_delta  &&  total_delta < -up_fraction   * height
//! ```
//!
//! The up threshold is larger than the down threshold so that an accidental
//! upward drift is less likely to read as a cancel. A classified gesture
//! stays latched for `cooldown_ms`, then clears and re-anchors the window,
//! so one physical nod yields exactly one onset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conditioner::PointerSample;
use crate::config::GestureConfig;

/// Coarse vertical gesture direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GestureDirection {
    /// No gesture
    #[default]
    None,
    /// Upward nod (cancel)
    Up,
    /// Downward nod (confirm)
    Down,
}

impl std::fmt::Display for GestureDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Gesture classification result for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GestureEvent {
    /// Classified direction (latched until the cooldown elapses)
    pub direction: GestureDirection,

    /// Cumulative displacement that triggered the classification (pixels)
    pub magnitude: f64,

    /// Time since classification (ms)
    pub age_ms: u64,

    /// True only on the frame the gesture was classified
    pub onset: bool,
}

impl GestureEvent {
    /// Event carrying no gesture
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this frame is the moment of classification
    pub fn is_onset(&self) -> bool {
        self.onset && self.direction != GestureDirection::None
    }

    /// Onset of a downward nod
    pub fn is_down_onset(&self) -> bool {
        self.is_onset() && self.direction == GestureDirection::Down
    }

    /// Onset of an upward nod
    pub fn is_up_onset(&self) -> bool {
        self.is_onset() && self.direction == GestureDirection::Up
    }
}

/// Start of the current gesture window
#[derive(Debug, Clone, Copy)]
struct WindowAnchor {
    y: f64,
    timestamp_ms: u64,
}

/// Latched classification
#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    direction: GestureDirection,
    magnitude: f64,
    classified_at_ms: u64,
}

impl ActiveGesture {
    fn event_at(&self, now_ms: u64) -> GestureEvent {
        GestureEvent {
            direction: self.direction,
            magnitude: self.magnitude,
            age_ms: now_ms.saturating_sub(self.classified_at_ms),
            onset: false,
        }
    }
}

/// Rolling-window vertical gesture classifier
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,

    /// Screen height used to scale the cumulative thresholds
    screen_height: f64,

    anchor: Option<WindowAnchor>,

    /// Previous tracked Y for the frame delta
    last_y: Option<f64>,

    active: Option<ActiveGesture>,

    /// Total gestures classified
    classified: u64,
}

impl GestureClassifier {
    /// Create a classifier for a screen of the given height
    pub fn new(config: GestureConfig, screen_height: f64) -> Self {
        Self {
            config,
            screen_height,
            anchor: None,
            last_y: None,
            active: None,
            classified: 0,
        }
    }

    /// Classify the gesture for one conditioned sample
    pub fn classify(&mut self, sample: &PointerSample, now_ms: u64) -> GestureEvent {
        let cooldown_done = self
            .active
            .map(|a| now_ms.saturating_sub(a.classified_at_ms) >= self.config.cooldown_ms)
            .unwrap_or(false);

        if !sample.is_tracking {
            // Tracking lost: no classification and the anchor stays put
            if cooldown_done {
                self.active = None;
            }
            return self
                .active
                .map(|a| a.event_at(now_ms))
                .unwrap_or_default();
        }

        if cooldown_done {
            self.active = None;
            self.rearm(sample.y, now_ms);
            return GestureEvent::none();
        }

        let delta_y = self.last_y.map(|prev| sample.y - prev).unwrap_or(0.0);
        self.last_y = Some(sample.y);

        if let Some(active) = self.active {
            return active.event_at(now_ms);
        }

        let anchor = match self.anchor {
            Some(a) if now_ms.saturating_sub(a.timestamp_ms) <= self.config.window_ms => a,
            _ => {
                let a = WindowAnchor {
                    y: sample.y,
                    timestamp_ms: now_ms,
                };
                self.anchor = Some(a);
                a
            }
        };

        let total_delta_y = sample.y - anchor.y;
        let min_frame = self.config.min_frame_delta_px;

        let direction = if delta_y > min_frame
            && total_delta_y > self.config.down_fraction * self.screen_height
        {
            GestureDirection::Down
        } else if delta_y < -min_frame
            && total_delta_y < -self.config.up_fraction * self.screen_height
        {
            GestureDirection::Up
        } else {
            return GestureEvent::none();
        };

        let active = ActiveGesture {
            direction,
            magnitude: total_delta_y.abs(),
            classified_at_ms: now_ms,
        };
        self.active = Some(active);
        self.classified += 1;

        debug!(
            "Gesture {} classified: delta_y={:.1}, total={:.1}, window={}ms",
            direction,
            delta_y,
            total_delta_y,
            now_ms.saturating_sub(anchor.timestamp_ms)
        );

        GestureEvent {
            direction,
            magnitude: active.magnitude,
            age_ms: 0,
            onset: true,
        }
    }

    /// Restart the window at a fresh position (after reacquisition)
    pub fn rearm(&mut self, y: f64, now_ms: u64) {
        self.anchor = Some(WindowAnchor {
            y,
            timestamp_ms: now_ms,
        });
        self.last_y = Some(y);
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.anchor = None;
        self.last_y = None;
        self.active = None;
    }

    /// Currently latched direction
    pub fn current_direction(&self) -> GestureDirection {
        self.active
            .map(|a| a.direction)
            .unwrap_or(GestureDirection::None)
    }

    /// Total gestures classified since creation
    pub fn classified_count(&self) -> u64 {
        self.classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(y: f64) -> PointerSample {
        PointerSample {
            x: 100.0,
            y,
            is_tracking: true,
        }
    }

    fn lost(y: f64) -> PointerSample {
        PointerSample {
            x: 100.0,
            y,
            is_tracking: false,
        }
    }

    /// 1000px tall screen: down needs > 20px cumulative, up needs > 50px
    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default(), 1000.0)
    }

    #[test]
    fn test_still_pointer_classifies_nothing() {
        let mut c = classifier();
        for i in 0..30 {
            let ev = c.classify(&tracked(500.0), i * 33);
            assert_eq!(ev.direction, GestureDirection::None);
        }
    }

    #[test]
    fn test_down_nod_is_one_shot() {
        let mut c = classifier();
        c.classify(&tracked(500.0), 0);

        let mut onsets = 0;
        let mut y = 500.0;
        for i in 1..10 {
            y += 6.0;
            let ev = c.classify(&tracked(y), i * 33);
            if ev.is_onset() {
                assert_eq!(ev.direction, GestureDirection::Down);
                onsets += 1;
            }
        }
        assert_eq!(onsets, 1, "one nod must produce exactly one onset");
        assert_eq!(c.current_direction(), GestureDirection::Down);
    }

    #[test]
    fn test_up_needs_larger_travel() {
        let mut c = classifier();
        c.classify(&tracked(500.0), 0);

        // 40px upward: enough for a down threshold but not for up
        let mut y = 500.0;
        for i in 1..=5 {
            y -= 8.0;
            let ev = c.classify(&tracked(y), i * 20);
            assert!(!ev.is_onset(), "40px upward must not classify");
        }

        // Keep going past 50px
        let mut saw_up = false;
        for i in 6..=9 {
            y -= 8.0;
            if c.classify(&tracked(y), i * 20).is_up_onset() {
                saw_up = true;
            }
        }
        assert!(saw_up);
    }

    #[test]
    fn test_cooldown_clears_and_rearms() {
        let mut c = classifier();
        c.classify(&tracked(500.0), 0);
        let mut y = 500.0;
        let mut t = 0;
        for _ in 0..6 {
            y += 6.0;
            t += 33;
            c.classify(&tracked(y), t);
        }
        assert_eq!(c.current_direction(), GestureDirection::Down);

        let latched = c.classify(&tracked(y), t + 100);
        assert_eq!(latched.direction, GestureDirection::Down);
        assert!(!latched.is_onset());
        assert!(latched.age_ms > 0);

        let cleared = c.classify(&tracked(y), t + 600);
        assert_eq!(cleared.direction, GestureDirection::None);
        assert_eq!(c.current_direction(), GestureDirection::None);
    }

    #[test]
    fn test_slow_drift_does_not_classify() {
        let mut c = classifier();
        // 1px per frame never exceeds the frame delta threshold
        for i in 0..200 {
            let ev = c.classify(&tracked(300.0 + i as f64), i * 33);
            assert!(!ev.is_onset());
        }
    }

    #[test]
    fn test_tracking_loss_suppresses_classification() {
        let mut c = classifier();
        c.classify(&tracked(500.0), 0);
        for i in 1..10 {
            let ev = c.classify(&lost(500.0 + i as f64 * 20.0), i * 33);
            assert!(!ev.is_onset());
        }
    }
}
