//! Signal Conditioner
//!
//! Smooths the raw per-frame pointer estimate and classifies coarse
//! vertical gestures from the smoothed stream.
//!
//! # Smoothing
//!
//! ```text
//! p(t) = p(t-1) + α * (mapped(t) - p(t-1))
//! ```
//!
//! The first tracked sample, and the first tracked sample after a loss,
//! initialise `p` directly to the mapped raw value. A reacquired signal
//! therefore resets rather than blending with stale history or
//! extrapolating across the gap.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::gesture::{GestureClassifier, GestureEvent};
use super::mapping::PointerMapper;
use crate::config::Config;

/// Unfiltered estimate for one camera frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Normalized horizontal position (0.0-1.0, camera space)
    pub x: f64,

    /// Normalized vertical position (0.0-1.0, camera space)
    pub y: f64,

    /// Tracking confidence (0.0-1.0)
    pub confidence: f64,

    /// Capture timestamp (ms)
    pub timestamp_ms: u64,
}

/// Conditioned pointer position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PointerSample {
    /// Screen X (pixels)
    pub x: f64,

    /// Screen Y (pixels)
    pub y: f64,

    /// False when the latest raw input lost the subject; (x, y) is then stale
    pub is_tracking: bool,
}

/// Output of one conditioning step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionedSample {
    /// Smoothed pointer
    pub pointer: PointerSample,

    /// Gesture classification for this frame
    pub gesture: GestureEvent,

    /// Source timestamp (ms)
    pub timestamp_ms: u64,

    /// True on the first tracked frame after a loss
    pub reacquired: bool,
}

/// Conditioner counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConditionerStats {
    /// Samples fed
    pub frames: u64,
    /// Samples without tracking
    pub frames_lost: u64,
    /// Loss-to-tracking transitions
    pub reacquisitions: u64,
}

/// Exponential moving average pointer conditioner
pub struct SignalConditioner {
    /// EMA blending factor
    alpha: f64,

    /// Minimum confidence to treat a sample as tracked
    min_confidence: f64,

    /// Normalized-to-screen mapping
    mapper: PointerMapper,

    /// Gesture window classifier
    gestures: GestureClassifier,

    /// Current conditioned output
    current: PointerSample,

    /// Whether `current` holds a tracked position to blend with
    has_history: bool,

    stats: ConditionerStats,
}

impl SignalConditioner {
    /// Create a conditioner from the engine configuration
    pub fn new(config: &Config) -> Self {
        Self {
            alpha: config.signal.alpha,
            min_confidence: config.signal.min_confidence,
            mapper: PointerMapper::new(&config.screen, &config.signal),
            gestures: GestureClassifier::new(config.gesture.clone(), config.screen.height),
            current: PointerSample::default(),
            has_history: false,
            stats: ConditionerStats::default(),
        }
    }

    /// Condition one raw sample
    pub fn feed(&mut self, raw: &RawSample) -> ConditionedSample {
        self.stats.frames += 1;

        let tracking = raw.confidence >= self.min_confidence
            && raw.x.is_finite()
            && raw.y.is_finite();

        if !tracking {
            self.stats.frames_lost += 1;
            if self.current.is_tracking {
                debug!(
                    "Tracking lost at {}ms (confidence {:.2})",
                    raw.timestamp_ms, raw.confidence
                );
            }
            // Hold the last position, drop history so reacquisition resets
            self.current.is_tracking = false;
            self.has_history = false;

            let gesture = self.gestures.classify(&self.current, raw.timestamp_ms);
            return ConditionedSample {
                pointer: self.current,
                gesture,
                timestamp_ms: raw.timestamp_ms,
                reacquired: false,
            };
        }

        let (mapped_x, mapped_y) = self.mapper.to_screen(raw.x, raw.y);
        let mut reacquired = false;

        if self.has_history {
            self.current.x += self.alpha * (mapped_x - self.current.x);
            self.current.y += self.alpha * (mapped_y - self.current.y);
        } else {
            if self.stats.frames > 1 {
                reacquired = true;
                self.stats.reacquisitions += 1;
                debug!(
                    "Tracking reacquired at {}ms: ({:.1}, {:.1})",
                    raw.timestamp_ms, mapped_x, mapped_y
                );
            }
            self.current.x = mapped_x;
            self.current.y = mapped_y;
            self.gestures.rearm(mapped_y, raw.timestamp_ms);
            self.has_history = true;
        }
        self.current.is_tracking = true;

        let gesture = self.gestures.classify(&self.current, raw.timestamp_ms);

        trace!(
            "Conditioned: raw=({:.3}, {:.3}) mapped=({:.1}, {:.1}) smooth=({:.1}, {:.1})",
            raw.x,
            raw.y,
            mapped_x,
            mapped_y,
            self.current.x,
            self.current.y
        );

        ConditionedSample {
            pointer: self.current,
            gesture,
            timestamp_ms: raw.timestamp_ms,
            reacquired,
        }
    }

    /// Latest conditioned pointer
    pub fn pointer(&self) -> PointerSample {
        self.current
    }

    /// Update sensitivity at runtime
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.mapper.set_sensitivity(sensitivity);
    }

    /// Current sensitivity
    pub fn sensitivity(&self) -> f64 {
        self.mapper.sensitivity()
    }

    /// Screen mapping in use
    pub fn mapper(&self) -> &PointerMapper {
        &self.mapper
    }

    /// Diagnostic counters
    pub fn stats(&self) -> ConditionerStats {
        self.stats
    }

    /// Total gestures classified
    pub fn gestures_classified(&self) -> u64 {
        self.gestures.classified_count()
    }

    /// Drop all smoothing and gesture history
    pub fn reset(&mut self) {
        self.current = PointerSample::default();
        self.has_history = false;
        self.gestures.reset();
    }
}
