//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Screen geometry the pointer is mapped onto
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Screen width in pixels
    #[serde(default = "default_screen_width")]
    pub width: f64,

    /// Screen height in pixels
    #[serde(default = "default_screen_height")]
    pub height: f64,
}

fn default_screen_width() -> f64 {
    1280.0
}
fn default_screen_height() -> f64 {
    720.0
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

/// Signal conditioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// EMA blending factor (0.0-1.0, higher = more responsive, more jitter)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Scale factor applied about the screen center
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Minimum tracking confidence for a sample to count as tracked
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Mirror horizontally to match a mirrored camera preview
    #[serde(default = "default_mirror_x")]
    pub mirror_x: bool,
}

fn default_alpha() -> f64 {
    0.3
}
fn default_sensitivity() -> f64 {
    1.5
}
fn default_min_confidence() -> f64 {
    0.5
}
fn default_mirror_x() -> bool {
    true
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            sensitivity: default_sensitivity(),
            min_confidence: default_min_confidence(),
            mirror_x: default_mirror_x(),
        }
    }
}

/// Vertical gesture classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Minimum frame-to-frame vertical motion (pixels)
    #[serde(default = "default_min_frame_delta_px")]
    pub min_frame_delta_px: f64,

    /// Cumulative downward motion, as a fraction of screen height
    #[serde(default = "default_down_fraction")]
    pub down_fraction: f64,

    /// Cumulative upward motion, as a fraction of screen height
    #[serde(default = "default_up_fraction")]
    pub up_fraction: f64,

    /// Time a classified gesture stays latched before clearing (ms)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Maximum age of the gesture window anchor (ms)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_min_frame_delta_px() -> f64 {
    2.0
}
fn default_down_fraction() -> f64 {
    0.02
}
fn default_up_fraction() -> f64 {
    0.05
}
fn default_cooldown_ms() -> u64 {
    500
}
fn default_window_ms() -> u64 {
    800
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_frame_delta_px: default_min_frame_delta_px(),
            down_fraction: default_down_fraction(),
            up_fraction: default_up_fraction(),
            cooldown_ms: default_cooldown_ms(),
            window_ms: default_window_ms(),
        }
    }
}

/// How a fully charged target is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmMode {
    /// Confirm as soon as the dwell completes
    Dwell,

    /// Wait in ReadyToConfirm for a downward nod
    #[default]
    DwellGesture,
}

impl std::fmt::Display for ConfirmMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dwell => write!(f, "dwell"),
            Self::DwellGesture => write!(f, "dwell_gesture"),
        }
    }
}

impl std::str::FromStr for ConfirmMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dwell" | "auto" => Ok(Self::Dwell),
            "dwell_gesture" | "dwell-gesture" | "gesture" | "nod" => Ok(Self::DwellGesture),
            _ => Err(format!("Unknown confirm mode: {}", s)),
        }
    }
}

/// Dwell/charge policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellConfig {
    /// Time the pointer must stay in the inner region (ms)
    #[serde(default = "default_dwell_ms")]
    pub duration_ms: u64,

    /// Inner region margin, fraction of width/height removed per side
    #[serde(default = "default_inner_margin")]
    pub inner_margin: f64,

    /// Progress publication cadence while charging (ms)
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,

    /// Confirmation policy
    #[serde(default)]
    pub confirm_mode: ConfirmMode,

    /// Upward nod cancels a charge in progress
    #[serde(default = "default_cancel_on_up")]
    pub cancel_on_up_gesture: bool,
}

fn default_dwell_ms() -> u64 {
    1200
}
fn default_inner_margin() -> f64 {
    0.10
}
fn default_progress_tick_ms() -> u64 {
    50
}
fn default_cancel_on_up() -> bool {
    true
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_dwell_ms(),
            inner_margin: default_inner_margin(),
            progress_tick_ms: default_progress_tick_ms(),
            confirm_mode: ConfirmMode::default(),
            cancel_on_up_gesture: default_cancel_on_up(),
        }
    }
}

/// Grace period after drifting off a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraceConfig {
    /// Hold duration (ms), 0 disables grace
    #[serde(default = "default_grace_ms")]
    pub duration_ms: u64,

    /// Also hold HoverOuter/Charging, not only ReadyToConfirm
    #[serde(default)]
    pub apply_to_charging: bool,
}

fn default_grace_ms() -> u64 {
    1000
}

impl Default for GraceConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_grace_ms(),
            apply_to_charging: false,
        }
    }
}

/// Inactivity watchdog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Force Idle after this long without a pointer update (ms)
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,

    /// Watchdog tick cadence (ms)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_inactivity_timeout_ms() -> u64 {
    12_000
}
fn default_tick_ms() -> u64 {
    1000
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files (None = console only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}
