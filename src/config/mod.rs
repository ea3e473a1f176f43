//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments
//!
//! Every field carries a serde default, so a file only needs the keys it
//! changes:
//!
//! ```toml
//! [dwell]
//! duration_ms = 1500
//! confirm_mode = "dwell"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod types;

pub use types::{
    ConfirmMode, DwellConfig, GestureConfig, GraceConfig, LoggingConfig, ScreenConfig,
    SignalConfig, WatchdogConfig,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Screen geometry
    #[serde(default)]
    pub screen: ScreenConfig,
    /// Signal conditioning
    #[serde(default)]
    pub signal: SignalConfig,
    /// Gesture classification
    #[serde(default)]
    pub gesture: GestureConfig,
    /// Dwell/charge policy
    #[serde(default)]
    pub dwell: DwellConfig,
    /// Grace period
    #[serde(default)]
    pub grace: GraceConfig,
    /// Inactivity watchdog
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.screen.width > 0.0
            && self.screen.height > 0.0
            && self.screen.width.is_finite()
            && self.screen.height.is_finite())
        {
            anyhow::bail!(
                "Invalid screen size: {}x{}",
                self.screen.width,
                self.screen.height
            );
        }

        if !(self.signal.alpha > 0.0 && self.signal.alpha <= 1.0) {
            anyhow::bail!("Invalid EMA alpha: {} (expected 0 < alpha <= 1)", self.signal.alpha);
        }

        if !(self.signal.sensitivity > 0.0 && self.signal.sensitivity.is_finite()) {
            anyhow::bail!("Invalid sensitivity: {}", self.signal.sensitivity);
        }

        if !(0.0..=1.0).contains(&self.signal.min_confidence) {
            anyhow::bail!(
                "Invalid min_confidence: {} (expected 0..=1)",
                self.signal.min_confidence
            );
        }

        let thresholds = [
            self.gesture.min_frame_delta_px,
            self.gesture.down_fraction,
            self.gesture.up_fraction,
        ];
        if !thresholds.iter().all(|t| *t >= 0.0 && t.is_finite()) {
            anyhow::bail!("Gesture thresholds must be finite and not negative");
        }

        if self.dwell.duration_ms == 0 {
            anyhow::bail!("Dwell duration must be greater than zero");
        }

        if !(0.0..0.5).contains(&self.dwell.inner_margin) {
            anyhow::bail!(
                "Invalid inner margin: {} (expected 0 <= margin < 0.5)",
                self.dwell.inner_margin
            );
        }

        if self.dwell.progress_tick_ms == 0 {
            anyhow::bail!("Progress tick must be greater than zero");
        }

        if self.watchdog.tick_ms == 0 {
            anyhow::bail!("Watchdog tick must be greater than zero");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        sensitivity: Option<f64>,
        confirm_mode: Option<ConfirmMode>,
    ) -> Self {
        if let Some(sensitivity) = sensitivity {
            self.signal.sensitivity = sensitivity;
        }
        if let Some(mode) = confirm_mode {
            self.dwell.confirm_mode = mode;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config().unwrap();
        assert_eq!(config.signal.alpha, 0.3);
        assert_eq!(config.dwell.confirm_mode, ConfirmMode::DwellGesture);
        assert_eq!(config.watchdog.inactivity_timeout_ms, 12_000);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [dwell]
            duration_ms = 1000
            confirm_mode = "dwell"
            "#,
        )
        .unwrap();

        assert_eq!(config.dwell.duration_ms, 1000);
        assert_eq!(config.dwell.confirm_mode, ConfirmMode::Dwell);
        assert_eq!(config.dwell.inner_margin, 0.10);
        assert_eq!(config.screen.width, 1280.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let mut config = Config::default();
        config.signal.alpha = 0.0;
        assert!(config.validate().is_err());

        config.signal.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_margin_rejected() {
        let mut config = Config::default();
        config.dwell.inner_margin = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut config = Config::default();
        config.screen.width = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.screen.height = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gesture.down_fraction = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gesture.min_frame_delta_px = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.signal.min_confidence = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some(2.0), Some(ConfirmMode::Dwell));
        assert_eq!(config.signal.sensitivity, 2.0);
        assert_eq!(config.dwell.confirm_mode, ConfirmMode::Dwell);
    }

    #[test]
    fn test_confirm_mode_parse() {
        assert_eq!("auto".parse::<ConfirmMode>(), Ok(ConfirmMode::Dwell));
        assert_eq!("nod".parse::<ConfirmMode>(), Ok(ConfirmMode::DwellGesture));
        assert!("blink".parse::<ConfirmMode>().is_err());
    }
}
