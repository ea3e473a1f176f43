//! Coordinate Mapping
//!
//! Maps normalized camera-space estimates onto screen pixels: horizontal
//! mirroring to match the mirrored preview, sensitivity scaling about the
//! screen center, then clamping into the screen rectangle.

use tracing::debug;

use crate::config::{ScreenConfig, SignalConfig};

/// Screen-space mapping for normalized pointer estimates
#[derive(Debug, Clone)]
pub struct PointerMapper {
    /// Screen width (pixels)
    width: f64,

    /// Screen height (pixels)
    height: f64,

    /// Scale applied about the center (1.0 = camera field maps to full screen)
    sensitivity: f64,

    /// Flip X to match a mirrored camera preview
    mirror_x: bool,
}

impl PointerMapper {
    /// Create a mapper for the given screen and signal settings
    pub fn new(screen: &ScreenConfig, signal: &SignalConfig) -> Self {
        Self {
            width: screen.width,
            height: screen.height,
            sensitivity: signal.sensitivity,
            mirror_x: signal.mirror_x,
        }
    }

    /// Map normalized `[0, 1]` coordinates to screen pixels
    pub fn to_screen(&self, norm_x: f64, norm_y: f64) -> (f64, f64) {
        let x = if self.mirror_x { 1.0 - norm_x } else { norm_x };

        // Amplify small head movements around the screen center
        let scaled_x = 0.5 + (x - 0.5) * self.sensitivity;
        let scaled_y = 0.5 + (norm_y - 0.5) * self.sensitivity;

        self.clamp_to_bounds(scaled_x * self.width, scaled_y * self.height)
    }

    /// Clamp a pixel position into the screen rectangle
    ///
    /// The far edges are exclusive, like target containment, so a pointer
    /// pinned to the right or bottom edge still hits a target touching it.
    pub fn clamp_to_bounds(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.max(0.0).min(just_below(self.width)),
            y.max(0.0).min(just_below(self.height)),
        )
    }

    /// Update sensitivity at runtime
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        if sensitivity > 0.0 && sensitivity.is_finite() {
            debug!("Sensitivity {:.2} -> {:.2}", self.sensitivity, sensitivity);
            self.sensitivity = sensitivity;
        }
    }

    /// Current sensitivity
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Screen width (pixels)
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Screen height (pixels)
    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Largest f64 strictly below a positive finite `limit`
fn just_below(limit: f64) -> f64 {
    if limit > 0.0 && limit.is_finite() {
        f64::from_bits(limit.to_bits() - 1)
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{HitRegion, TargetRect};

    fn mapper(sensitivity: f64, mirror_x: bool) -> PointerMapper {
        let screen = ScreenConfig {
            width: 1000.0,
            height: 500.0,
        };
        let signal = SignalConfig {
            sensitivity,
            mirror_x,
            ..SignalConfig::default()
        };
        PointerMapper::new(&screen, &signal)
    }

    #[test]
    fn test_center_is_fixed_point() {
        let m = mapper(2.5, true);
        assert_eq!(m.to_screen(0.5, 0.5), (500.0, 250.0));
    }

    #[test]
    fn test_mirroring() {
        let m = mapper(1.0, true);
        let (x, y) = m.to_screen(0.25, 0.25);
        assert_eq!(x, 750.0);
        assert_eq!(y, 125.0);

        let m = mapper(1.0, false);
        assert_eq!(m.to_screen(0.25, 0.25).0, 250.0);
    }

    #[test]
    fn test_sensitivity_amplifies_and_clamps() {
        let m = mapper(2.0, false);
        // 0.1 off center becomes 0.2 off center
        let (x, _) = m.to_screen(0.6, 0.5);
        assert!((x - 700.0).abs() < 1e-9);

        // Far off center clamps to the screen edge
        let (x, y) = m.to_screen(1.0, 0.0);
        assert!(x < 1000.0 && x > 999.999);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_pinned_pointer_hits_edge_target() {
        let m = mapper(3.0, false);
        let (x, y) = m.to_screen(1.0, 1.0);

        let corner = TargetRect::new(900.0, 400.0, 100.0, 100.0);
        assert!(corner.contains_point(x, y));
        assert_eq!(corner.hit_region(x, y, 0.1), HitRegion::Outer);
    }

    #[test]
    fn test_rejects_bad_sensitivity() {
        let mut m = mapper(1.5, true);
        m.set_sensitivity(0.0);
        assert_eq!(m.sensitivity(), 1.5);
        m.set_sensitivity(f64::NAN);
        assert_eq!(m.sensitivity(), 1.5);
        m.set_sensitivity(3.0);
        assert_eq!(m.sensitivity(), 3.0);
    }
}
