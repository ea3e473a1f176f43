//! Target identifiers and rectangles

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{EngineError, Result};

/// Identifier of a selectable on-screen element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetId(Arc<str>);

impl TargetId {
    /// Create an identifier, rejecting empty strings
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(EngineError::EmptyTargetId);
        }
        Ok(Self(Arc::from(id)))
    }

    /// Borrow as str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl TryFrom<String> for TargetId {
    type Error = EngineError;

    fn try_from(id: String) -> Result<Self> {
        Self::new(id)
    }
}

impl From<TargetId> for String {
    fn from(id: TargetId) -> Self {
        id.0.to_string()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which part of a target a point falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitRegion {
    /// Outside the rect
    Miss,
    /// Inside the rect but within the margin band
    Outer,
    /// Inside the shrunken inner rect
    Inner,
}

/// Axis-aligned bounding box of a target (screen pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl TargetRect {
    /// Create a rect
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Finite origin and strictly positive finite size
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Validate against the target it belongs to
    pub fn validate(&self, id: &TargetId) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(EngineError::InvalidTargetRect {
                id: id.to_string(),
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Half-open containment `[x, x+w) x [y, y+h)`
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Rect shrunk by `margin` of width/height on every side
    pub fn inner(&self, margin: f64) -> TargetRect {
        let dx = self.width * margin;
        let dy = self.height * margin;
        TargetRect {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width - 2.0 * dx,
            height: self.height - 2.0 * dy,
        }
    }

    /// Classify a point against the outer and inner regions
    pub fn hit_region(&self, px: f64, py: f64, margin: f64) -> HitRegion {
        if !self.contains_point(px, py) {
            HitRegion::Miss
        } else if self.inner(margin).contains_point(px, py) {
            HitRegion::Inner
        } else {
            HitRegion::Outer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_rect() {
        let rect = TargetRect::new(100.0, 100.0, 200.0, 200.0);
        let inner = rect.inner(0.10);
        assert_eq!(inner, TargetRect::new(120.0, 120.0, 160.0, 160.0));
    }

    #[test]
    fn test_hit_regions() {
        let rect = TargetRect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(rect.hit_region(150.0, 150.0, 0.1), HitRegion::Inner);
        assert_eq!(rect.hit_region(105.0, 105.0, 0.1), HitRegion::Outer);
        assert_eq!(rect.hit_region(400.0, 400.0, 0.1), HitRegion::Miss);
        // Right/bottom edges are exclusive
        assert_eq!(rect.hit_region(300.0, 150.0, 0.1), HitRegion::Miss);
        assert_eq!(rect.hit_region(100.0, 100.0, 0.1), HitRegion::Outer);
    }

    #[test]
    fn test_validation() {
        let id = TargetId::from("want");
        assert!(TargetRect::new(0.0, 0.0, 10.0, 10.0).validate(&id).is_ok());
        assert!(TargetRect::new(0.0, 0.0, 0.0, 10.0).validate(&id).is_err());
        assert!(TargetRect::new(f64::NAN, 0.0, 10.0, 10.0).validate(&id).is_err());
        assert!(TargetRect::new(0.0, 0.0, 10.0, f64::INFINITY).validate(&id).is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(TargetId::new("").is_err());
        assert_eq!(TargetId::new("yes").unwrap().as_str(), "yes");
    }

    #[test]
    fn test_empty_id_rejected_on_deserialize() {
        assert!(serde_json::from_str::<TargetId>(r#""""#).is_err());
        let id: TargetId = serde_json::from_str(r#""yes""#).unwrap();
        assert_eq!(id.as_str(), "yes");
    }
}
