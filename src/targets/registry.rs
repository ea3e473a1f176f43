//! Target Registry implementation
//!
//! Live mapping from target id to its current screen rectangle. Written by
//! the presentation layer whenever layout is measured, read by the
//! interaction machine through immutable snapshots.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::rect::{HitRegion, TargetId, TargetRect};
use crate::error::{EngineError, Result};

/// Immutable view of the registry for one update cycle
///
/// Cheap to clone; iteration is ordered by id, so first-match hit testing
/// is deterministic even when a caller registers overlapping targets.
#[derive(Debug, Clone, Default)]
pub struct TargetSnapshot {
    targets: Arc<BTreeMap<TargetId, TargetRect>>,
    revision: u64,
}

impl TargetSnapshot {
    /// Rect of a target, if still registered
    pub fn get(&self, id: &TargetId) -> Option<&TargetRect> {
        self.targets.get(id)
    }

    /// Whether a target is registered
    pub fn contains(&self, id: &TargetId) -> bool {
        self.targets.contains_key(id)
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when no targets are registered
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Registry revision this snapshot was taken at
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate targets in id order
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &TargetRect)> {
        self.targets.iter()
    }

    /// First target whose outer rect contains the point
    pub fn hit_test(&self, x: f64, y: f64, margin: f64) -> Option<(&TargetId, HitRegion)> {
        self.targets.iter().find_map(|(id, rect)| {
            match rect.hit_region(x, y, margin) {
                HitRegion::Miss => None,
                region => Some((id, region)),
            }
        })
    }

    /// Region of one specific target (Miss when it is gone)
    pub fn region_of(&self, id: &TargetId, x: f64, y: f64, margin: f64) -> HitRegion {
        self.targets
            .get(id)
            .map(|rect| rect.hit_region(x, y, margin))
            .unwrap_or(HitRegion::Miss)
    }
}

/// Target registry
#[derive(Debug, Default)]
pub struct TargetRegistry {
    /// Copy-on-write map shared with outstanding snapshots
    targets: Arc<BTreeMap<TargetId, TargetRect>>,

    /// Bumped on every effective change
    revision: u64,
}

impl TargetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a target (last write wins)
    ///
    /// Registering an identical rect is a no-op and does not bump the revision.
    pub fn register(&mut self, id: TargetId, rect: TargetRect) -> Result<()> {
        if id.is_empty() {
            warn!("Rejected target registration with an empty id");
            return Err(EngineError::EmptyTargetId);
        }
        if let Err(e) = rect.validate(&id) {
            warn!("Rejected target registration: {}", e);
            return Err(e);
        }

        if self.targets.get(&id) == Some(&rect) {
            return Ok(());
        }

        debug!(
            "Register target '{}': ({:.0}, {:.0}) {:.0}x{:.0}",
            id, rect.x, rect.y, rect.width, rect.height
        );
        Arc::make_mut(&mut self.targets).insert(id, rect);
        self.revision += 1;
        Ok(())
    }

    /// Remove a target; absent ids are ignored
    pub fn unregister(&mut self, id: &TargetId) -> bool {
        if !self.targets.contains_key(id) {
            return false;
        }
        Arc::make_mut(&mut self.targets).remove(id);
        self.revision += 1;
        debug!("Unregister target '{}'", id);
        true
    }

    /// Remove every target (view navigation)
    pub fn clear(&mut self) {
        if self.targets.is_empty() {
            return;
        }
        info!("Clearing {} targets", self.targets.len());
        self.targets = Arc::new(BTreeMap::new());
        self.revision += 1;
    }

    /// Immutable view for one update cycle
    pub fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            targets: Arc::clone(&self.targets),
            revision: self.revision,
        }
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Registry handle shared between the layout producer and the engine
#[derive(Debug, Clone, Default)]
pub struct SharedTargetRegistry {
    inner: Arc<RwLock<TargetRegistry>>,
}

impl SharedTargetRegistry {
    /// Create an empty shared registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a target
    pub fn register(&self, id: impl Into<TargetId>, rect: TargetRect) -> Result<()> {
        self.inner.write().register(id.into(), rect)
    }

    /// Remove a target
    pub fn unregister(&self, id: &TargetId) -> bool {
        self.inner.write().unregister(id)
    }

    /// Remove every target
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Immutable view for one update cycle
    pub fn snapshot(&self) -> TargetSnapshot {
        self.inner.read().snapshot()
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64) -> TargetRect {
        TargetRect::new(x, y, 100.0, 100.0)
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry = TargetRegistry::new();
        registry.register("yes".into(), rect(0.0, 0.0)).unwrap();
        registry.register("yes".into(), rect(50.0, 50.0)).unwrap();

        assert_eq!(registry.len(), 1);
        let snap = registry.snapshot();
        assert_eq!(snap.get(&"yes".into()), Some(&rect(50.0, 50.0)));
    }

    #[test]
    fn test_identical_register_is_noop() {
        let mut registry = TargetRegistry::new();
        registry.register("yes".into(), rect(0.0, 0.0)).unwrap();
        let rev = registry.revision();
        registry.register("yes".into(), rect(0.0, 0.0)).unwrap();
        assert_eq!(registry.revision(), rev);
    }

    #[test]
    fn test_invalid_rect_leaves_registry_untouched() {
        let mut registry = TargetRegistry::new();
        registry.register("yes".into(), rect(0.0, 0.0)).unwrap();
        let result = registry.register("yes".into(), TargetRect::new(0.0, 0.0, -5.0, 10.0));
        assert!(result.is_err());
        assert_eq!(registry.snapshot().get(&"yes".into()), Some(&rect(0.0, 0.0)));
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut registry = TargetRegistry::new();
        let result = registry.register("".into(), rect(0.0, 0.0));
        assert!(matches!(result, Err(EngineError::EmptyTargetId)));
        assert!(registry.is_empty());
        assert_eq!(registry.revision(), 0);

        let shared = SharedTargetRegistry::new();
        assert!(shared.register("", rect(0.0, 0.0)).is_err());
        assert!(shared.is_empty());
    }

    #[test]
    fn test_snapshot_isolated_from_later_writes() {
        let mut registry = TargetRegistry::new();
        registry.register("yes".into(), rect(0.0, 0.0)).unwrap();
        let snap = registry.snapshot();

        registry.unregister(&"yes".into());
        registry.register("no".into(), rect(200.0, 0.0)).unwrap();

        assert!(snap.contains(&"yes".into()));
        assert!(!snap.contains(&"no".into()));
        assert!(!registry.snapshot().contains(&"yes".into()));
    }

    #[test]
    fn test_unregister_absent_is_not_error() {
        let mut registry = TargetRegistry::new();
        assert!(!registry.unregister(&"ghost".into()));
    }

    #[test]
    fn test_hit_test_first_match_in_id_order() {
        let mut registry = TargetRegistry::new();
        registry.register("b".into(), rect(0.0, 0.0)).unwrap();
        registry.register("a".into(), rect(50.0, 50.0)).unwrap();

        let snap = registry.snapshot();
        let (id, _) = snap.hit_test(75.0, 75.0, 0.1).unwrap();
        assert_eq!(id.as_str(), "a");
        assert!(snap.hit_test(500.0, 500.0, 0.1).is_none());
    }

    #[test]
    fn test_region_of_removed_target_is_miss() {
        let snap = TargetRegistry::new().snapshot();
        assert_eq!(
            snap.region_of(&"gone".into(), 10.0, 10.0, 0.1),
            HitRegion::Miss
        );
    }

    #[test]
    fn test_shared_registry_across_threads() {
        let shared = SharedTargetRegistry::new();
        let producer = shared.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..50 {
                producer
                    .register(format!("t{}", i).as_str(), rect(i as f64 * 10.0, 0.0))
                    .unwrap();
            }
        });
        handle.join().unwrap();

        assert_eq!(shared.len(), 50);
        shared.clear();
        assert!(shared.is_empty());
    }
}
