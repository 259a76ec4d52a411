use tracing::trace;

use crate::error::Result;
use crate::scene::Scene;

use super::{detect_rooms_with, DetectedRoom, RoomDetectionConfig};

/// Memoized room detection keyed on the scene's topology revision.
///
/// Label edits and room reconciliation leave the revision alone, so they do
/// not invalidate the cache.
#[derive(Debug, Clone, Default)]
pub struct RoomCache {
    config: RoomDetectionConfig,
    entry: Option<(u64, Vec<DetectedRoom>)>,
}

impl RoomCache {
    /// Creates an empty cache using `config` for detection.
    #[must_use]
    pub fn new(config: RoomDetectionConfig) -> Self {
        Self {
            config,
            entry: None,
        }
    }

    /// Detected rooms of `scene`, recomputed only when its revision differs
    /// from the last call.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if a wall references a missing node.
    pub fn rooms(&mut self, scene: &Scene) -> Result<&[DetectedRoom]> {
        let revision = scene.revision();
        let fresh = match self.entry.take() {
            Some((cached, rooms)) if cached == revision => {
                trace!(revision, "room cache hit");
                rooms
            }
            _ => detect_rooms_with(scene, &self.config)?,
        };
        Ok(&self.entry.insert((revision, fresh)).1)
    }

    /// Whether the cache holds rooms for `scene`'s current revision.
    #[must_use]
    pub fn is_current(&self, scene: &Scene) -> bool {
        matches!(&self.entry, Some((revision, _)) if *revision == scene.revision())
    }

    /// Drops the cached result.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
