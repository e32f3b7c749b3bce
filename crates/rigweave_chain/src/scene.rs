// SPDX-License-Identifier: MIT OR Apache-2.0
//! The seam to the host scene: body lookup and world transforms.
//!
//! Transforms stay host-owned; the rig only reads them at build time and
//! whenever the host pushes an update.

use crate::chain::BodyId;
use glam::Mat4;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a body identifier resolves to in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// A rigid skeletal joint
    Joint,
    /// Anything else (locator, mesh, group, ...)
    Other,
}

/// Host-side resolution of body identifiers
pub trait SceneSource {
    /// The body's current world transform, if it resolves
    fn world_matrix(&self, body: &BodyId) -> Option<Mat4>;

    /// The body's kind, if it resolves
    fn body_kind(&self, body: &BodyId) -> Option<BodyKind>;
}

/// A body entry in a [`MemoryScene`]
#[derive(Debug, Clone, Copy)]
pub struct SceneBody {
    /// Body kind
    pub kind: BodyKind,
    /// World transform
    pub world: Mat4,
}

/// A simple in-memory [`SceneSource`].
///
/// Used by tests and examples; an embedding host with its own scene graph
/// implements [`SceneSource`] directly instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    bodies: IndexMap<BodyId, SceneBody>,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a body
    pub fn insert(&mut self, body: impl Into<BodyId>, kind: BodyKind, world: Mat4) {
        self.bodies.insert(body.into(), SceneBody { kind, world });
    }

    /// Add or replace a joint
    pub fn insert_joint(&mut self, body: impl Into<BodyId>, world: Mat4) {
        self.insert(body, BodyKind::Joint, world);
    }

    /// Update a body's world transform; returns false if it is unknown
    pub fn set_world(&mut self, body: &BodyId, world: Mat4) -> bool {
        match self.bodies.get_mut(body) {
            Some(entry) => {
                entry.world = world;
                true
            }
            None => false,
        }
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the scene is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl SceneSource for MemoryScene {
    fn world_matrix(&self, body: &BodyId) -> Option<Mat4> {
        self.bodies.get(body).map(|b| b.world)
    }

    fn body_kind(&self, body: &BodyId) -> Option<BodyKind> {
        self.bodies.get(body).map(|b| b.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut scene = MemoryScene::new();
        scene.insert_joint("wrist", Mat4::IDENTITY);
        scene.insert("marker", BodyKind::Other, Mat4::IDENTITY);

        let wrist = BodyId::from("wrist");
        assert_eq!(scene.body_kind(&wrist), Some(BodyKind::Joint));
        assert_eq!(
            scene.body_kind(&BodyId::from("marker")),
            Some(BodyKind::Other)
        );
        assert!(scene.world_matrix(&BodyId::from("missing")).is_none());
    }

    #[test]
    fn test_set_world() {
        let mut scene = MemoryScene::new();
        scene.insert_joint("wrist", Mat4::IDENTITY);
        let wrist = BodyId::from("wrist");
        let moved = Mat4::from_translation(glam::Vec3::X);
        assert!(scene.set_world(&wrist, moved));
        assert_eq!(scene.world_matrix(&wrist), Some(moved));
        assert!(!scene.set_world(&BodyId::from("missing"), moved));
    }
}
