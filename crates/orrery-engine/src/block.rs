//! The block plug-in interface.
//!
//! Tenants supply [`Block`] implementations; the engine only ever asks a
//! block for its mass, face materials, outline, and a per-tick update. An
//! object's cached mass and gravity center are rebuilt from its blocks every
//! tick.

use std::sync::Arc;

use orrery_math::Cube;
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::object::Object;

/// One of the six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// +Y face.
    Top,
    /// -Y face.
    Bottom,
    /// -X face.
    Left,
    /// +X face.
    Right,
    /// +Z face.
    Front,
    /// -Z face.
    Back,
}

/// A tenant-implemented building block of an object.
///
/// Implementations must be `Send + Sync`: blocks are ticked from worker
/// threads. A block that needs to push on its object should retain the weak
/// back-reference it receives in [`set_object`](Block::set_object) and call
/// [`Object::apply_force`] from its [`tick`](Block::tick).
pub trait Block: Send + Sync {
    /// Called at commit time after the block joins an object (or moves
    /// between objects). The block may retain a weak back-reference; it must
    /// not call back into the engine from here.
    fn set_object(&self, o: &Arc<Object>);

    /// The block's current mass, kg. May change across ticks.
    fn mass(&self) -> f64;

    /// The material of the given face, if any.
    fn material(&self, face: Facing) -> Option<Arc<Material>>;

    /// The block's position and maximum extent in the object's local frame.
    fn outline(&self) -> Cube;

    /// Advance the block by `dt` seconds of the block's proper time.
    fn tick(&self, dt: f64);
}
