//! Physics error type

use crate::core::object::ObjectId;
use thiserror::Error;

/// Errors returned by physics operations that need a live solver body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// The body exists but has no solver body yet (it is created on its first update)
    #[error("Physics body {object:?} is not simulated yet")]
    NotSimulated { object: ObjectId },

    #[error("Object {0:?} has no physics body")]
    NotAPhysicsBody(ObjectId),

    #[error("Object {0:?} is not a collider")]
    NotACollider(ObjectId),

    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    #[error("No collision shape at index {0}")]
    UnknownShape(usize),

    #[error("Unknown collision layer {0}")]
    UnknownLayer(usize),

    #[error("All 32 collision layers are in use")]
    LayerLimit,

    #[error("Basis index {0} out of range (expected 0..3)")]
    InvalidBasisIndex(usize),
}
