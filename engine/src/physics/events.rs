//! Collision events delivered to physics bodies and particle emitters

use super::commands::PhysicsCommands;
use crate::core::object::{ObjectId, Objects};
use crate::particle::ParticleId;
use glam::Vec3;

/// Contact data shared by every collision event.
///
/// Oriented from the receiver's point of view: `contact_point` lies on the
/// other participant, `normal` points from the receiver towards it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBase {
    pub contact_point: Vec3,
    pub normal: Vec3,
    /// Triangle of the other participant's mesh collider, -1 if not a mesh
    pub face_id: i32,
}

impl CollisionBase {
    pub fn new(contact_point: Vec3, normal: Vec3, face_id: i32) -> Self {
        Self {
            contact_point,
            normal,
            face_id,
        }
    }
}

/// Contact with another physics body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub base: CollisionBase,
    pub other: ObjectId,
}

/// Contact with a collider-backed particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleCollision {
    pub base: CollisionBase,
    pub other: ParticleId,
}

/// What a collision callback may touch while dispatch is running
pub struct CollisionContext<'a> {
    pub objects: &'a mut Objects,
    pub commands: &'a mut PhysicsCommands,
}

pub type CollisionCallback =
    Box<dyn FnMut(&mut CollisionContext<'_>, &Collision) + Send + Sync>;

pub type ParticleCollisionCallback =
    Box<dyn FnMut(&mut CollisionContext<'_>, &ParticleCollision) + Send + Sync>;

/// Emitter listener, called with the particle that was hit
pub type EmitterCollisionCallback =
    Box<dyn FnMut(&mut CollisionContext<'_>, &Collision, ParticleId) + Send + Sync>;
