//! A single particle

use crate::core::object::ObjectId;
use crate::math::{compose_transform, euler_to_quat};
use crate::render::Color;
use glam::{Mat4, Vec3};

/// Stable identity of a particle: its emitter plus a per-emitter serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleId {
    pub emitter: ObjectId,
    pub serial: u64,
}

/// An ephemeral simulated point owned by an emitter.
///
/// Kinematic particles store their position relative to the emitter;
/// collider-backed particles store the world pose of their rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub color: Color,
    /// Seconds left to live
    pub lifetime: f32,
    pub(crate) pid: Option<usize>,
    pub(crate) cpid: Option<usize>,
}

impl Particle {
    /// Whether the particle is backed by a rigid body
    pub fn is_simulated(&self) -> bool {
        self.pid.is_some()
    }

    pub fn pid(&self) -> Option<usize> {
        self.pid
    }

    pub fn cpid(&self) -> Option<usize> {
        self.cpid
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    pub fn forward(&self) -> Vec3 {
        euler_to_quat(self.rotation) * Vec3::Z
    }

    /// World transform, given the emitter's global position
    pub fn transform(&self, emitter_position: Vec3) -> Mat4 {
        let position = if self.is_simulated() {
            self.position
        } else {
            emitter_position + self.position
        };
        compose_transform(position, self.rotation, self.scale)
    }
}
