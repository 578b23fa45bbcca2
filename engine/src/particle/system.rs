//! Particle system template

use crate::physics::CollisionShapeKind;
use crate::render::{Color, MaterialHandle, MeshHandle};
use serde::{Deserialize, Serialize};

/// Emission rate settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emission {
    /// Particles spawned per second while playing
    pub rate_over_time: f32,
}

impl Default for Emission {
    fn default() -> Self {
        Self {
            rate_over_time: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmitterShapeKind {
    #[default]
    Cone,
}

/// Where particles spawn and which way they leave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterShape {
    pub kind: EmitterShapeKind,
    /// Radius of the spawn disc around the emitter
    pub radius: f32,
    /// Largest tilt from the emitter's forward axis, in degrees
    pub angle: f32,
}

impl Default for EmitterShape {
    fn default() -> Self {
        Self {
            kind: EmitterShapeKind::Cone,
            radius: 1.0,
            angle: 35.0,
        }
    }
}

/// Collider-backed particle settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCollisionSettings {
    /// Back every particle with its own rigid body
    pub use_colliders: bool,
    pub shape: CollisionShapeKind,
    pub mass: f32,
    /// Fraction of the start lifetime lost on each collision
    pub lifetime_loss: f32,
}

impl Default for ParticleCollisionSettings {
    fn default() -> Self {
        Self {
            use_colliders: false,
            shape: CollisionShapeKind::Sphere,
            mass: 1.0,
            lifetime_loss: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleRenderer {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// Everything an emitter needs to know about the particles it spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystem {
    /// Length of one emission cycle in seconds
    pub duration: f32,
    pub looping: bool,
    pub start_speed: f32,
    pub start_size: f32,
    pub start_lifetime: f32,
    pub start_color: Color,
    pub emission: Emission,
    pub shape: EmitterShape,
    pub collision: ParticleCollisionSettings,
    pub renderer: ParticleRenderer,
    pub max_particles: usize,
    pub play_on_start: bool,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self {
            duration: 5.0,
            looping: true,
            start_speed: 1.0,
            start_size: 0.1,
            start_lifetime: 5.0,
            start_color: Color::WHITE,
            emission: Emission::default(),
            shape: EmitterShape::default(),
            collision: ParticleCollisionSettings::default(),
            renderer: ParticleRenderer::default(),
            max_particles: 100,
            play_on_start: true,
        }
    }
}
