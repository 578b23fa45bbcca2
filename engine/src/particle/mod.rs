//! Particles: an emitter object spawning short-lived points, optionally
//! each backed by its own rigid body

pub mod emitter;
pub mod particle;
pub mod system;

pub use emitter::{emit, ParticleEmitter};
pub use particle::{Particle, ParticleId};
pub use system::{
    Emission, EmitterShape, EmitterShapeKind, ParticleCollisionSettings, ParticleRenderer,
    ParticleSystem,
};
