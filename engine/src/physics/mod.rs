//! Physics integration
//!
//! Objects carrying a [`PhysicsBody`] are mirrored into a rigid-body
//! [`PhysicsSolver`] owned by the [`PhysicalWorld`]. Bodies are created on
//! their first update, synced every frame after that, and contacts found by
//! the solver come back as [`Collision`] and [`ParticleCollision`] events.

pub mod body;
pub mod collision;
pub mod commands;
pub mod components;
pub mod error;
pub mod events;
pub mod ray;
pub mod simple_solver;
pub mod solver;
pub mod world;

pub use body::BodyMut;
pub use commands::{PhysicsCommand, PhysicsCommands};
pub use components::{
    ColliderInitInfo, ColliderObject, CollisionShapeKind, PhysicsBody, TransformRelationship,
};
pub use error::PhysicsError;
pub use events::{
    Collision, CollisionBase, CollisionCallback, CollisionContext, EmitterCollisionCallback,
    ParticleCollision, ParticleCollisionCallback,
};
pub use ray::{Ray, RaycastHit};
pub use simple_solver::SimpleSolver;
pub use solver::{
    BodyDesc, BodyHandle, ContactManifold, ContactPoint, PhysicsSolver, Pose, ShapeDesc,
    ShapeHandle, ShapeTag, SolverRayHit,
};
pub use world::{classify, ContactPair, Participant, PhysicalWorld, MAX_LAYERS};
