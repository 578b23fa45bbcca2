//! Scene-graph game engine core
//!
//! A tree of game objects updated once per frame, rigid-body physics that
//! follows those objects, collision events routed back to them, and
//! particle emitters whose particles can take part in the simulation.
//! Rendering is left to whoever consumes the draw calls.

pub mod config;
pub mod core;
pub mod math;
pub mod particle;
pub mod physics;
pub mod render;
pub mod time;

// Re-export commonly used types
pub mod prelude {
    // Object model
    pub use crate::core::object::{Active, Hierarchy, Name, ObjectId, Objects, Transform};
    pub use crate::core::scene::{Behavior, Behaviour, Scene, Traversal, UpdateContext};

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Config types
    pub use crate::config::{EngineConfig, ParticleDefaults, PhysicsConfig};

    // Physics types
    pub use crate::physics::{
        BodyMut, ColliderInitInfo, ColliderObject, Collision, CollisionBase, CollisionContext,
        CollisionShapeKind, ParticleCollision, PhysicalWorld, PhysicsBody, PhysicsError,
        PhysicsSolver, Ray, RaycastHit, SimpleSolver, TransformRelationship,
    };

    // Particle types
    pub use crate::particle::{Particle, ParticleEmitter, ParticleId, ParticleSystem};

    // Rendering boundary
    pub use crate::render::{
        Color, DrawCall, DrawList, MaterialHandle, MeshData, MeshHandle, MeshObject, RenderSink,
    };

    pub use crate::time::FrameClock;
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
