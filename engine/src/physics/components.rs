//! Physics components attached to scene objects

use super::events::{CollisionCallback, ParticleCollisionCallback};
use super::solver::ShapeDesc;
use crate::core::object::ObjectId;
use crate::render::MeshData;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of collision shape, without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionShapeKind {
    #[default]
    Box,
    Sphere,
    Capsule,
    Mesh,
}

/// Description of a collider's shape.
///
/// Box bounds and capsule height are full sizes; the solver works with
/// half extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum ColliderInitInfo {
    Box { bounds: Vec3 },
    Sphere { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Mesh { mesh: Arc<MeshData> },
}

impl ColliderInitInfo {
    pub fn for_box(bounds: Vec3) -> Self {
        Self::Box { bounds }
    }

    pub fn for_sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn for_capsule(radius: f32, height: f32) -> Self {
        Self::Capsule { radius, height }
    }

    pub fn for_mesh(mesh: Arc<MeshData>) -> Self {
        Self::Mesh { mesh }
    }

    /// Collider of the given kind sized by a uniform `size`, as particles use
    pub fn sized(kind: CollisionShapeKind, size: Vec3, mesh: Option<Arc<MeshData>>) -> Self {
        match (kind, mesh) {
            (CollisionShapeKind::Box, _) => Self::for_box(size),
            (CollisionShapeKind::Sphere, _) => Self::for_sphere(size.x),
            (CollisionShapeKind::Capsule, _) => Self::for_capsule(size.x, size.y),
            (CollisionShapeKind::Mesh, Some(mesh)) => Self::for_mesh(mesh),
            (CollisionShapeKind::Mesh, None) => Self::for_box(size),
        }
    }

    pub fn kind(&self) -> CollisionShapeKind {
        match self {
            Self::Box { .. } => CollisionShapeKind::Box,
            Self::Sphere { .. } => CollisionShapeKind::Sphere,
            Self::Capsule { .. } => CollisionShapeKind::Capsule,
            Self::Mesh { .. } => CollisionShapeKind::Mesh,
        }
    }

    /// Mesh geometry, for mesh colliders
    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        match self {
            Self::Mesh { mesh } => Some(mesh),
            _ => None,
        }
    }

    pub(crate) fn to_shape_desc(&self) -> ShapeDesc {
        match self {
            Self::Box { bounds } => ShapeDesc::Box {
                half_extents: *bounds * 0.5,
            },
            Self::Sphere { radius } => ShapeDesc::Sphere { radius: *radius },
            Self::Capsule { radius, height } => ShapeDesc::Capsule {
                radius: *radius,
                half_height: *height * 0.5,
            },
            Self::Mesh { mesh } => ShapeDesc::Mesh { mesh: mesh.clone() },
        }
    }
}

/// A collision shape registered with the physical world.
///
/// `pid` indexes the world's shape list and is renumbered whenever an
/// earlier shape is removed. `None` once the shape has been released.
#[derive(Debug, Clone)]
pub struct ColliderObject {
    pub info: ColliderInitInfo,
    pub(crate) pid: Option<usize>,
}

impl ColliderObject {
    pub(crate) fn new(info: ColliderInitInfo, pid: usize) -> Self {
        Self {
            info,
            pid: Some(pid),
        }
    }

    pub fn pid(&self) -> Option<usize> {
        self.pid
    }
}

/// Which object a rigid body's pose belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformRelationship {
    /// The simulated pose is this object's own transform
    #[default]
    SelfRelative,
    /// The simulated pose moves this object's parent
    Parent,
}

/// Rigid body attached to an object and its collider.
///
/// The solver body is created lazily on the first update that reaches this
/// object; until then `pid` is `None`.
pub struct PhysicsBody {
    /// Zero mass makes the body static
    pub mass: f32,
    /// Collision layer, selecting group bits and mask at creation
    pub layer: usize,
    pub relation: TransformRelationship,
    pub(crate) collider: ObjectId,
    pub(crate) pid: Option<usize>,
    pub(crate) cpid: Option<usize>,
    pub(crate) collision_events: Vec<CollisionCallback>,
    pub(crate) particle_collision_events: Vec<ParticleCollisionCallback>,
}

impl PhysicsBody {
    pub(crate) fn new(collider: ObjectId, cpid: Option<usize>, mass: f32) -> Self {
        Self {
            mass,
            layer: 0,
            relation: TransformRelationship::default(),
            collider,
            pid: None,
            cpid,
            collision_events: Vec::new(),
            particle_collision_events: Vec::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// Whether the solver body exists
    pub fn is_created(&self) -> bool {
        self.pid.is_some()
    }

    /// Index of the solver body in the world's body list
    pub fn pid(&self) -> Option<usize> {
        self.pid
    }

    /// Index of the collider's shape in the world's shape list
    pub fn cpid(&self) -> Option<usize> {
        self.cpid
    }

    /// Object holding the `ColliderObject`
    pub fn collider(&self) -> ObjectId {
        self.collider
    }

    /// Subscribe to collisions with other physics bodies
    pub fn add_collision_event(&mut self, callback: CollisionCallback) {
        self.collision_events.push(callback);
    }

    /// Subscribe to collisions with collider-backed particles
    pub fn add_particle_collision_event(&mut self, callback: ParticleCollisionCallback) {
        self.particle_collision_events.push(callback);
    }

    pub fn collision_event_count(&self) -> usize {
        self.collision_events.len()
    }

    pub fn particle_collision_event_count(&self) -> usize {
        self.particle_collision_events.len()
    }
}

impl fmt::Debug for PhysicsBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsBody")
            .field("mass", &self.mass)
            .field("layer", &self.layer)
            .field("relation", &self.relation)
            .field("collider", &self.collider)
            .field("pid", &self.pid)
            .field("cpid", &self.cpid)
            .field("collision_events", &self.collision_events.len())
            .field(
                "particle_collision_events",
                &self.particle_collision_events.len(),
            )
            .finish()
    }
}
