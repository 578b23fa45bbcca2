//! Solver boundary
//!
//! [`PhysicsSolver`] is everything the physical world needs from a rigid-body
//! simulator: shapes, bodies, stepping, contact manifolds and ray casts. The
//! default implementation is [`SimpleSolver`](super::simple_solver::SimpleSolver);
//! tests plug in scripted solvers to drive dispatch directly.

use crate::core::object::ObjectId;
use crate::math::euler_to_quat;
use crate::particle::ParticleId;
use crate::render::MeshData;
use glam::{Quat, Vec3};
use std::sync::Arc;

/// Handle of a collision shape inside the solver.
///
/// Slots are reused once their shape is removed; the generation keeps an
/// old handle from reaching the shape that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle {
    slot: u32,
    generation: u32,
}

impl ShapeHandle {
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(self) -> u32 {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Handle of a rigid body inside the solver, generational like [`ShapeHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    slot: u32,
    generation: u32,
}

impl BodyHandle {
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(self) -> u32 {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// World-space position and orientation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose from a position and Euler angles in degrees
    pub fn from_euler(position: Vec3, degrees: Vec3) -> Self {
        Self::new(position, euler_to_quat(degrees))
    }

    /// Transform a point from body space to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Transform a point from world space to body space
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate() * (world - self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Owner recorded on a shape, so contacts can be routed back to objects.
///
/// A shape belongs to at most one participant, which makes "which side is
/// this" a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeTag {
    /// Shape not (yet) attached to anything that receives events
    #[default]
    Untagged,
    /// Shape of the `PhysicsBody` object with this id
    Body(ObjectId),
    /// Shape of a collider-backed particle
    Particle(ParticleId),
}

/// Geometry of a collision shape, before scaling
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Capsule along the local Y axis; `half_height` excludes the caps
    Capsule { radius: f32, half_height: f32 },
    /// Static triangle mesh
    Mesh { mesh: Arc<MeshData> },
}

/// Everything needed to create a rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: ShapeHandle,
    /// Zero mass makes the body static
    pub mass: f32,
    pub local_inertia: Vec3,
    pub pose: Pose,
    /// Collision group bits of the body's layer
    pub group: u32,
    /// Groups this body collides with
    pub mask: u32,
}

/// One contact between the two bodies of a manifold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Contact point on the surface of body A
    pub position_on_a: Vec3,
    /// Contact point on the surface of body B
    pub position_on_b: Vec3,
    /// Contact normal, pointing from B towards A
    pub normal_on_b: Vec3,
    /// Signed separation; negative while penetrating
    pub distance: f32,
}

/// Contacts between one pair of bodies after collision detection
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub points: Vec<ContactPoint>,
}

/// Closest hit of a solver ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverRayHit {
    pub body: BodyHandle,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// A rigid-body simulator the physical world can drive
pub trait PhysicsSolver: Send {
    /// Create a collision shape
    fn create_shape(&mut self, desc: ShapeDesc) -> ShapeHandle;

    /// Set the local scaling of a shape
    fn set_shape_scale(&mut self, shape: ShapeHandle, scale: Vec3);

    /// Destroy a shape
    fn remove_shape(&mut self, shape: ShapeHandle);

    /// Record the owner of a shape
    fn set_shape_tag(&mut self, shape: ShapeHandle, tag: ShapeTag);

    /// Owner of a shape, `Untagged` for unknown shapes
    fn shape_tag(&self, shape: ShapeHandle) -> ShapeTag;

    /// Diagonal inertia tensor of a shape for the given mass
    fn local_inertia(&self, shape: ShapeHandle, mass: f32) -> Vec3;

    /// Create a rigid body and add it to the simulation
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a rigid body from the simulation
    fn remove_body(&mut self, body: BodyHandle);

    /// Shape of a body
    fn body_shape(&self, body: BodyHandle) -> Option<ShapeHandle>;

    /// Current world pose of a body
    fn body_pose(&self, body: BodyHandle) -> Option<Pose>;

    /// Teleport a body
    fn set_body_pose(&mut self, body: BodyHandle, pose: Pose);

    fn linear_velocity(&self, body: BodyHandle) -> Vec3;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Apply an impulse through the center of mass
    fn apply_central_impulse(&mut self, body: BodyHandle, impulse: Vec3);

    /// Apply a force through the center of mass for the next step
    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3);

    /// Per-axis multiplier on linear motion
    fn set_linear_factor(&mut self, body: BodyHandle, factor: Vec3);

    /// Per-axis multiplier on angular motion
    fn set_angular_factor(&mut self, body: BodyHandle, factor: Vec3);

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32);

    /// Allow or forbid the body from going to sleep
    fn set_deactivation_enabled(&mut self, body: BodyHandle, enabled: bool);

    /// Advance the simulation
    fn step(&mut self, dt: f32);

    /// Rebuild contact manifolds for the current poses
    fn perform_discrete_collision_detection(&mut self);

    /// Manifolds from the last collision detection
    fn manifolds(&self) -> &[ContactManifold];

    /// Closest body hit by a ray, among bodies whose group intersects `mask`
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<SolverRayHit>;
}
