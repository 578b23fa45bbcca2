//! Shared helpers for the integration tests

#![allow(dead_code)]

use engine::config::{EngineConfig, PhysicsConfig};
use engine::physics::{
    BodyDesc, BodyHandle, ContactManifold, ContactPoint, PhysicsSolver, Pose, ShapeDesc,
    ShapeHandle, ShapeTag, SimpleSolver, SolverRayHit,
};
use engine::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Solver that forwards to [`SimpleSolver`] but counts body creation and
/// can report scripted manifolds instead of detected ones.
pub struct ScriptedSolver {
    inner: SimpleSolver,
    created: Arc<AtomicUsize>,
    script: Arc<Mutex<Option<Vec<ContactManifold>>>>,
    current: Vec<ContactManifold>,
}

/// Test-side view of a [`ScriptedSolver`] living inside a scene
#[derive(Clone)]
pub struct SolverControl {
    created: Arc<AtomicUsize>,
    script: Arc<Mutex<Option<Vec<ContactManifold>>>>,
}

impl SolverControl {
    /// Number of `create_body` calls so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Report exactly these manifolds from now on
    pub fn script(&self, manifolds: Vec<ContactManifold>) {
        *self.script.lock().unwrap() = Some(manifolds);
    }

    /// Go back to detected manifolds
    pub fn clear_script(&self) {
        *self.script.lock().unwrap() = None;
    }
}

impl ScriptedSolver {
    pub fn new(config: PhysicsConfig) -> (Self, SolverControl) {
        let created = Arc::new(AtomicUsize::new(0));
        let script = Arc::new(Mutex::new(None));
        let control = SolverControl {
            created: created.clone(),
            script: script.clone(),
        };
        let solver = Self {
            inner: SimpleSolver::new(config),
            created,
            script,
            current: Vec::new(),
        };
        (solver, control)
    }
}

impl PhysicsSolver for ScriptedSolver {
    fn create_shape(&mut self, desc: ShapeDesc) -> ShapeHandle {
        self.inner.create_shape(desc)
    }
    fn set_shape_scale(&mut self, shape: ShapeHandle, scale: Vec3) {
        self.inner.set_shape_scale(shape, scale)
    }
    fn remove_shape(&mut self, shape: ShapeHandle) {
        self.inner.remove_shape(shape)
    }
    fn set_shape_tag(&mut self, shape: ShapeHandle, tag: ShapeTag) {
        self.inner.set_shape_tag(shape, tag)
    }
    fn shape_tag(&self, shape: ShapeHandle) -> ShapeTag {
        self.inner.shape_tag(shape)
    }
    fn local_inertia(&self, shape: ShapeHandle, mass: f32) -> Vec3 {
        self.inner.local_inertia(shape, mass)
    }
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_body(desc)
    }
    fn remove_body(&mut self, body: BodyHandle) {
        self.inner.remove_body(body)
    }
    fn body_shape(&self, body: BodyHandle) -> Option<ShapeHandle> {
        self.inner.body_shape(body)
    }
    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.inner.body_pose(body)
    }
    fn set_body_pose(&mut self, body: BodyHandle, pose: Pose) {
        self.inner.set_body_pose(body, pose)
    }
    fn linear_velocity(&self, body: BodyHandle) -> Vec3 {
        self.inner.linear_velocity(body)
    }
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.inner.set_linear_velocity(body, velocity)
    }
    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.inner.set_angular_velocity(body, velocity)
    }
    fn apply_central_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        self.inner.apply_central_impulse(body, impulse)
    }
    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3) {
        self.inner.apply_central_force(body, force)
    }
    fn set_linear_factor(&mut self, body: BodyHandle, factor: Vec3) {
        self.inner.set_linear_factor(body, factor)
    }
    fn set_angular_factor(&mut self, body: BodyHandle, factor: Vec3) {
        self.inner.set_angular_factor(body, factor)
    }
    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32) {
        self.inner.set_damping(body, linear, angular)
    }
    fn set_deactivation_enabled(&mut self, body: BodyHandle, enabled: bool) {
        self.inner.set_deactivation_enabled(body, enabled)
    }
    fn step(&mut self, dt: f32) {
        self.inner.step(dt)
    }
    fn perform_discrete_collision_detection(&mut self) {
        self.inner.perform_discrete_collision_detection();
        self.current = match self.script.lock().unwrap().as_ref() {
            Some(script) => script.clone(),
            None => self.inner.manifolds().to_vec(),
        };
    }
    fn manifolds(&self) -> &[ContactManifold] {
        &self.current
    }
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<SolverRayHit> {
        self.inner.cast_ray(origin, direction, max_distance, mask)
    }
}

/// Physics config without gravity, so bodies stay where they are put
pub fn weightless() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.physics.gravity = Vec3::ZERO;
    config
}

/// Route engine logs to the test output; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scene backed by a scripted solver
pub fn scripted_scene(config: EngineConfig) -> (Scene, SolverControl) {
    init_tracing();
    let (solver, control) = ScriptedSolver::new(config.physics.clone());
    (Scene::with_solver(config, Box::new(solver)), control)
}

/// Spawn a physics body with a sphere collider
pub fn spawn_ball(scene: &mut Scene, name: &str, position: Vec3, radius: f32, mass: f32) -> ObjectId {
    let collider = scene.spawn_collider(
        format!("{name} collider"),
        ColliderInitInfo::for_sphere(radius),
        None,
    );
    scene
        .spawn_physics_body(name, Transform::from_position(position), collider, mass)
        .unwrap()
}

/// Spawn a static box body
pub fn spawn_ground(scene: &mut Scene, position: Vec3, bounds: Vec3) -> ObjectId {
    let collider = scene.spawn_collider("ground collider", ColliderInitInfo::for_box(bounds), None);
    scene
        .spawn_physics_body("ground", Transform::from_position(position), collider, 0.0)
        .unwrap()
}

/// Solver handle of a created physics body
pub fn handle_of(scene: &Scene, id: ObjectId) -> BodyHandle {
    let pid = scene
        .objects()
        .get::<PhysicsBody>(id)
        .unwrap()
        .pid()
        .expect("body not created yet");
    scene.physics().body_handle(pid).unwrap()
}

/// A single-point manifold between two solver bodies
pub fn contact(body_a: BodyHandle, body_b: BodyHandle, point: Vec3, normal_on_b: Vec3) -> ContactManifold {
    ContactManifold {
        body_a,
        body_b,
        points: vec![ContactPoint {
            position_on_a: point,
            position_on_b: point,
            normal_on_b,
            distance: -0.01,
        }],
    }
}

pub fn step(scene: &mut Scene, frames: usize) {
    let mut sink = DrawList::new();
    for _ in 0..frames {
        scene.update(1.0 / 60.0, &mut sink);
        sink.clear();
    }
}
