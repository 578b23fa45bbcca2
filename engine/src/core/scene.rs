//! Scene: the object tree, its physical world and the per-frame update
//!
//! [`Scene::update`] walks every root depth-first. Each object runs the
//! behavior of its components (physics sync, mesh submission, particle
//! emission, user [`Behavior`]) before its children are visited; after the
//! walk the physical world advances one step and dispatches contacts.

use super::object::{ObjectId, Objects, Transform};
use crate::config::EngineConfig;
use crate::particle::emitter::update_emitter;
use crate::particle::{self, ParticleEmitter, ParticleSystem};
use crate::physics::{
    BodyMut, ColliderInitInfo, ColliderObject, PhysicalWorld, PhysicsBody, PhysicsError,
    PhysicsSolver, Ray, RaycastHit, ShapeTag,
};
use crate::render::{MeshObject, RenderSink};
use tracing::{debug, trace};

/// Whether the traversal descends into an object's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    #[default]
    Continue,
    Skip,
}

/// What a behavior sees while its object is being updated
pub struct UpdateContext<'a> {
    pub object: ObjectId,
    pub delta: f32,
    pub objects: &'a mut Objects,
    pub physics: &'a mut PhysicalWorld,
}

impl UpdateContext<'_> {
    /// Rigid-body access for any physics body in the scene
    pub fn body_mut(&mut self, id: ObjectId) -> Option<BodyMut<'_>> {
        let pid = self.objects.get::<PhysicsBody>(id).ok()?.pid();
        Some(BodyMut::new(&mut *self.physics, id, pid))
    }

    /// Destroy `id` and its subtree once the physics step has run.
    ///
    /// The walk may still visit the object this frame.
    pub fn destroy(&mut self, id: ObjectId) {
        self.physics.commands_mut().destroy(id);
    }
}

/// User-defined per-frame logic attached to an object
pub trait Behavior: Send + Sync + 'static {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Traversal;
}

impl<F> Behavior for F
where
    F: FnMut(&mut UpdateContext<'_>) -> Traversal + Send + Sync + 'static,
{
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Traversal {
        self(ctx)
    }
}

/// Component holding an object's [`Behavior`]
pub struct Behaviour(pub Box<dyn Behavior>);

/// A scene graph plus the physical world its bodies live in
pub struct Scene {
    objects: Objects,
    physics: PhysicalWorld,
    config: EngineConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Scene {
    /// Scene simulated by the built-in solver
    pub fn new(config: EngineConfig) -> Self {
        let physics = PhysicalWorld::new(&config.physics);
        Self {
            objects: Objects::new(),
            physics,
            config,
        }
    }

    /// Scene simulated by a custom solver
    pub fn with_solver(config: EngineConfig, solver: Box<dyn PhysicsSolver>) -> Self {
        let physics = PhysicalWorld::with_solver(solver, &config.physics);
        Self {
            objects: Objects::new(),
            physics,
            config,
        }
    }

    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut Objects {
        &mut self.objects
    }

    pub fn physics(&self) -> &PhysicalWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicalWorld {
        &mut self.physics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Both halves at once, for code that needs to drive the world directly
    pub fn split_mut(&mut self) -> (&mut Objects, &mut PhysicalWorld) {
        (&mut self.objects, &mut self.physics)
    }

    // ---- Spawning ----

    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.objects.spawn(name)
    }

    pub fn spawn_with_transform(&mut self, name: impl Into<String>, transform: Transform) -> ObjectId {
        self.objects.spawn_with_transform(name, transform)
    }

    /// Spawn an object drawn with `mesh`
    pub fn spawn_mesh(&mut self, name: impl Into<String>, transform: Transform, mesh: MeshObject) -> ObjectId {
        let id = self.objects.spawn_with_transform(name, transform);
        self.insert(id, mesh);
        id
    }

    /// Spawn a collider and register its shape.
    ///
    /// Mesh colliders are scaled by the object's global scale at this point.
    pub fn spawn_collider(
        &mut self,
        name: impl Into<String>,
        info: ColliderInitInfo,
        parent: Option<ObjectId>,
    ) -> ObjectId {
        let id = self.objects.spawn(name);
        if parent.is_some() {
            self.objects.set_parent(id, parent);
        }
        let scale = self.objects.global_scale(id);
        let cpid = self.physics.register_shape(&info, scale);
        self.insert(id, ColliderObject::new(info, cpid));
        id
    }

    /// Spawn a physics body using `collider`'s shape.
    ///
    /// A collider without a parent is moved under the new body. The solver
    /// body itself is created on the body's first update.
    pub fn spawn_physics_body(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        collider: ObjectId,
        mass: f32,
    ) -> Result<ObjectId, PhysicsError> {
        let cpid = self
            .objects
            .get::<ColliderObject>(collider)
            .map_err(|_| PhysicsError::NotACollider(collider))?
            .pid();

        let id = self.objects.spawn_with_transform(name, transform);
        if self.objects.parent(collider).is_none() {
            self.objects.set_parent(collider, Some(id));
        }
        if let Some(cpid) = cpid {
            self.physics.tag_shape(cpid, ShapeTag::Body(id));
        }
        self.insert(id, PhysicsBody::new(collider, cpid, mass));
        debug!(body = ?id, ?cpid, mass, "Spawned physics body");
        Ok(id)
    }

    /// Spawn a particle emitter; its random stream is seeded from the config
    pub fn spawn_emitter(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        system: ParticleSystem,
    ) -> ObjectId {
        let id = self.objects.spawn_with_transform(name, transform);
        let seed = self.config.particles.seed.wrapping_add(u64::from(id.id()));
        self.insert(id, ParticleEmitter::new(system, seed));
        id
    }

    /// Attach a behavior to an object, replacing any previous one
    pub fn add_behaviour(&mut self, id: ObjectId, behavior: impl Behavior) -> Result<(), PhysicsError> {
        self.objects
            .insert_one(id, Behaviour(Box::new(behavior)))
            .map_err(|_| PhysicsError::UnknownObject(id))
    }

    fn insert(&mut self, id: ObjectId, component: impl hecs::Component) {
        // `id` was spawned by the caller just before
        let _ = self.objects.insert_one(id, component);
    }

    // ---- Physics access ----

    /// Rigid-body operations for the physics body on `id`
    pub fn body_mut(&mut self, id: ObjectId) -> Option<BodyMut<'_>> {
        let pid = self.objects.get::<PhysicsBody>(id).ok()?.pid();
        Some(BodyMut::new(&mut self.physics, id, pid))
    }

    /// Physics body component of `id`
    pub fn physics_body_mut(&mut self, id: ObjectId) -> Option<&mut PhysicsBody> {
        self.objects.get_mut::<PhysicsBody>(id).ok()
    }

    /// Emitter component of `id`
    pub fn emitter_mut(&mut self, id: ObjectId) -> Option<&mut ParticleEmitter> {
        self.objects.get_mut::<ParticleEmitter>(id).ok()
    }

    /// Spawn particles on an emitter right away
    pub fn emit(&mut self, emitter: ObjectId, amount: usize) -> usize {
        particle::emit(&mut self.objects, &mut self.physics, emitter, amount)
    }

    /// Physics bodies currently touching `id`
    pub fn colliding_with(&self, id: ObjectId) -> Vec<ObjectId> {
        self.physics.colliding_with(&self.objects, id)
    }

    pub fn raycast(&self, ray: &Ray) -> Option<RaycastHit> {
        ray.cast(&self.physics)
    }

    // ---- Lifecycle ----

    /// Destroy `id` and everything below it, releasing the solver bodies
    /// and shapes the subtree holds.
    pub fn destroy(&mut self, id: ObjectId) -> Result<(), PhysicsError> {
        self.physics.destroy(&mut self.objects, id)
    }

    // ---- Update ----

    /// Update every object, then step the physical world once
    pub fn update(&mut self, delta: f32, sink: &mut dyn RenderSink) {
        let roots = self.objects.roots().to_vec();
        trace!(roots = roots.len(), delta, "Scene update");
        for root in roots {
            self.update_object(root, delta, sink);
        }
        self.physics.update(&mut self.objects);
    }

    fn update_object(&mut self, id: ObjectId, delta: f32, sink: &mut dyn RenderSink) {
        if !self.objects.contains(id) || !self.objects.is_active(id) {
            return;
        }

        if self.objects.has::<PhysicsBody>(id) {
            self.physics.sync_body(&mut self.objects, id);
        }

        let mesh = self.objects.get::<MeshObject>(id).ok().map(|mesh| *mesh);
        if let Some(mesh) = mesh {
            sink.submit(mesh.draw_call(self.objects.global_transform(id)));
        }

        if self.objects.has::<ParticleEmitter>(id) {
            update_emitter(&mut self.objects, &mut self.physics, id, delta, sink);
        }

        let mut traversal = Traversal::Continue;
        if let Ok(Behaviour(mut behavior)) = self.objects.remove_one::<Behaviour>(id) {
            let mut ctx = UpdateContext {
                object: id,
                delta,
                objects: &mut self.objects,
                physics: &mut self.physics,
            };
            traversal = behavior.update(&mut ctx);
            if self.objects.contains(id) && !self.objects.has::<Behaviour>(id) {
                let _ = self.objects.insert_one(id, Behaviour(behavior));
            }
        }

        if traversal == Traversal::Skip {
            return;
        }
        for child in self.objects.children(id) {
            self.update_object(child, delta, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawList, MaterialHandle, MeshHandle};
    use glam::Vec3;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_update_visits_parents_before_children() {
        let mut scene = Scene::default();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let root = scene.spawn("root");
        let child = scene.spawn("child");
        scene.objects_mut().set_parent(child, Some(root));

        for id in [root, child] {
            let order = order.clone();
            scene
                .add_behaviour(id, move |ctx: &mut UpdateContext<'_>| {
                    order.lock().unwrap().push(ctx.object);
                    Traversal::Continue
                })
                .unwrap();
        }

        scene.update(0.1, &mut DrawList::new());
        assert_eq!(*order.lock().unwrap(), vec![root, child]);
    }

    #[test]
    fn test_skip_and_inactive_prune_subtree() {
        let mut scene = Scene::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let root = scene.spawn("root");
        let child = scene.spawn("child");
        scene.objects_mut().set_parent(child, Some(root));
        scene
            .add_behaviour(root, |_: &mut UpdateContext<'_>| Traversal::Skip)
            .unwrap();
        let counter = hits.clone();
        scene
            .add_behaviour(child, move |_: &mut UpdateContext<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
                Traversal::Continue
            })
            .unwrap();

        scene.update(0.1, &mut DrawList::new());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // A root that is inactive hides its subtree as well
        let other = scene.spawn("other");
        scene.objects_mut().set_parent(child, Some(other));
        scene.objects_mut().set_active(other, false);
        scene.update(0.1, &mut DrawList::new());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        scene.objects_mut().set_active(other, true);
        scene.update(0.1, &mut DrawList::new());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_meshes_submit_global_transform() {
        let mut scene = Scene::default();
        let parent = scene.spawn_with_transform("parent", Transform::from_position(Vec3::X));
        let mesh = scene.spawn_mesh(
            "mesh",
            Transform::from_position(Vec3::Y),
            MeshObject::new(MeshHandle::CUBE, MaterialHandle::DEFAULT),
        );
        scene.objects_mut().set_parent(mesh, Some(parent));

        let mut sink = DrawList::new();
        scene.update(0.1, &mut sink);
        assert_eq!(sink.len(), 1);
        let translation = sink.calls()[0].transform.w_axis.truncate();
        assert!((translation - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_body_requires_collider() {
        let mut scene = Scene::default();
        let not_collider = scene.spawn("plain");
        let result = scene.spawn_physics_body("body", Transform::default(), not_collider, 1.0);
        assert_eq!(result, Err(PhysicsError::NotACollider(not_collider)));
    }

    #[test]
    fn test_collider_moves_under_body() {
        let mut scene = Scene::default();
        let collider = scene.spawn_collider("shape", ColliderInitInfo::for_sphere(0.5), None);
        let body = scene
            .spawn_physics_body("ball", Transform::default(), collider, 1.0)
            .unwrap();
        assert_eq!(scene.objects().parent(collider), Some(body));
        assert!(scene.body_mut(body).is_some());
        assert!(scene.body_mut(collider).is_none());
    }

    #[test]
    fn test_destroy_releases_bodies() {
        let mut scene = Scene::default();
        let collider = scene.spawn_collider("shape", ColliderInitInfo::for_sphere(0.5), None);
        let body = scene
            .spawn_physics_body("ball", Transform::default(), collider, 1.0)
            .unwrap();
        scene.update(1.0 / 60.0, &mut DrawList::new());
        assert_eq!(scene.physics().body_count(), 1);

        scene.destroy(body).unwrap();
        assert_eq!(scene.physics().body_count(), 0);
        assert_eq!(scene.physics().shape_count(), 0);
        assert!(!scene.objects().contains(collider));
        assert_eq!(scene.destroy(body), Err(PhysicsError::UnknownObject(body)));
    }

    #[test]
    fn test_behavior_destroy_waits_for_physics_step() {
        let mut scene = Scene::default();
        let collider = scene.spawn_collider("shape", ColliderInitInfo::for_sphere(0.5), None);
        let body = scene
            .spawn_physics_body("ball", Transform::default(), collider, 1.0)
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        scene
            .add_behaviour(body, move |ctx: &mut UpdateContext<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.destroy(ctx.object);
                Traversal::Continue
            })
            .unwrap();

        scene.update(1.0 / 60.0, &mut DrawList::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!scene.objects().contains(body));
        assert!(!scene.objects().contains(collider));
        assert_eq!(scene.physics().body_count(), 0);
        assert_eq!(scene.physics().shape_count(), 0);

        scene.update(1.0 / 60.0, &mut DrawList::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
