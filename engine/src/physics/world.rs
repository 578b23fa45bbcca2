//! The physical world: solver ownership, body bookkeeping and collision dispatch
//!
//! Bodies and shapes live in two dense lists. A `PhysicsBody` remembers its
//! solver body by position in the first (`pid`) and its shape by position in
//! the second (`cpid`); particles do the same. Removing an entry shifts every
//! later entry down by one, so removal always goes through
//! [`PhysicalWorld::remove_body`] and friends, which renumber every stored
//! index in the scene.

use super::commands::{PhysicsCommand, PhysicsCommands};
use super::components::{ColliderInitInfo, ColliderObject, PhysicsBody, TransformRelationship};
use super::error::PhysicsError;
use super::events::{Collision, CollisionBase, CollisionContext, ParticleCollision};
use super::simple_solver::SimpleSolver;
use super::solver::{
    BodyDesc, BodyHandle, ContactManifold, ContactPoint, PhysicsSolver, Pose, ShapeHandle,
    ShapeTag,
};
use crate::config::PhysicsConfig;
use crate::core::object::{ObjectId, Objects};
use crate::math::{point_in_triangle, quat_to_euler};
use crate::particle::emitter::release_all;
use crate::particle::{ParticleEmitter, ParticleId};
use glam::Vec3;
use tracing::{debug, trace, warn};

/// Highest number of collision layers; each layer owns one group bit
pub const MAX_LAYERS: usize = 32;

/// A typed participant of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Body(ObjectId),
    Particle(ParticleId),
}

/// How a contact between two shapes is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPair {
    Bodies(ObjectId, ObjectId),
    /// Body and particle; `body_is_a` tells which side of the manifold the body is on
    BodyParticle {
        body: ObjectId,
        particle: ParticleId,
        body_is_a: bool,
    },
    Particles(ParticleId, ParticleId),
}

/// Classify a contact from the participants its two sides resolved to.
///
/// Each side resolves to at most one participant, so exactly two typed
/// slots are filled only when both sides resolved; anything else is
/// ignored.
pub fn classify(a: Option<Participant>, b: Option<Participant>) -> Option<ContactPair> {
    match (a?, b?) {
        (Participant::Body(a), Participant::Body(b)) => Some(ContactPair::Bodies(a, b)),
        (Participant::Body(body), Participant::Particle(particle)) => {
            Some(ContactPair::BodyParticle {
                body,
                particle,
                body_is_a: true,
            })
        }
        (Participant::Particle(particle), Participant::Body(body)) => {
            Some(ContactPair::BodyParticle {
                body,
                particle,
                body_is_a: false,
            })
        }
        (Participant::Particle(a), Participant::Particle(b)) => {
            Some(ContactPair::Particles(a, b))
        }
    }
}

/// Move a stored index after the entry at `removed` was erased
fn shift_index(index: &mut Option<usize>, removed: usize) {
    *index = match *index {
        Some(i) if i == removed => None,
        Some(i) if i > removed => Some(i - 1),
        other => other,
    };
}

/// Owns the solver and everything the engine keeps about it
pub struct PhysicalWorld {
    solver: Box<dyn PhysicsSolver>,
    physical_bodies: Vec<BodyHandle>,
    collision_objs: Vec<ShapeHandle>,
    layers: Vec<u32>,
    layer_masks: Vec<u32>,
    fixed_timestep: f32,
    stepped: bool,
    commands: PhysicsCommands,
}

impl PhysicalWorld {
    /// World backed by the built-in solver
    pub fn new(config: &PhysicsConfig) -> Self {
        Self::with_solver(Box::new(SimpleSolver::new(config.clone())), config)
    }

    /// World backed by any solver
    pub fn with_solver(solver: Box<dyn PhysicsSolver>, config: &PhysicsConfig) -> Self {
        Self {
            solver,
            physical_bodies: Vec::new(),
            collision_objs: Vec::new(),
            // Layer 0 collides with everything
            layers: vec![1],
            layer_masks: vec![u32::MAX],
            fixed_timestep: config.fixed_timestep,
            stepped: false,
            commands: PhysicsCommands::new(),
        }
    }

    pub fn solver(&self) -> &dyn PhysicsSolver {
        self.solver.as_ref()
    }

    pub fn solver_mut(&mut self) -> &mut dyn PhysicsSolver {
        self.solver.as_mut()
    }

    /// Number of live solver bodies
    pub fn body_count(&self) -> usize {
        self.physical_bodies.len()
    }

    /// Number of registered shapes
    pub fn shape_count(&self) -> usize {
        self.collision_objs.len()
    }

    pub fn body_handle(&self, pid: usize) -> Option<BodyHandle> {
        self.physical_bodies.get(pid).copied()
    }

    pub fn shape_handle(&self, cpid: usize) -> Option<ShapeHandle> {
        self.collision_objs.get(cpid).copied()
    }

    /// Whether at least one full step has run
    pub fn has_stepped(&self) -> bool {
        self.stepped
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    /// Commands queued for the end of the next update
    pub fn commands_mut(&mut self) -> &mut PhysicsCommands {
        &mut self.commands
    }

    // ---- Shapes and bodies ----

    /// Create a solver shape for `info` and append it to the shape list.
    ///
    /// Mesh shapes take `scale`, the collider's global scale. The shape
    /// starts untagged until a body claims it.
    pub fn register_shape(&mut self, info: &ColliderInitInfo, scale: Vec3) -> usize {
        let shape = self.solver.create_shape(info.to_shape_desc());
        if info.mesh().is_some() {
            self.solver.set_shape_scale(shape, scale);
        }
        self.solver.set_shape_tag(shape, ShapeTag::Untagged);

        let cpid = self.collision_objs.len();
        self.collision_objs.push(shape);
        debug!(cpid, kind = ?info.kind(), "Registered collision shape");
        cpid
    }

    /// Record the owner of the shape at `cpid`
    pub fn tag_shape(&mut self, cpid: usize, tag: ShapeTag) {
        match self.collision_objs.get(cpid) {
            Some(&shape) => self.solver.set_shape_tag(shape, tag),
            None => warn!(cpid, "Tagging unknown shape"),
        }
    }

    /// Create a rigid body for the shape at `cpid` and append it to the body list
    pub fn create_rigid_body(
        &mut self,
        cpid: usize,
        mass: f32,
        pose: Pose,
        layer: usize,
        allow_sleep: bool,
    ) -> Result<usize, PhysicsError> {
        let group = self.layer_group(layer).ok_or(PhysicsError::UnknownLayer(layer))?;
        let mask = self.layer_mask(layer).ok_or(PhysicsError::UnknownLayer(layer))?;
        let shape = self
            .collision_objs
            .get(cpid)
            .copied()
            .ok_or(PhysicsError::UnknownShape(cpid))?;

        let local_inertia = if mass != 0.0 {
            self.solver.local_inertia(shape, mass)
        } else {
            Vec3::ZERO
        };

        let handle = self.solver.create_body(BodyDesc {
            shape,
            mass,
            local_inertia,
            pose,
            group,
            mask,
        });
        self.solver.set_deactivation_enabled(handle, allow_sleep);

        let pid = self.physical_bodies.len();
        self.physical_bodies.push(handle);
        Ok(pid)
    }

    /// Remove the solver body at `pid`, renumbering every stored body index
    pub fn remove_rigid_body(&mut self, objects: &mut Objects, pid: usize) {
        if pid >= self.physical_bodies.len() {
            warn!(pid, "Removing unknown rigid body");
            return;
        }
        let handle = self.physical_bodies.remove(pid);
        self.solver.remove_body(handle);

        for (_, body) in objects.query_mut::<&mut PhysicsBody>() {
            shift_index(&mut body.pid, pid);
        }
        for (_, emitter) in objects.query_mut::<&mut ParticleEmitter>() {
            for particle in emitter.particles.iter_mut() {
                shift_index(&mut particle.pid, pid);
            }
        }
        debug!(pid, remaining = self.physical_bodies.len(), "Removed rigid body");
    }

    /// Remove the shape at `cpid`, renumbering every stored shape index
    pub fn remove_shape(&mut self, objects: &mut Objects, cpid: usize) {
        if cpid >= self.collision_objs.len() {
            warn!(cpid, "Removing unknown shape");
            return;
        }
        let shape = self.collision_objs.remove(cpid);
        self.solver.remove_shape(shape);

        for (_, body) in objects.query_mut::<&mut PhysicsBody>() {
            shift_index(&mut body.cpid, cpid);
        }
        for (_, collider) in objects.query_mut::<&mut ColliderObject>() {
            shift_index(&mut collider.pid, cpid);
        }
        for (_, emitter) in objects.query_mut::<&mut ParticleEmitter>() {
            for particle in emitter.particles.iter_mut() {
                shift_index(&mut particle.cpid, cpid);
            }
        }
        debug!(cpid, remaining = self.collision_objs.len(), "Removed collision shape");
    }

    /// Remove a body and its shape.
    ///
    /// Every body, collider and particle index above the removed ones moves
    /// down by one; indices equal to the removed ones become `None`.
    pub fn remove_body(&mut self, objects: &mut Objects, pid: usize, cpid: usize) {
        self.remove_rigid_body(objects, pid);
        self.remove_shape(objects, cpid);
    }

    /// Release the solver body and shape of the `PhysicsBody` on `id`.
    ///
    /// The component stays on the object with both indices cleared.
    pub fn release_body(&mut self, objects: &mut Objects, id: ObjectId) -> Result<(), PhysicsError> {
        let pid = objects
            .get::<PhysicsBody>(id)
            .map_err(|_| PhysicsError::NotAPhysicsBody(id))?
            .pid;
        if let Some(pid) = pid {
            self.remove_rigid_body(objects, pid);
        }

        let cpid = objects
            .get::<PhysicsBody>(id)
            .map_err(|_| PhysicsError::NotAPhysicsBody(id))?
            .cpid;
        if let Some(cpid) = cpid {
            self.remove_shape(objects, cpid);
        }
        debug!(body = ?id, ?pid, ?cpid, "Released physics body");
        Ok(())
    }

    /// Destroy `id` and everything below it.
    ///
    /// Solver bodies and shapes held by the subtree are released first,
    /// through the same renumbering path as any other removal. Bodies
    /// elsewhere that borrow a destroyed collider lose their shape too.
    pub fn destroy(&mut self, objects: &mut Objects, id: ObjectId) -> Result<(), PhysicsError> {
        if !objects.contains(id) {
            return Err(PhysicsError::UnknownObject(id));
        }
        let doomed = objects.descendants(id);

        for &object in &doomed {
            if objects.has::<PhysicsBody>(object) {
                self.release_body(objects, object)?;
            }

            if objects.has::<ColliderObject>(object) {
                let owners: Vec<ObjectId> = objects
                    .query::<&PhysicsBody>()
                    .iter()
                    .filter(|(_, body)| body.collider() == object)
                    .map(|(owner, _)| owner)
                    .collect();
                for owner in owners {
                    self.release_body(objects, owner)?;
                }

                let cpid = objects
                    .get::<ColliderObject>(object)
                    .ok()
                    .and_then(|collider| collider.pid());
                if let Some(cpid) = cpid {
                    self.remove_shape(objects, cpid);
                }
            }

            if objects.has::<ParticleEmitter>(object) {
                release_all(objects, self, object);
            }
        }

        for &object in doomed.iter().rev() {
            let _ = objects.despawn(object);
        }
        debug!(object = ?id, count = doomed.len(), "Destroyed subtree");
        Ok(())
    }

    /// Solver body of the `PhysicsBody` on `id`
    pub fn body_handle_of(&self, objects: &Objects, id: ObjectId) -> Result<BodyHandle, PhysicsError> {
        let pid = objects
            .get::<PhysicsBody>(id)
            .map_err(|_| PhysicsError::NotAPhysicsBody(id))?
            .pid;
        pid.and_then(|pid| self.body_handle(pid))
            .ok_or(PhysicsError::NotSimulated { object: id })
    }

    // ---- Per-frame body sync ----

    /// Lazily create the solver body of `id`, then sync its pose.
    ///
    /// Called once per frame from the scene traversal. The first call
    /// creates the body from the relevant engine pose; every call after that
    /// mirrors the solver pose back into the scene. Static bodies go the
    /// other way and follow their engine pose.
    pub fn sync_body(&mut self, objects: &mut Objects, id: ObjectId) {
        let (mass, layer, relation, pid, cpid) = match objects.get::<PhysicsBody>(id) {
            Ok(body) => (body.mass, body.layer, body.relation, body.pid, body.cpid),
            Err(_) => return,
        };
        let parent = objects.parent(id);
        let relation = if parent.is_none() {
            TransformRelationship::SelfRelative
        } else {
            relation
        };
        let pose_source = match relation {
            TransformRelationship::SelfRelative => Some(id),
            TransformRelationship::Parent => parent,
        };
        let Some(source) = pose_source else {
            return;
        };

        let pid = match pid {
            Some(pid) => pid,
            None => {
                let Some(cpid) = cpid else {
                    warn!(body = ?id, "Physics body has no collision shape");
                    return;
                };
                let Some(transform) = objects.transform(source) else {
                    return;
                };
                let pose = Pose::from_euler(transform.position, transform.rotation);
                let pid = match self.create_rigid_body(cpid, mass, pose, layer, false) {
                    Ok(pid) => pid,
                    Err(err) => {
                        warn!(body = ?id, %err, "Could not create rigid body");
                        return;
                    }
                };
                if let Ok(body) = objects.get_mut::<PhysicsBody>(id) {
                    body.pid = Some(pid);
                }
                debug!(body = ?id, pid, cpid, mass, ?relation, "Created rigid body");
                pid
            }
        };

        let Some(handle) = self.body_handle(pid) else {
            return;
        };

        if mass == 0.0 {
            if let Some(transform) = objects.transform(source) {
                self.solver.set_body_pose(
                    handle,
                    Pose::from_euler(transform.position, transform.rotation),
                );
            }
        } else if let Some(pose) = self.solver.body_pose(handle) {
            write_pose(objects, source, pose);
        }
    }

    /// Mirror the solver pose of body `id` into the scene
    fn apply_solver_pose(&self, objects: &mut Objects, id: ObjectId, handle: BodyHandle) {
        let relation = match objects.get::<PhysicsBody>(id) {
            Ok(body) => body.relation,
            Err(_) => return,
        };
        let target = match (relation, objects.parent(id)) {
            (TransformRelationship::Parent, Some(parent)) => parent,
            _ => id,
        };
        if let Some(pose) = self.solver.body_pose(handle) {
            write_pose(objects, target, pose);
        }
    }

    /// Mirror the solver pose of a collider-backed particle into its emitter
    fn apply_particle_pose(&self, objects: &mut Objects, particle: ParticleId, handle: BodyHandle) {
        let Some(pose) = self.solver.body_pose(handle) else {
            return;
        };
        if let Ok(emitter) = objects.get_mut::<ParticleEmitter>(particle.emitter) {
            if let Some(p) = emitter.particle_mut(particle) {
                p.position = pose.position;
                p.rotation = quat_to_euler(pose.rotation);
            }
        }
    }

    // ---- Stepping and dispatch ----

    /// Advance one fixed step and dispatch the resulting contacts.
    ///
    /// Order: step, discrete collision detection, manifold dispatch, queued
    /// commands, then the world is marked as stepped.
    pub fn update(&mut self, objects: &mut Objects) {
        self.solver.step(self.fixed_timestep);
        self.solver.perform_discrete_collision_detection();

        let manifolds: Vec<ContactManifold> = self.solver.manifolds().to_vec();
        trace!(manifolds = manifolds.len(), "Dispatching contacts");

        for manifold in &manifolds {
            let a = self.resolve(objects, manifold.body_a);
            let b = self.resolve(objects, manifold.body_b);
            let Some(pair) = classify(a, b) else {
                trace!(body_a = ?manifold.body_a, body_b = ?manifold.body_b, "Skipping untyped contact");
                continue;
            };
            for point in &manifold.points {
                self.dispatch_contact(objects, manifold, point, pair);
            }
        }

        self.apply_commands(objects);
        self.stepped = true;
    }

    /// Participant owning the shape of a solver body, if it still exists
    fn resolve(&self, objects: &Objects, handle: BodyHandle) -> Option<Participant> {
        let shape = self.solver.body_shape(handle)?;
        match self.solver.shape_tag(shape) {
            ShapeTag::Untagged => None,
            ShapeTag::Body(id) => objects.has::<PhysicsBody>(id).then_some(Participant::Body(id)),
            ShapeTag::Particle(particle) => objects
                .get::<ParticleEmitter>(particle.emitter)
                .ok()
                .filter(|emitter| emitter.particle(particle).is_some())
                .map(|_| Participant::Particle(particle)),
        }
    }

    fn dispatch_contact(
        &mut self,
        objects: &mut Objects,
        manifold: &ContactManifold,
        point: &ContactPoint,
        pair: ContactPair,
    ) {
        let side_a = Participant::from_pair_side(pair, true);
        let side_b = Participant::from_pair_side(pair, false);

        // Each side sees the other's contact point and a normal towards it
        let base_a = CollisionBase::new(
            point.position_on_b,
            -point.normal_on_b,
            self.face_at(objects, side_b, manifold.body_b, point.position_on_b),
        );
        let base_b = CollisionBase::new(
            point.position_on_a,
            point.normal_on_b,
            self.face_at(objects, side_a, manifold.body_a, point.position_on_a),
        );

        match pair {
            ContactPair::Bodies(a, b) => {
                self.apply_solver_pose(objects, a, manifold.body_a);
                self.apply_solver_pose(objects, b, manifold.body_b);
                self.fire_collision(objects, a, Collision { base: base_a, other: b });
                self.fire_collision(objects, b, Collision { base: base_b, other: a });
            }
            ContactPair::BodyParticle {
                body,
                particle,
                body_is_a,
            } => {
                let (body_handle, particle_handle, body_base, particle_base) = if body_is_a {
                    (manifold.body_a, manifold.body_b, base_a, base_b)
                } else {
                    (manifold.body_b, manifold.body_a, base_b, base_a)
                };
                self.apply_solver_pose(objects, body, body_handle);
                self.apply_particle_pose(objects, particle, particle_handle);
                self.fire_particle_collision(
                    objects,
                    body,
                    ParticleCollision {
                        base: body_base,
                        other: particle,
                    },
                );
                self.fire_emitter_collision(
                    objects,
                    particle,
                    Collision {
                        base: particle_base,
                        other: body,
                    },
                );
            }
            ContactPair::Particles(a, b) => {
                self.apply_particle_pose(objects, a, manifold.body_a);
                self.apply_particle_pose(objects, b, manifold.body_b);
                trace!(?a, ?b, "Particle contact");
            }
        }
    }

    /// Triangle of a body's mesh collider containing `world_point`, -1 otherwise
    fn face_at(
        &self,
        objects: &Objects,
        participant: Participant,
        handle: BodyHandle,
        world_point: Vec3,
    ) -> i32 {
        let Participant::Body(id) = participant else {
            return -1;
        };
        let Ok(collider) = objects.get::<PhysicsBody>(id).map(|body| body.collider) else {
            return -1;
        };
        let Ok(info) = objects.get::<ColliderObject>(collider) else {
            return -1;
        };
        let Some(mesh) = info.info.mesh() else {
            return -1;
        };
        let Some(pose) = self.solver.body_pose(handle) else {
            return -1;
        };

        let scale = objects.global_scale(collider);
        let local = pose.inverse_transform_point(world_point) / scale;
        let face = mesh
            .triangles()
            .find(|(_, [a, b, c])| point_in_triangle(local, *a, *b, *c))
            .map_or(-1, |(face, _)| face as i32);
        face
    }

    fn fire_collision(&mut self, objects: &mut Objects, id: ObjectId, event: Collision) {
        let mut listeners = match objects.get_mut::<PhysicsBody>(id) {
            Ok(body) => std::mem::take(&mut body.collision_events),
            Err(_) => return,
        };
        {
            let mut ctx = CollisionContext {
                objects: &mut *objects,
                commands: &mut self.commands,
            };
            for listener in listeners.iter_mut() {
                listener(&mut ctx, &event);
            }
        }
        if let Ok(body) = objects.get_mut::<PhysicsBody>(id) {
            let added = std::mem::replace(&mut body.collision_events, listeners);
            body.collision_events.extend(added);
        }
    }

    fn fire_particle_collision(&mut self, objects: &mut Objects, id: ObjectId, event: ParticleCollision) {
        let mut listeners = match objects.get_mut::<PhysicsBody>(id) {
            Ok(body) => std::mem::take(&mut body.particle_collision_events),
            Err(_) => return,
        };
        {
            let mut ctx = CollisionContext {
                objects: &mut *objects,
                commands: &mut self.commands,
            };
            for listener in listeners.iter_mut() {
                listener(&mut ctx, &event);
            }
        }
        if let Ok(body) = objects.get_mut::<PhysicsBody>(id) {
            let added = std::mem::replace(&mut body.particle_collision_events, listeners);
            body.particle_collision_events.extend(added);
        }
    }

    /// Let the particle's emitter react: the particle loses lifetime, then
    /// the emitter's listeners run.
    fn fire_emitter_collision(&mut self, objects: &mut Objects, particle: ParticleId, event: Collision) {
        let mut listeners = match objects.get_mut::<ParticleEmitter>(particle.emitter) {
            Ok(emitter) => {
                emitter.on_collision(particle);
                std::mem::take(&mut emitter.collision_events)
            }
            Err(_) => return,
        };
        {
            let mut ctx = CollisionContext {
                objects: &mut *objects,
                commands: &mut self.commands,
            };
            for listener in listeners.iter_mut() {
                listener(&mut ctx, &event, particle);
            }
        }
        if let Ok(emitter) = objects.get_mut::<ParticleEmitter>(particle.emitter) {
            let added = std::mem::replace(&mut emitter.collision_events, listeners);
            emitter.collision_events.extend(added);
        }
    }

    /// Apply every command queued during dispatch, in order
    pub fn apply_commands(&mut self, objects: &mut Objects) {
        for command in self.commands.drain() {
            let object = command.object();
            match command {
                PhysicsCommand::RemoveBody { .. } => {
                    match self.release_body(objects, object) {
                        Ok(()) => {
                            let _ = objects.remove_one::<PhysicsBody>(object);
                        }
                        Err(err) => warn!(%err, "Dropping remove command"),
                    }
                    continue;
                }
                PhysicsCommand::Destroy { .. } => {
                    if let Err(err) = self.destroy(objects, object) {
                        warn!(%err, "Dropping destroy command");
                    }
                    continue;
                }
                _ => {}
            }

            let handle = match self.body_handle_of(objects, object) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(%err, "Dropping physics command");
                    continue;
                }
            };
            match command {
                PhysicsCommand::ApplyImpulse { impulse, .. } => {
                    self.solver.apply_central_impulse(handle, impulse)
                }
                PhysicsCommand::ApplyForce { force, .. } => {
                    self.solver.apply_central_force(handle, force)
                }
                PhysicsCommand::SetVelocity { velocity, .. } => {
                    self.solver.set_linear_velocity(handle, velocity)
                }
                PhysicsCommand::SetAngular { velocity, .. } => {
                    self.solver.set_angular_velocity(handle, velocity)
                }
                PhysicsCommand::RemoveBody { .. } | PhysicsCommand::Destroy { .. } => {}
            }
        }
    }

    // ---- Queries ----

    /// Physics bodies currently in contact with `id`, without duplicates.
    ///
    /// Particles are not reported.
    pub fn colliding_with(&self, objects: &Objects, id: ObjectId) -> Vec<ObjectId> {
        let mut collisions = Vec::new();
        for manifold in self.solver.manifolds() {
            let a = self.resolve(objects, manifold.body_a);
            let b = self.resolve(objects, manifold.body_b);
            let other = match (a, b) {
                (Some(Participant::Body(a)), Some(Participant::Body(b))) if a == id => b,
                (Some(Participant::Body(a)), Some(Participant::Body(b))) if b == id => a,
                _ => continue,
            };
            if other != id && !collisions.contains(&other) {
                collisions.push(other);
            }
        }
        collisions
    }

    /// Object owning the shape of a solver body
    pub fn body_owner(&self, handle: BodyHandle) -> Option<ObjectId> {
        let shape = self.solver.body_shape(handle)?;
        match self.solver.shape_tag(shape) {
            ShapeTag::Body(id) => Some(id),
            _ => None,
        }
    }

    // ---- Layers ----

    /// Add a layer colliding with every group
    pub fn add_layer(&mut self) -> Result<usize, PhysicsError> {
        self.add_layer_with_mask(u32::MAX)
    }

    /// Add a layer colliding with the groups in `mask`
    pub fn add_layer_with_mask(&mut self, mask: u32) -> Result<usize, PhysicsError> {
        let layer = self.layers.len();
        if layer >= MAX_LAYERS {
            return Err(PhysicsError::LayerLimit);
        }
        self.layers.push(1 << layer);
        self.layer_masks.push(mask);
        debug!(layer, mask = format_args!("{mask:#x}"), "Added collision layer");
        Ok(layer)
    }

    /// Change which groups a layer collides with.
    ///
    /// Only bodies created afterwards pick up the new mask.
    pub fn set_layer_mask(&mut self, layer: usize, mask: u32) -> Result<(), PhysicsError> {
        let slot = self
            .layer_masks
            .get_mut(layer)
            .ok_or(PhysicsError::UnknownLayer(layer))?;
        *slot = mask;
        Ok(())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Group bit of a layer
    pub fn layer_group(&self, layer: usize) -> Option<u32> {
        self.layers.get(layer).copied()
    }

    pub fn layer_mask(&self, layer: usize) -> Option<u32> {
        self.layer_masks.get(layer).copied()
    }
}

impl Participant {
    fn from_pair_side(pair: ContactPair, side_a: bool) -> Participant {
        match pair {
            ContactPair::Bodies(a, b) => Participant::Body(if side_a { a } else { b }),
            ContactPair::BodyParticle {
                body,
                particle,
                body_is_a,
            } => {
                if side_a == body_is_a {
                    Participant::Body(body)
                } else {
                    Participant::Particle(particle)
                }
            }
            ContactPair::Particles(a, b) => Participant::Particle(if side_a { a } else { b }),
        }
    }
}

/// Write a solver pose into an object's local transform
fn write_pose(objects: &mut Objects, id: ObjectId, pose: Pose) {
    if let Some(transform) = objects.transform_mut(id) {
        transform.position = pose.position;
        transform.rotation = quat_to_euler(pose.rotation);
    }
}
