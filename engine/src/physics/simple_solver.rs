//! Default in-process solver: explicit Euler integration with impulse-based
//! contact resolution.
//!
//! One call to [`step`](PhysicsSolver::step) integrates every awake dynamic
//! body, then detects and resolves contacts once. Collision detection for
//! event dispatch runs separately through
//! [`perform_discrete_collision_detection`](PhysicsSolver::perform_discrete_collision_detection),
//! which only reports manifolds and never moves anything.

use crate::config::PhysicsConfig;
use crate::physics::collision::{
    broad_phase::{sweep_and_prune, BroadPhaseEntry},
    narrow_phase::test_collision,
    CollisionShape, Contact,
};
use crate::physics::solver::{
    BodyDesc, BodyHandle, ContactManifold, ContactPoint, PhysicsSolver, Pose, ShapeDesc,
    ShapeHandle, ShapeTag, SolverRayHit,
};
use glam::{Mat3, Quat, Vec3};
use tracing::{debug, trace};

/// Shapes closer than this still report a manifold
const CONTACT_MARGIN: f32 = 0.02;
/// Fraction of the penetration removed per step for moving bodies
const CORRECTION_BIAS: f32 = 0.8;

struct ShapeSlot {
    desc: ShapeDesc,
    scale: Vec3,
    tag: ShapeTag,
    collision: CollisionShape,
}

struct SolverBody {
    shape: ShapeHandle,
    inv_mass: f32,
    inv_inertia: Vec3,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    force: Vec3,
    linear_factor: Vec3,
    angular_factor: Vec3,
    linear_damping: f32,
    angular_damping: f32,
    group: u32,
    mask: u32,
    can_sleep: bool,
    idle_steps: u32,
    sleeping: bool,
}

impl SolverBody {
    fn is_dynamic(&self) -> bool {
        self.inv_mass > 0.0
    }

    fn is_awake_dynamic(&self) -> bool {
        self.is_dynamic() && !self.sleeping
    }

    fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    fn wake(&mut self) {
        self.sleeping = false;
        self.idle_steps = 0;
    }

    /// Inverse inertia tensor in world space
    fn inv_inertia_world(&self) -> Mat3 {
        let r = Mat3::from_quat(self.rotation);
        r * Mat3::from_diagonal(self.inv_inertia) * r.transpose()
    }

    fn accepts(&self, other: &SolverBody) -> bool {
        self.group & other.mask != 0 && other.group & self.mask != 0
    }
}

/// Slot storage that hands freed slots back out.
///
/// Removing an entry bumps the generation of its slot, so handles to the
/// removed entry stop resolving once the slot is reused.
struct Slots<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store `value`, returning its slot and generation
    fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.entries.get_mut(slot as usize) {
                entry.value = Some(value);
                return (slot, entry.generation);
            }
        }
        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        (slot, 0)
    }

    fn remove(&mut self, slot: u32, generation: u32) -> Option<T> {
        let entry = self.entries.get_mut(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        Some(value)
    }

    fn get(&self, slot: u32, generation: u32) -> Option<&T> {
        self.entries
            .get(slot as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_ref())
    }

    fn get_mut(&mut self, slot: u32, generation: u32) -> Option<&mut T> {
        self.entries
            .get_mut(slot as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_mut())
    }

    /// Live entry in `slot`, whatever its generation
    fn at(&self, slot: usize) -> Option<&T> {
        self.entries.get(slot)?.value.as_ref()
    }

    fn generation_at(&self, slot: usize) -> u32 {
        self.entries.get(slot).map_or(0, |entry| entry.generation)
    }

    fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| Some((slot, entry.value.as_ref()?)))
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().filter_map(|entry| entry.value.as_mut())
    }

    /// Two distinct live entries borrowed mutably at once
    fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut T, &mut T)> {
        if i == j {
            return None;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (left, right) = self.entries.split_at_mut(hi);
        let a = left.get_mut(lo)?.value.as_mut()?;
        let b = right.first_mut()?.value.as_mut()?;
        if i < j {
            Some((a, b))
        } else {
            Some((b, a))
        }
    }

    fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    fn slot_count(&self) -> usize {
        self.entries.len()
    }
}

/// Explicit-Euler rigid body solver used by default
pub struct SimpleSolver {
    config: PhysicsConfig,
    shapes: Slots<ShapeSlot>,
    bodies: Slots<SolverBody>,
    manifolds: Vec<ContactManifold>,
}

impl SimpleSolver {
    pub fn new(config: PhysicsConfig) -> Self {
        debug!(gravity = ?config.gravity, "Creating simple solver");
        Self {
            config,
            shapes: Slots::new(),
            bodies: Slots::new(),
            manifolds: Vec::new(),
        }
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Body slots allocated so far, live or free
    pub fn body_slots(&self) -> usize {
        self.bodies.slot_count()
    }

    /// Shape slots allocated so far, live or free
    pub fn shape_slots(&self) -> usize {
        self.shapes.slot_count()
    }

    /// Whether a body has been put to sleep
    pub fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.body(body).is_some_and(|b| b.sleeping)
    }

    fn body(&self, handle: BodyHandle) -> Option<&SolverBody> {
        self.bodies.get(handle.slot(), handle.generation())
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut SolverBody> {
        self.bodies.get_mut(handle.slot(), handle.generation())
    }

    fn shape(&self, handle: ShapeHandle) -> Option<&ShapeSlot> {
        self.shapes.get(handle.slot(), handle.generation())
    }

    fn shape_mut(&mut self, handle: ShapeHandle) -> Option<&mut ShapeSlot> {
        self.shapes.get_mut(handle.slot(), handle.generation())
    }

    /// Current handle of the body living in `slot`
    fn body_handle_at(&self, slot: usize) -> BodyHandle {
        BodyHandle::new(slot as u32, self.bodies.generation_at(slot))
    }

    /// Broad-phase candidate pairs as body slots, filtered by layer and motion.
    ///
    /// Resolution only needs pairs with an awake dynamic body; reporting also
    /// keeps pairs whose dynamic body is asleep so resting contacts persist.
    fn candidate_pairs(&self, margin: f32, include_sleeping: bool) -> Vec<(usize, usize)> {
        let entries: Vec<BroadPhaseEntry> = self
            .bodies
            .iter()
            .filter_map(|(slot, body)| {
                let shape = self.shape(body.shape)?;
                Some(BroadPhaseEntry {
                    slot,
                    aabb: shape.collision.world_aabb(&body.pose()).inflated(margin),
                })
            })
            .collect();

        sweep_and_prune(&entries)
            .into_iter()
            .map(|(i, j)| (entries[i].slot, entries[j].slot))
            .filter(|&(i, j)| match (self.bodies.at(i), self.bodies.at(j)) {
                (Some(a), Some(b)) => {
                    let moving = if include_sleeping {
                        a.is_dynamic() || b.is_dynamic()
                    } else {
                        a.is_awake_dynamic() || b.is_awake_dynamic()
                    };
                    moving && a.accepts(b)
                }
                _ => false,
            })
            .collect()
    }

    fn contact_between(&self, i: usize, j: usize, margin: f32) -> Option<Contact> {
        let a = self.bodies.at(i)?;
        let b = self.bodies.at(j)?;
        let shape_a = self.shape(a.shape)?;
        let shape_b = self.shape(b.shape)?;
        test_collision(&shape_a.collision, &a.pose(), &shape_b.collision, &b.pose(), margin)
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        let max_velocity = self.config.max_linear_velocity;

        for body in self.bodies.values_mut() {
            if !body.is_awake_dynamic() {
                body.force = Vec3::ZERO;
                continue;
            }

            // v = v + a * dt
            let acceleration = gravity + body.force * body.inv_mass;
            let velocity = (body.linear_velocity + acceleration * dt) * body.linear_factor;
            let damped = velocity * (1.0 - body.linear_damping).clamp(0.0, 1.0).powf(dt);
            body.linear_velocity = damped.clamp_length_max(max_velocity);

            body.angular_velocity = body.angular_velocity
                * (1.0 - body.angular_damping).clamp(0.0, 1.0).powf(dt)
                * body.angular_factor;

            // x = x + v * dt
            body.position += body.linear_velocity * dt;

            if body.angular_velocity.length_squared() > 1e-12 {
                let angle = body.angular_velocity.length() * dt;
                let axis = body.angular_velocity.normalize();
                body.rotation = (Quat::from_axis_angle(axis, angle) * body.rotation).normalize();
            }

            body.force = Vec3::ZERO;
        }
    }

    fn resolve_contacts(&mut self) {
        let pairs = self.candidate_pairs(0.0, false);
        trace!(pairs = pairs.len(), "Broad phase pairs");

        for (i, j) in pairs {
            let Some(contact) = self.contact_between(i, j, 0.0) else {
                continue;
            };
            let restitution = self.config.restitution;
            let rest_threshold = self.config.rest_velocity_threshold;
            if let Some((a, b)) = self.bodies.pair_mut(i, j) {
                resolve_contact(a, b, &contact, restitution, rest_threshold);
            }
        }
    }

    fn update_sleep(&mut self) {
        let threshold = self.config.sleep_threshold;
        let delay = self.config.sleep_delay_steps;

        for body in self.bodies.values_mut() {
            if !body.is_awake_dynamic() || !body.can_sleep {
                continue;
            }
            if body.linear_velocity.length() < threshold && body.angular_velocity.length() < threshold {
                body.idle_steps += 1;
                if body.idle_steps >= delay {
                    body.sleeping = true;
                    body.linear_velocity = Vec3::ZERO;
                    body.angular_velocity = Vec3::ZERO;
                    trace!(shape = ?body.shape, "Body went to sleep");
                }
            } else {
                body.idle_steps = 0;
            }
        }
    }
}

/// Push two bodies apart and exchange a restitution impulse along the contact normal
fn resolve_contact(
    a: &mut SolverBody,
    b: &mut SolverBody,
    contact: &Contact,
    restitution: f32,
    rest_threshold: f32,
) {
    let inv_mass_a = a.inv_mass;
    let inv_mass_b = b.inv_mass;
    let total_inv_mass = inv_mass_a + inv_mass_b;
    if total_inv_mass <= 0.0 {
        return;
    }

    let normal = contact.normal;

    // Wake a sleeping body that something is pushing into
    if a.sleeping && b.is_awake_dynamic() {
        a.wake();
    }
    if b.sleeping && a.is_awake_dynamic() {
        b.wake();
    }

    if contact.penetration > 0.0 {
        let resting = a.linear_velocity.length() < rest_threshold
            || b.linear_velocity.length() < rest_threshold;
        let correction = if resting {
            contact.penetration
        } else {
            contact.penetration * CORRECTION_BIAS
        };

        // Normal points from A to B: A moves along -normal, B along +normal
        a.position -= normal * correction * (inv_mass_a / total_inv_mass) * a.linear_factor;
        b.position += normal * correction * (inv_mass_b / total_inv_mass) * b.linear_factor;
    }

    let point = contact.midpoint();
    let r_a = point - a.position;
    let r_b = point - b.position;

    let vel_a = a.linear_velocity + a.angular_velocity.cross(r_a);
    let vel_b = b.linear_velocity + b.angular_velocity.cross(r_b);
    let velocity_along_normal = (vel_b - vel_a).dot(normal);

    // Already separating
    if velocity_along_normal > 0.0 {
        return;
    }

    let bounce = if -velocity_along_normal < rest_threshold {
        0.0
    } else {
        restitution
    };

    let inv_inertia_a = a.inv_inertia_world();
    let inv_inertia_b = b.inv_inertia_world();
    let angular_a = (inv_inertia_a * r_a.cross(normal)).cross(r_a);
    let angular_b = (inv_inertia_b * r_b.cross(normal)).cross(r_b);
    let denominator = total_inv_mass + normal.dot(angular_a + angular_b);
    if denominator <= f32::EPSILON {
        return;
    }

    let j = -(1.0 + bounce) * velocity_along_normal / denominator;
    let impulse = normal * j;

    a.linear_velocity -= impulse * inv_mass_a * a.linear_factor;
    a.angular_velocity -= inv_inertia_a * r_a.cross(impulse) * a.angular_factor;
    b.linear_velocity += impulse * inv_mass_b * b.linear_factor;
    b.angular_velocity += inv_inertia_b * r_b.cross(impulse) * b.angular_factor;
}

impl PhysicsSolver for SimpleSolver {
    fn create_shape(&mut self, desc: ShapeDesc) -> ShapeHandle {
        let collision = CollisionShape::from_desc(&desc, Vec3::ONE);
        let (slot, generation) = self.shapes.insert(ShapeSlot {
            desc,
            scale: Vec3::ONE,
            tag: ShapeTag::Untagged,
            collision,
        });
        let handle = ShapeHandle::new(slot, generation);
        trace!(shape = ?handle, "Created shape");
        handle
    }

    fn set_shape_scale(&mut self, shape: ShapeHandle, scale: Vec3) {
        if let Some(slot) = self.shape_mut(shape) {
            slot.scale = scale;
            slot.collision = CollisionShape::from_desc(&slot.desc, scale);
        }
    }

    fn remove_shape(&mut self, shape: ShapeHandle) {
        self.shapes.remove(shape.slot(), shape.generation());
    }

    fn set_shape_tag(&mut self, shape: ShapeHandle, tag: ShapeTag) {
        if let Some(slot) = self.shape_mut(shape) {
            slot.tag = tag;
        }
    }

    fn shape_tag(&self, shape: ShapeHandle) -> ShapeTag {
        self.shape(shape).map(|s| s.tag).unwrap_or_default()
    }

    fn local_inertia(&self, shape: ShapeHandle, mass: f32) -> Vec3 {
        if mass <= 0.0 {
            return Vec3::ZERO;
        }
        self.shape(shape)
            .map(|s| s.collision.local_inertia(mass))
            .unwrap_or(Vec3::ZERO)
    }

    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let inv_mass = if desc.mass > 0.0 { 1.0 / desc.mass } else { 0.0 };
        let inv = |i: f32| if i > 0.0 && inv_mass > 0.0 { 1.0 / i } else { 0.0 };

        let (slot, generation) = self.bodies.insert(SolverBody {
            shape: desc.shape,
            inv_mass,
            inv_inertia: Vec3::new(
                inv(desc.local_inertia.x),
                inv(desc.local_inertia.y),
                inv(desc.local_inertia.z),
            ),
            position: desc.pose.position,
            rotation: desc.pose.rotation.normalize(),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            linear_factor: Vec3::ONE,
            angular_factor: Vec3::ONE,
            linear_damping: 0.0,
            angular_damping: 0.0,
            group: desc.group,
            mask: desc.mask,
            can_sleep: true,
            idle_steps: 0,
            sleeping: false,
        });
        let handle = BodyHandle::new(slot, generation);
        debug!(body = ?handle, mass = desc.mass, "Created rigid body");
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(body.slot(), body.generation());
        self.manifolds
            .retain(|m| m.body_a != body && m.body_b != body);
    }

    fn body_shape(&self, body: BodyHandle) -> Option<ShapeHandle> {
        self.body(body).map(|b| b.shape)
    }

    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.body(body).map(SolverBody::pose)
    }

    fn set_body_pose(&mut self, body: BodyHandle, pose: Pose) {
        if let Some(b) = self.body_mut(body) {
            b.position = pose.position;
            b.rotation = pose.rotation.normalize();
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vec3 {
        self.body(body).map(|b| b.linear_velocity).unwrap_or(Vec3::ZERO)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.linear_velocity = velocity;
            b.wake();
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.angular_velocity = velocity;
            b.wake();
        }
    }

    fn apply_central_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.linear_velocity += impulse * b.inv_mass * b.linear_factor;
            b.wake();
        }
    }

    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.force += force * b.linear_factor;
            b.wake();
        }
    }

    fn set_linear_factor(&mut self, body: BodyHandle, factor: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.linear_factor = factor;
        }
    }

    fn set_angular_factor(&mut self, body: BodyHandle, factor: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.angular_factor = factor;
        }
    }

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32) {
        if let Some(b) = self.body_mut(body) {
            b.linear_damping = linear;
            b.angular_damping = angular;
        }
    }

    fn set_deactivation_enabled(&mut self, body: BodyHandle, enabled: bool) {
        if let Some(b) = self.body_mut(body) {
            b.can_sleep = enabled;
            if !enabled {
                b.wake();
            }
        }
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integrate(dt);
        self.resolve_contacts();
        self.update_sleep();
    }

    fn perform_discrete_collision_detection(&mut self) {
        let mut manifolds = Vec::new();

        for (i, j) in self.candidate_pairs(CONTACT_MARGIN, true) {
            if let Some(contact) = self.contact_between(i, j, CONTACT_MARGIN) {
                manifolds.push(ContactManifold {
                    body_a: self.body_handle_at(i),
                    body_b: self.body_handle_at(j),
                    points: vec![ContactPoint {
                        position_on_a: contact.point_on_a,
                        position_on_b: contact.point_on_b,
                        normal_on_b: -contact.normal,
                        distance: -contact.penetration,
                    }],
                });
            }
        }

        trace!(manifolds = manifolds.len(), "Discrete collision detection");
        self.manifolds = manifolds;
    }

    fn manifolds(&self) -> &[ContactManifold] {
        &self.manifolds
    }

    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<SolverRayHit> {
        let direction = direction.try_normalize()?;
        let mut best: Option<SolverRayHit> = None;

        for (slot, body) in self.bodies.iter() {
            if body.group & mask == 0 {
                continue;
            }
            let Some(shape) = self.shape(body.shape) else {
                continue;
            };

            let pose = body.pose();
            let local_origin = pose.inverse_transform_point(origin);
            let local_direction = pose.rotation.conjugate() * direction;
            let limit = best.map_or(max_distance, |b| b.distance);

            if let Some((distance, local_normal)) =
                shape.collision.raycast_local(local_origin, local_direction, limit)
            {
                best = Some(SolverRayHit {
                    body: self.body_handle_at(slot),
                    point: origin + direction * distance,
                    normal: pose.rotation * local_normal,
                    distance,
                });
            }
        }

        best
    }
}
