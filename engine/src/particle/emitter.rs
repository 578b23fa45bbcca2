//! Particle emitter component and its per-frame update

use super::particle::{Particle, ParticleId};
use super::system::{EmitterShapeKind, ParticleSystem};
use crate::core::object::{ObjectId, Objects};
use crate::math::{euler_to_quat, quat_to_euler};
use crate::physics::{
    ColliderInitInfo, EmitterCollisionCallback, PhysicalWorld, Pose, ShapeTag,
};
use crate::render::{DrawCall, RenderSink};
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::TAU;
use std::fmt;
use tracing::{debug, trace, warn};

/// Spawns and owns particles according to a [`ParticleSystem`]
pub struct ParticleEmitter {
    pub system: ParticleSystem,
    pub(crate) particles: Vec<Particle>,
    time: f32,
    emit_accumulator: f32,
    playing: bool,
    next_serial: u64,
    rng: Pcg32,
    pub(crate) collision_events: Vec<EmitterCollisionCallback>,
}

impl ParticleEmitter {
    /// Create an emitter; `seed` drives its spawn positions and directions
    pub fn new(system: ParticleSystem, seed: u64) -> Self {
        let playing = system.play_on_start;
        Self {
            system,
            particles: Vec::new(),
            time: 0.0,
            emit_accumulator: 0.0,
            playing,
            next_serial: 0,
            rng: Pcg32::seed_from_u64(seed),
            collision_events: Vec::new(),
        }
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.iter_mut().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start emitting from the beginning of the cycle
    pub fn play(&mut self) {
        self.playing = true;
        self.time = 0.0;
        self.emit_accumulator = 0.0;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Position inside the current emission cycle, in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Subscribe to collisions between this emitter's particles and physics bodies
    pub fn add_collision_event(&mut self, callback: EmitterCollisionCallback) {
        self.collision_events.push(callback);
    }

    /// A particle hit a physics body: it loses part of its lifetime
    pub(crate) fn on_collision(&mut self, id: ParticleId) {
        let loss = self.system.collision.lifetime_loss * self.system.start_lifetime;
        if let Some(particle) = self.particle_mut(id) {
            particle.lifetime -= loss;
            trace!(particle = ?id, lifetime = particle.lifetime, "Particle collided");
        }
    }

    /// Advance the emission clock, returning how many particles are due
    fn advance_clock(&mut self, delta: f32) -> usize {
        if !self.playing {
            return 0;
        }

        self.time += delta;
        self.emit_accumulator += delta * self.system.emission.rate_over_time.max(0.0);
        let due = self.emit_accumulator.floor();
        self.emit_accumulator -= due;

        if self.system.duration > 0.0 && self.time >= self.system.duration {
            self.time %= self.system.duration;
            if !self.system.looping {
                self.playing = false;
            }
        }
        due as usize
    }

    /// Spawn offset and direction in emitter space
    fn sample_shape(&mut self) -> (Vec3, Vec3) {
        match self.system.shape.kind {
            EmitterShapeKind::Cone => {
                // sqrt keeps the disc uniformly covered
                let radius = self.system.shape.radius.max(0.0) * self.rng.random::<f32>().sqrt();
                let around = self.rng.random::<f32>() * TAU;
                let offset = Vec3::new(radius * around.cos(), radius * around.sin(), 0.0);

                let tilt = (self.system.shape.angle.max(0.0) * self.rng.random::<f32>()).to_radians();
                let azimuth = self.rng.random::<f32>() * TAU;
                let direction = Vec3::new(
                    tilt.sin() * azimuth.cos(),
                    tilt.sin() * azimuth.sin(),
                    tilt.cos(),
                );
                (offset, direction)
            }
        }
    }
}

impl fmt::Debug for ParticleEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleEmitter")
            .field("system", &self.system)
            .field("particles", &self.particles.len())
            .field("time", &self.time)
            .field("playing", &self.playing)
            .field("collision_events", &self.collision_events.len())
            .finish()
    }
}

/// Spawn up to `amount` particles on emitter `id`, never beyond `max_particles`.
///
/// Returns how many were spawned. Collider-backed particles get their own
/// shape and rigid body and an initial impulse along their direction.
pub fn emit(objects: &mut Objects, physics: &mut PhysicalWorld, id: ObjectId, amount: usize) -> usize {
    let origin = objects.global_position(id);
    let orientation = euler_to_quat(objects.global_rotation(id));
    let Ok(emitter) = objects.get_mut::<ParticleEmitter>(id) else {
        return 0;
    };

    let room = emitter
        .system
        .max_particles
        .saturating_sub(emitter.particles.len());
    let count = amount.min(room);
    if count < amount {
        debug!(emitter = ?id, requested = amount, room, "Particle cap reached");
    }

    let system = emitter.system.clone();
    let scale = Vec3::splat(system.start_size);

    for _ in 0..count {
        let (offset, direction) = emitter.sample_shape();
        let offset = orientation * offset;
        let direction = (orientation * direction).normalize_or(Vec3::Z);
        let rotation = Quat::from_rotation_arc(Vec3::Z, direction);

        let particle_id = ParticleId {
            emitter: id,
            serial: emitter.next_serial,
        };
        emitter.next_serial += 1;

        let mut particle = Particle {
            id: particle_id,
            position: offset,
            rotation: quat_to_euler(rotation),
            scale,
            velocity: direction,
            color: system.start_color,
            lifetime: system.start_lifetime,
            pid: None,
            cpid: None,
        };

        if system.collision.use_colliders {
            let info = ColliderInitInfo::sized(system.collision.shape, scale, None);
            let cpid = physics.register_shape(&info, Vec3::ONE);
            physics.tag_shape(cpid, ShapeTag::Particle(particle_id));
            particle.cpid = Some(cpid);
            particle.position = origin + offset;

            let pose = Pose::new(particle.position, rotation);
            match physics.create_rigid_body(cpid, system.collision.mass, pose, 0, true) {
                Ok(pid) => {
                    particle.pid = Some(pid);
                    if let Some(handle) = physics.body_handle(pid) {
                        physics
                            .solver_mut()
                            .apply_central_impulse(handle, direction * system.start_speed);
                    }
                }
                Err(err) => warn!(emitter = ?id, %err, "Could not create particle body"),
            }
        }

        emitter.particles.push(particle);
    }

    if count > 0 {
        trace!(emitter = ?id, count, live = emitter.particles.len(), "Emitted particles");
    }
    count
}

/// Release the solver body and shape of one particle, if it has any
pub(crate) fn release_particle(objects: &mut Objects, physics: &mut PhysicalWorld, id: ParticleId) {
    // Indices are read fresh before each removal since removal renumbers them
    let pid = objects
        .get::<ParticleEmitter>(id.emitter)
        .ok()
        .and_then(|emitter| emitter.particle(id).and_then(|p| p.pid));
    if let Some(pid) = pid {
        physics.remove_rigid_body(objects, pid);
    }

    let cpid = objects
        .get::<ParticleEmitter>(id.emitter)
        .ok()
        .and_then(|emitter| emitter.particle(id).and_then(|p| p.cpid));
    if let Some(cpid) = cpid {
        physics.remove_shape(objects, cpid);
    }
}

/// Release the solver resources of every particle of emitter `id`
pub(crate) fn release_all(objects: &mut Objects, physics: &mut PhysicalWorld, id: ObjectId) {
    let ids: Vec<ParticleId> = match objects.get::<ParticleEmitter>(id) {
        Ok(emitter) => emitter.particles.iter().map(|p| p.id).collect(),
        Err(_) => return,
    };
    for particle in ids {
        release_particle(objects, physics, particle);
    }
}

/// Per-frame emitter update.
///
/// Emits what the clock says is due, ages and moves every particle, removes
/// the expired ones (releasing their solver resources) and submits the
/// survivors for drawing.
pub(crate) fn update_emitter(
    objects: &mut Objects,
    physics: &mut PhysicalWorld,
    id: ObjectId,
    delta: f32,
    sink: &mut dyn RenderSink,
) {
    let due = match objects.get_mut::<ParticleEmitter>(id) {
        Ok(emitter) => emitter.advance_clock(delta),
        Err(_) => return,
    };
    if due > 0 {
        emit(objects, physics, id, due);
    }

    let expired: Vec<ParticleId> = {
        let Ok(emitter) = objects.get_mut::<ParticleEmitter>(id) else {
            return;
        };
        let speed = emitter.system.start_speed;
        for particle in emitter.particles.iter_mut() {
            particle.lifetime -= delta;

            match particle.pid.and_then(|pid| physics.body_handle(pid)) {
                Some(handle) => {
                    if let Some(pose) = physics.solver().body_pose(handle) {
                        particle.position = pose.position;
                        particle.rotation = quat_to_euler(pose.rotation);
                    }
                    particle.velocity = physics.solver().linear_velocity(handle);
                }
                None if particle.cpid.is_none() => {
                    particle.position += particle.velocity * speed * delta;
                }
                None => {}
            }
        }
        emitter
            .particles
            .iter()
            .filter(|p| p.is_expired())
            .map(|p| p.id)
            .collect()
    };

    for particle in &expired {
        release_particle(objects, physics, *particle);
    }

    let origin = objects.global_position(id);
    let Ok(emitter) = objects.get_mut::<ParticleEmitter>(id) else {
        return;
    };
    if !expired.is_empty() {
        emitter.particles.retain(|p| !p.is_expired());
        trace!(emitter = ?id, removed = expired.len(), live = emitter.particles.len(), "Culled particles");
    }

    let renderer = emitter.system.renderer;
    for particle in &emitter.particles {
        sink.submit(DrawCall {
            mesh: renderer.mesh,
            material: renderer.material,
            transform: particle.transform(origin),
            color: particle.color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::particle::system::{Emission, EmitterShape, ParticleCollisionSettings};
    use crate::render::DrawList;

    fn straight_system() -> ParticleSystem {
        ParticleSystem {
            start_speed: 2.0,
            start_lifetime: 1.0,
            emission: Emission {
                rate_over_time: 0.0,
            },
            shape: EmitterShape {
                radius: 0.0,
                angle: 0.0,
                ..Default::default()
            },
            play_on_start: false,
            ..Default::default()
        }
    }

    fn setup(system: ParticleSystem) -> (Objects, PhysicalWorld, ObjectId) {
        let mut objects = Objects::new();
        let physics = PhysicalWorld::new(&PhysicsConfig::default());
        let id = objects.spawn("emitter");
        objects
            .insert_one(id, ParticleEmitter::new(system, 7))
            .unwrap();
        (objects, physics, id)
    }

    #[test]
    fn test_clock_emits_at_rate() {
        let mut emitter = ParticleEmitter::new(
            ParticleSystem {
                emission: Emission {
                    rate_over_time: 4.0,
                },
                ..Default::default()
            },
            1,
        );
        assert_eq!(emitter.advance_clock(0.5), 2);
        assert_eq!(emitter.advance_clock(0.125), 0);
        assert_eq!(emitter.advance_clock(0.125), 1);
    }

    #[test]
    fn test_non_looping_stops_after_duration() {
        let mut emitter = ParticleEmitter::new(
            ParticleSystem {
                duration: 1.0,
                looping: false,
                ..Default::default()
            },
            1,
        );
        assert!(emitter.is_playing());
        emitter.advance_clock(0.75);
        assert!(emitter.is_playing());
        emitter.advance_clock(0.5);
        assert!(!emitter.is_playing());
        assert_eq!(emitter.advance_clock(1.0), 0);
    }

    #[test]
    fn test_emit_respects_cap() {
        let (mut objects, mut physics, id) = setup(ParticleSystem {
            max_particles: 3,
            ..straight_system()
        });
        assert_eq!(emit(&mut objects, &mut physics, id, 2), 2);
        assert_eq!(emit(&mut objects, &mut physics, id, 5), 1);
        assert_eq!(emit(&mut objects, &mut physics, id, 1), 0);
        assert_eq!(objects.get::<ParticleEmitter>(id).unwrap().len(), 3);
    }

    #[test]
    fn test_zero_cone_emits_forward() {
        let (mut objects, mut physics, id) = setup(straight_system());
        emit(&mut objects, &mut physics, id, 1);

        let emitter = objects.get::<ParticleEmitter>(id).unwrap();
        let particle = &emitter.particles()[0];
        assert!((particle.velocity - Vec3::Z).length() < 1e-5);
        assert_eq!(particle.position, Vec3::ZERO);
        assert!(!particle.is_simulated());
    }

    #[test]
    fn test_update_moves_and_culls() {
        let (mut objects, mut physics, id) = setup(straight_system());
        emit(&mut objects, &mut physics, id, 1);
        let mut sink = DrawList::new();

        update_emitter(&mut objects, &mut physics, id, 0.5, &mut sink);
        {
            let emitter = objects.get::<ParticleEmitter>(id).unwrap();
            let particle = &emitter.particles()[0];
            assert!((particle.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-4);
        }
        assert_eq!(sink.len(), 1);

        sink.clear();
        update_emitter(&mut objects, &mut physics, id, 0.5, &mut sink);
        assert!(objects.get::<ParticleEmitter>(id).unwrap().is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_collision_costs_lifetime() {
        let (mut objects, mut physics, id) = setup(ParticleSystem {
            collision: ParticleCollisionSettings {
                lifetime_loss: 0.25,
                ..Default::default()
            },
            start_lifetime: 2.0,
            ..straight_system()
        });
        emit(&mut objects, &mut physics, id, 1);

        let emitter = objects.get_mut::<ParticleEmitter>(id).unwrap();
        let particle = emitter.particles()[0].id;
        emitter.on_collision(particle);
        assert_eq!(emitter.particle(particle).unwrap().lifetime, 1.5);
    }

    #[test]
    fn test_collider_particles_get_bodies() {
        let (mut objects, mut physics, id) = setup(ParticleSystem {
            collision: ParticleCollisionSettings {
                use_colliders: true,
                ..Default::default()
            },
            ..straight_system()
        });
        emit(&mut objects, &mut physics, id, 2);
        assert_eq!(physics.body_count(), 2);
        assert_eq!(physics.shape_count(), 2);

        release_all(&mut objects, &mut physics, id);
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.shape_count(), 0);
        let emitter = objects.get::<ParticleEmitter>(id).unwrap();
        assert!(emitter.particles().iter().all(|p| p.pid().is_none() && p.cpid().is_none()));
    }
}
