//! Headless demo: a few bodies drop onto a floor while a fountain sprays
//! collider particles at them

use engine::particle::{Emission, EmitterShape, ParticleCollisionSettings, ParticleRenderer};
use engine::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FRAMES: u64 = 600;
const FRAME_DELTA: f32 = 1.0 / 60.0;

fn main() {
    engine::init_logging();
    info!("Starting headless game");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).unwrap_or_else(|err| {
            warn!(%path, %err, "Falling back to the default config");
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    };

    let mut scene = Scene::new(config);
    let hits = Arc::new(AtomicUsize::new(0));
    let demo = match create_demo_scene(&mut scene, hits.clone()) {
        Ok(demo) => demo,
        Err(err) => {
            error!(%err, "Could not build demo scene");
            return;
        }
    };

    let mut clock = FrameClock::new();
    let mut draws = DrawList::new();
    while clock.frame() < FRAMES {
        let delta = clock.advance(FRAME_DELTA);
        draws.clear();
        scene.update(delta, &mut draws);

        if clock.frame() % 60 == 0 {
            report(&scene, &demo, &clock, &draws, &hits);
        }
    }

    info!(
        frames = clock.frame(),
        elapsed = clock.elapsed(),
        particle_hits = hits.load(Ordering::Relaxed),
        "Demo finished"
    );
}

/// Objects the demo reports on
struct Demo {
    floor: ObjectId,
    crate_box: ObjectId,
    fountain: ObjectId,
}

fn create_demo_scene(scene: &mut Scene, hits: Arc<AtomicUsize>) -> Result<Demo, PhysicsError> {
    info!("Creating demo scene");

    let floor_collider = scene.spawn_collider(
        "floor collider",
        ColliderInitInfo::for_box(Vec3::new(20.0, 1.0, 20.0)),
        None,
    );
    let floor = scene.spawn_physics_body(
        "floor",
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        floor_collider,
        0.0,
    )?;
    attach_mesh(scene, floor, MeshHandle::CUBE)?;

    for (i, x) in [-2.0, 0.0, 2.0].into_iter().enumerate() {
        let collider = scene.spawn_collider(
            format!("ball {i} collider"),
            ColliderInitInfo::for_sphere(0.5),
            None,
        );
        let ball = scene.spawn_physics_body(
            format!("ball {i}"),
            Transform::from_position(Vec3::new(x, 4.0 + i as f32, 0.0)),
            collider,
            1.0,
        )?;
        attach_mesh(scene, ball, MeshHandle::SPHERE)?;
    }

    let crate_collider = scene.spawn_collider(
        "crate collider",
        ColliderInitInfo::for_box(Vec3::ONE),
        None,
    );
    let crate_box = scene.spawn_physics_body(
        "crate",
        Transform::from_position(Vec3::new(0.0, 0.5, 4.0)),
        crate_collider,
        5.0,
    )?;
    scene
        .physics_body_mut(crate_box)
        .ok_or(PhysicsError::NotAPhysicsBody(crate_box))?
        .add_particle_collision_event(Box::new(
            move |_ctx: &mut CollisionContext<'_>, event: &ParticleCollision| {
                hits.fetch_add(1, Ordering::Relaxed);
                debug!(particle = ?event.other, point = ?event.base.contact_point, "Crate hit");
            },
        ));

    let system = ParticleSystem {
        start_speed: 6.0,
        start_lifetime: 3.0,
        emission: Emission {
            rate_over_time: 8.0,
        },
        shape: EmitterShape {
            radius: 0.1,
            angle: 15.0,
            ..Default::default()
        },
        collision: ParticleCollisionSettings {
            use_colliders: true,
            lifetime_loss: 0.5,
            ..Default::default()
        },
        renderer: ParticleRenderer {
            mesh: MeshHandle::SPHERE,
            material: MaterialHandle::DEFAULT,
        },
        max_particles: 32,
        ..Default::default()
    };
    // Tilted down towards the crate
    let fountain = scene.spawn_emitter(
        "fountain",
        Transform::from_position(Vec3::new(0.0, 3.0, 0.0)).with_rotation(Vec3::new(30.0, 0.0, 0.0)),
        system,
    );

    // Slowly turn the fountain around its vertical axis
    scene.add_behaviour(fountain, |ctx: &mut UpdateContext<'_>| {
        if let Some(transform) = ctx.objects.transform_mut(ctx.object) {
            transform.rotation.y += 20.0 * ctx.delta;
        }
        Traversal::Continue
    })?;

    Ok(Demo {
        floor,
        crate_box,
        fountain,
    })
}

fn attach_mesh(scene: &mut Scene, id: ObjectId, mesh: MeshHandle) -> Result<(), PhysicsError> {
    scene
        .objects_mut()
        .insert_one(id, MeshObject::new(mesh, MaterialHandle::DEFAULT))
        .map_err(|_| PhysicsError::UnknownObject(id))
}

fn report(scene: &Scene, demo: &Demo, clock: &FrameClock, draws: &DrawList, hits: &AtomicUsize) {
    let particles = scene
        .objects()
        .get::<ParticleEmitter>(demo.fountain)
        .map_or(0, |emitter| emitter.len());
    let crate_position = scene
        .objects()
        .transform(demo.crate_box)
        .map(|t| t.position)
        .unwrap_or_default();
    let below = scene.raycast(&Ray::new(Vec3::new(0.0, 10.0, 4.0), -Vec3::Y));

    info!(
        frame = clock.frame(),
        draws = draws.len(),
        particles,
        bodies = scene.physics().body_count(),
        crate_position = ?crate_position,
        particle_hits = hits.load(Ordering::Relaxed),
        on_floor = scene.colliding_with(demo.floor).len(),
        ray_distance = ?below.map(|hit| hit.distance),
        "Frame report"
    );
}
