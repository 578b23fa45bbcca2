//! Lazy body creation, pose sync and rigid-body pass-throughs

mod common;

use common::{handle_of, scripted_scene, spawn_ball, spawn_ground, step, weightless};
use engine::prelude::*;

#[test]
fn test_body_is_created_exactly_once() {
    let (mut scene, control) = scripted_scene(EngineConfig::default());
    let ball = spawn_ball(&mut scene, "ball", Vec3::new(0.0, 5.0, 0.0), 0.5, 1.0);

    assert_eq!(control.created(), 0, "nothing is created before the first update");
    assert!(!scene.objects().get::<PhysicsBody>(ball).unwrap().is_created());

    step(&mut scene, 1);
    assert_eq!(control.created(), 1);

    step(&mut scene, 25);
    assert_eq!(control.created(), 1);
    assert_eq!(scene.physics().body_count(), 1);
    assert_eq!(scene.objects().get::<PhysicsBody>(ball).unwrap().pid(), Some(0));
}

#[test]
fn test_ball_settles_on_static_ground() {
    let mut scene = Scene::default();
    let ground = spawn_ground(&mut scene, Vec3::ZERO, Vec3::new(10.0, 1.0, 10.0));
    let ball = spawn_ball(&mut scene, "ball", Vec3::new(0.0, 5.0, 0.0), 0.5, 1.0);

    step(&mut scene, 30);
    let falling_y = scene.objects().transform(ball).unwrap().position.y;
    assert!(falling_y < 5.0, "ball should fall, got y = {falling_y}");

    step(&mut scene, 270);
    let rest_y = scene.objects().transform(ball).unwrap().position.y;
    // Ground top is at 0.5, ball radius is 0.5
    assert!(
        (rest_y - 1.0).abs() < 0.1,
        "ball should rest on the ground, got y = {rest_y}"
    );

    step(&mut scene, 60);
    let later_y = scene.objects().transform(ball).unwrap().position.y;
    assert!((later_y - rest_y).abs() < 0.05, "ball should stay put");

    assert_eq!(scene.objects().transform(ground).unwrap().position, Vec3::ZERO);
}

#[test]
fn test_pass_throughs_need_a_simulated_body() {
    let mut scene = Scene::new(weightless());
    let ball = spawn_ball(&mut scene, "ball", Vec3::ZERO, 0.5, 2.0);

    let mut body = scene.body_mut(ball).unwrap();
    assert!(!body.is_simulated());
    assert_eq!(
        body.velocity(),
        Err(PhysicsError::NotSimulated { object: ball })
    );
    assert_eq!(
        body.add_impulse(Vec3::X),
        Err(PhysicsError::NotSimulated { object: ball })
    );

    step(&mut scene, 1);

    let mut body = scene.body_mut(ball).unwrap();
    body.set_velocity(Vec3::new(1.0, 0.0, 0.0)).unwrap();
    assert_eq!(body.velocity().unwrap(), Vec3::new(1.0, 0.0, 0.0));

    // Impulse divided by mass
    body.add_impulse(Vec3::new(0.0, 4.0, 0.0)).unwrap();
    let velocity = body.velocity().unwrap();
    assert!((velocity - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);

    body.set_linear_factor(Vec3::new(1.0, 0.0, 1.0)).unwrap();
    body.set_angular_factor(Vec3::ZERO).unwrap();
    body.set_damping(0.0, 0.0).unwrap();
    body.add_force(Vec3::ZERO).unwrap();
    body.set_angular(Vec3::ZERO).unwrap();

    assert_eq!(body.basis_column(0).unwrap(), Vec3::X);
    assert_eq!(body.basis_row(1).unwrap(), Vec3::Y);
    assert_eq!(
        body.basis_column(3),
        Err(PhysicsError::InvalidBasisIndex(3))
    );
}

#[test]
fn test_self_relation_mirrors_position_and_rotation() {
    let mut scene = Scene::new(weightless());
    let ball = spawn_ball(&mut scene, "ball", Vec3::ZERO, 0.5, 1.0);
    step(&mut scene, 1);

    {
        let mut body = scene.body_mut(ball).unwrap();
        body.set_velocity(Vec3::new(0.0, 0.0, 3.0)).unwrap();
        body.set_angular(Vec3::new(0.0, 1.0, 0.0)).unwrap();
    }
    step(&mut scene, 30);

    let transform = scene.objects().transform(ball).unwrap();
    assert!(transform.position.z > 1.0, "got {:?}", transform.position);
    assert!(
        transform.rotation.y.abs() > 1.0,
        "solver rotation should reach the object, got {:?}",
        transform.rotation
    );
}

#[test]
fn test_parent_relation_moves_the_parent() {
    let mut scene = Scene::default();
    let vehicle = scene.spawn_with_transform("vehicle", Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));
    let collider = scene.spawn_collider("hull", ColliderInitInfo::for_sphere(0.5), None);
    let body = scene
        .spawn_physics_body(
            "hull body",
            Transform::from_position(Vec3::new(0.0, 0.25, 0.0)),
            collider,
            1.0,
        )
        .unwrap();
    scene.objects_mut().set_parent(body, Some(vehicle));
    scene.physics_body_mut(body).unwrap().relation = TransformRelationship::Parent;

    step(&mut scene, 1);
    // Created at the parent's pose
    let pose = scene.body_mut(body).unwrap().pose().unwrap();
    assert!((pose.position.y - 10.0).abs() < 0.1);

    step(&mut scene, 30);
    assert!(scene.objects().transform(vehicle).unwrap().position.y < 10.0);
    // The body keeps its own local offset
    assert_eq!(
        scene.objects().transform(body).unwrap().position,
        Vec3::new(0.0, 0.25, 0.0)
    );
}

#[test]
fn test_root_body_ignores_parent_relation() {
    let mut scene = Scene::new(weightless());
    let ball = spawn_ball(&mut scene, "ball", Vec3::new(2.0, 0.0, 0.0), 0.5, 1.0);
    scene.physics_body_mut(ball).unwrap().relation = TransformRelationship::Parent;

    step(&mut scene, 1);
    let pose = scene.body_mut(ball).unwrap().pose().unwrap();
    assert_eq!(pose.position, Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_static_body_follows_engine_pose() {
    let mut scene = Scene::default();
    let ground = spawn_ground(&mut scene, Vec3::ZERO, Vec3::ONE);
    step(&mut scene, 1);

    scene.objects_mut().transform_mut(ground).unwrap().position = Vec3::new(0.0, 3.0, 0.0);
    step(&mut scene, 1);

    let handle = handle_of(&scene, ground);
    let pose = scene.physics().solver().body_pose(handle).unwrap();
    assert_eq!(pose.position, Vec3::new(0.0, 3.0, 0.0));
}

#[test]
fn test_world_marks_first_step() {
    let mut scene = Scene::default();
    assert!(!scene.physics().has_stepped());
    step(&mut scene, 1);
    assert!(scene.physics().has_stepped());
}
