//! Narrow phase collision detection for generating contact points
//!
//! Every test returns a [`Contact`] whose normal points from A to B. Shapes
//! closer than `margin` without touching still produce a contact (with a
//! negative penetration) so resting bodies keep a stable manifold.

use super::{shapes::CollisionShape, Contact};
use crate::math::{closest_point_on_segment, closest_point_on_triangle, closest_points_between_segments};
use crate::physics::solver::Pose;
use glam::{Quat, Vec3};

/// Test for collision between two shapes and generate contact information
pub fn test_collision(
    shape_a: &CollisionShape,
    pose_a: &Pose,
    shape_b: &CollisionShape,
    pose_b: &Pose,
    margin: f32,
) -> Option<Contact> {
    use CollisionShape::*;

    match (shape_a, shape_b) {
        (Sphere { radius: ra }, Sphere { radius: rb }) => {
            sphere_sphere_collision(pose_a.position, *ra, pose_b.position, *rb, margin)
        }
        (Sphere { radius }, Box { half_extents }) => {
            sphere_box_collision(pose_a.position, *radius, pose_b, *half_extents, margin)
        }
        (Box { half_extents }, Sphere { radius }) => {
            sphere_box_collision(pose_b.position, *radius, pose_a, *half_extents, margin)
                .map(Contact::reversed)
        }
        (Box { half_extents: ea }, Box { half_extents: eb }) => {
            box_box_collision(pose_a, *ea, pose_b, *eb, margin)
        }
        (Capsule { radius, half_height }, _) => {
            capsule_collision(shape_a, *radius, *half_height, pose_a, shape_b, pose_b, margin)
        }
        (_, Capsule { radius, half_height }) => {
            capsule_collision(shape_b, *radius, *half_height, pose_b, shape_a, pose_a, margin)
                .map(Contact::reversed)
        }
        (Mesh { .. }, Sphere { radius }) => {
            mesh_sphere_collision(shape_a, pose_a, pose_b.position, *radius, margin)
        }
        (Sphere { radius }, Mesh { .. }) => {
            mesh_sphere_collision(shape_b, pose_b, pose_a.position, *radius, margin)
                .map(Contact::reversed)
        }
        (Mesh { .. }, Box { half_extents }) => {
            let (bounds_pose, bounds) = mesh_bounds(shape_a, pose_a);
            box_box_collision(&bounds_pose, bounds, pose_b, *half_extents, margin)
        }
        (Box { half_extents }, Mesh { .. }) => {
            let (bounds_pose, bounds) = mesh_bounds(shape_b, pose_b);
            box_box_collision(pose_a, *half_extents, &bounds_pose, bounds, margin)
        }
        // Two static meshes never need contacts
        (Mesh { .. }, Mesh { .. }) => None,
    }
}

/// Test collision between two spheres
fn sphere_sphere_collision(
    pos_a: Vec3,
    radius_a: f32,
    pos_b: Vec3,
    radius_b: f32,
    margin: f32,
) -> Option<Contact> {
    let delta = pos_b - pos_a;
    let distance_sq = delta.length_squared();
    let reach = radius_a + radius_b + margin;

    if distance_sq > reach * reach {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > 0.0 {
        delta / distance
    } else {
        // Spheres are at the same position, use arbitrary normal
        Vec3::Y
    };

    Some(Contact::new(
        pos_a + normal * radius_a,
        pos_b - normal * radius_b,
        normal,
        radius_a + radius_b - distance,
    ))
}

/// Test collision between a sphere (A) and a box (B)
fn sphere_box_collision(
    sphere_pos: Vec3,
    sphere_radius: f32,
    box_pose: &Pose,
    box_half_extents: Vec3,
    margin: f32,
) -> Option<Contact> {
    // Transform sphere to box's local space
    let local_sphere_pos = box_pose.inverse_transform_point(sphere_pos);
    let closest = local_sphere_pos.clamp(-box_half_extents, box_half_extents);

    let delta = local_sphere_pos - closest;
    let distance_sq = delta.length_squared();
    let reach = sphere_radius + margin;

    if distance_sq > reach * reach {
        return None;
    }

    let distance = distance_sq.sqrt();
    // Local normal points from the box surface towards the sphere center
    let (local_normal, surface, penetration) = if distance > 1e-6 {
        (delta / distance, closest, sphere_radius - distance)
    } else {
        // Sphere center is inside the box, push out through the closest face
        let faces = [
            (box_half_extents.x - local_sphere_pos.x.abs(), Vec3::X * sign(local_sphere_pos.x)),
            (box_half_extents.y - local_sphere_pos.y.abs(), Vec3::Y * sign(local_sphere_pos.y)),
            (box_half_extents.z - local_sphere_pos.z.abs(), Vec3::Z * sign(local_sphere_pos.z)),
        ];
        let (depth, normal) = faces
            .iter()
            .copied()
            .fold((f32::MAX, Vec3::Y), |best, face| if face.0 < best.0 { face } else { best });
        let surface = local_sphere_pos + normal * depth;
        (normal, surface, sphere_radius + depth)
    };

    let box_to_sphere = box_pose.rotation * local_normal;
    Some(Contact::new(
        sphere_pos - box_to_sphere * sphere_radius,
        box_pose.transform_point(surface),
        -box_to_sphere,
        penetration,
    ))
}

/// Test collision between two boxes using SAT (Separating Axis Theorem)
fn box_box_collision(
    pose_a: &Pose,
    extents_a: Vec3,
    pose_b: &Pose,
    extents_b: Vec3,
    margin: f32,
) -> Option<Contact> {
    let axes_a = box_axes(pose_a.rotation);
    let axes_b = box_axes(pose_b.rotation);
    let center_delta = pose_b.position - pose_a.position;

    let mut min_penetration = f32::MAX;
    let mut best_axis = Vec3::Y;

    let mut candidates: Vec<Vec3> = Vec::with_capacity(15);
    candidates.extend_from_slice(&axes_a);
    candidates.extend_from_slice(&axes_b);
    for a in &axes_a {
        for b in &axes_b {
            let axis = a.cross(*b);
            // Parallel edges
            if axis.length_squared() >= 1e-6 {
                candidates.push(axis.normalize());
            }
        }
    }

    for axis in candidates {
        let (penetration, flip) =
            test_separation_axis(axis, center_delta, extents_a, extents_b, &axes_a, &axes_b, margin)?;
        // Prefer face axes on ties; they come first
        if penetration < min_penetration - 1e-5 {
            min_penetration = penetration;
            best_axis = if flip { -axis } else { axis };
        }
    }

    let support_a = box_support_point(pose_a.position, &axes_a, extents_a, best_axis);
    let support_b = box_support_point(pose_b.position, &axes_b, extents_b, -best_axis);

    Some(Contact::new(support_a, support_b, best_axis, min_penetration))
}

/// Test a separation axis for the SAT algorithm
fn test_separation_axis(
    axis: Vec3,
    center_delta: Vec3,
    extents_a: Vec3,
    extents_b: Vec3,
    axes_a: &[Vec3; 3],
    axes_b: &[Vec3; 3],
    margin: f32,
) -> Option<(f32, bool)> {
    let separation = center_delta.dot(axis);

    let radius_a = extents_a.x * axes_a[0].dot(axis).abs()
        + extents_a.y * axes_a[1].dot(axis).abs()
        + extents_a.z * axes_a[2].dot(axis).abs();

    let radius_b = extents_b.x * axes_b[0].dot(axis).abs()
        + extents_b.y * axes_b[1].dot(axis).abs()
        + extents_b.z * axes_b[2].dot(axis).abs();

    let penetration = radius_a + radius_b - separation.abs();

    if penetration < -margin {
        None // Separated along this axis
    } else {
        Some((penetration, separation < 0.0))
    }
}

/// Support point of a box in a direction.
///
/// Axes nearly perpendicular to the direction contribute nothing, so a face
/// contact reports the face center instead of an arbitrary corner.
fn box_support_point(center: Vec3, axes: &[Vec3; 3], extents: Vec3, direction: Vec3) -> Vec3 {
    let mut support = center;
    for (axis, extent) in axes.iter().zip([extents.x, extents.y, extents.z]) {
        let d = axis.dot(direction);
        if d > 1e-4 {
            support += *axis * extent;
        } else if d < -1e-4 {
            support -= *axis * extent;
        }
    }
    support
}

fn box_axes(rotation: Quat) -> [Vec3; 3] {
    [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z]
}

/// Capsule (A) against any other shape (B), reduced to sphere tests along the segment
fn capsule_collision(
    capsule: &CollisionShape,
    radius: f32,
    half_height: f32,
    pose: &Pose,
    other: &CollisionShape,
    other_pose: &Pose,
    margin: f32,
) -> Option<Contact> {
    let (top, bottom) = capsule.capsule_segment(pose, half_height);

    match other {
        CollisionShape::Sphere { radius: other_radius } => {
            let center = closest_point_on_segment(other_pose.position, top, bottom);
            sphere_sphere_collision(center, radius, other_pose.position, *other_radius, margin)
        }
        CollisionShape::Capsule {
            radius: other_radius,
            half_height: other_half,
        } => {
            let (other_top, other_bottom) = other.capsule_segment(other_pose, *other_half);
            let (p, q) = closest_points_between_segments(top, bottom, other_top, other_bottom);
            sphere_sphere_collision(p, radius, q, *other_radius, margin)
        }
        CollisionShape::Box { half_extents } => {
            let toward_box = closest_point_on_segment(other_pose.position, top, bottom);
            deepest(
                [top, bottom, (top + bottom) * 0.5, toward_box]
                    .into_iter()
                    .filter_map(|c| sphere_box_collision(c, radius, other_pose, *half_extents, margin)),
            )
        }
        CollisionShape::Mesh { .. } => deepest(
            [top, bottom, (top + bottom) * 0.5]
                .into_iter()
                .filter_map(|c| mesh_sphere_collision(other, other_pose, c, radius, margin))
                .map(Contact::reversed),
        ),
    }
}

/// Triangle mesh (A) against a sphere (B); reports the deepest triangle contact
fn mesh_sphere_collision(
    mesh_shape: &CollisionShape,
    mesh_pose: &Pose,
    sphere_pos: Vec3,
    radius: f32,
    margin: f32,
) -> Option<Contact> {
    let CollisionShape::Mesh { mesh, scale } = mesh_shape else {
        return None;
    };

    let local_center = mesh_pose.inverse_transform_point(sphere_pos);
    let reach = radius + margin;
    let mut best: Option<Contact> = None;

    for (_, [a, b, c]) in mesh.triangles() {
        let (a, b, c) = (a * *scale, b * *scale, c * *scale);
        let closest = closest_point_on_triangle(local_center, a, b, c);
        let delta = local_center - closest;
        let distance = delta.length();
        if distance > reach {
            continue;
        }

        let local_normal = if distance > 1e-6 {
            delta / distance
        } else {
            (b - a).cross(c - a).normalize_or(Vec3::Y)
        };
        let penetration = radius - distance;
        if best.is_some_and(|current| current.penetration >= penetration) {
            continue;
        }

        let normal = mesh_pose.rotation * local_normal;
        best = Some(Contact::new(
            mesh_pose.transform_point(closest),
            sphere_pos - normal * radius,
            normal,
            penetration,
        ));
    }

    best
}

/// World pose and half extents of a mesh's local bounds, treated as a box
fn mesh_bounds(mesh_shape: &CollisionShape, pose: &Pose) -> (Pose, Vec3) {
    let local = mesh_shape.local_aabb();
    (
        Pose::new(pose.transform_point(local.center()), pose.rotation),
        local.half_extents(),
    )
}

fn deepest(contacts: impl Iterator<Item = Contact>) -> Option<Contact> {
    contacts.fold(None, |best: Option<Contact>, c| match best {
        Some(b) if b.penetration >= c.penetration => Some(b),
        _ => Some(c),
    })
}

fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}
