//! Collision shapes with scaling applied, plus bounds, inertia and ray tests

use super::Aabb;
use crate::physics::solver::{Pose, ShapeDesc};
use crate::render::MeshData;
use glam::Vec3;
use std::sync::Arc;

/// Collision shape as seen by the narrow phase (local scaling already applied)
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Sphere with radius
    Sphere { radius: f32 },
    /// Box with half-extents (width/2, height/2, depth/2)
    Box { half_extents: Vec3 },
    /// Capsule with radius and half-height of the inner segment (along Y)
    Capsule { radius: f32, half_height: f32 },
    /// Triangle mesh; vertices are multiplied by `scale`
    Mesh { mesh: Arc<MeshData>, scale: Vec3 },
}

impl CollisionShape {
    /// Build the shape for a description and a local scaling
    pub fn from_desc(desc: &ShapeDesc, scale: Vec3) -> Self {
        match desc {
            ShapeDesc::Sphere { radius } => CollisionShape::Sphere {
                radius: radius * scale.max_element(),
            },
            ShapeDesc::Box { half_extents } => CollisionShape::Box {
                half_extents: *half_extents * scale,
            },
            ShapeDesc::Capsule {
                radius,
                half_height,
            } => CollisionShape::Capsule {
                radius: radius * scale.x.max(scale.z),
                half_height: half_height * scale.y,
            },
            ShapeDesc::Mesh { mesh } => CollisionShape::Mesh {
                mesh: Arc::clone(mesh),
                scale,
            },
        }
    }

    /// Bounds in shape space
    pub fn local_aabb(&self) -> Aabb {
        match self {
            CollisionShape::Sphere { radius } => {
                Aabb::around(Vec3::ZERO, Vec3::splat(*radius))
            }
            CollisionShape::Box { half_extents } => {
                Aabb::around(Vec3::ZERO, *half_extents)
            }
            CollisionShape::Capsule {
                radius,
                half_height,
            } => Aabb::around(
                Vec3::ZERO,
                Vec3::new(*radius, half_height + radius, *radius),
            ),
            CollisionShape::Mesh { mesh, scale } => {
                Aabb::from_points(mesh.vertices.iter().map(|v| *v * *scale))
            }
        }
    }

    /// World bounds at `pose`
    pub fn world_aabb(&self, pose: &Pose) -> Aabb {
        match self {
            CollisionShape::Sphere { radius } => {
                Aabb::around(pose.position, Vec3::splat(*radius))
            }
            CollisionShape::Capsule {
                radius,
                half_height,
            } => {
                let (top, bottom) = self.capsule_segment(pose, *half_height);
                let top_aabb = Aabb::around(top, Vec3::splat(*radius));
                let bottom_aabb = Aabb::around(bottom, Vec3::splat(*radius));
                top_aabb.union(&bottom_aabb)
            }
            CollisionShape::Box { .. } | CollisionShape::Mesh { .. } => {
                let corners = self.local_aabb().corners();
                Aabb::from_points(corners.map(|corner| pose.transform_point(corner)))
            }
        }
    }

    /// World-space end points of a capsule's inner segment
    pub fn capsule_segment(&self, pose: &Pose, half_height: f32) -> (Vec3, Vec3) {
        (
            pose.transform_point(Vec3::new(0.0, half_height, 0.0)),
            pose.transform_point(Vec3::new(0.0, -half_height, 0.0)),
        )
    }

    /// Diagonal of the inertia tensor for this shape with the given mass
    pub fn local_inertia(&self, mass: f32) -> Vec3 {
        match self {
            CollisionShape::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            CollisionShape::Box { half_extents } => box_inertia(*half_extents, mass),
            CollisionShape::Capsule {
                radius,
                half_height,
            } => {
                // Approximate as cylinder plus two end caps
                let height = half_height * 2.0;
                let cylinder_mass = mass * 0.8;
                let sphere_mass = mass * 0.2;

                let cylinder_x = cylinder_mass * (3.0 * radius * radius + height * height) / 12.0;
                let cylinder_y = cylinder_mass * radius * radius / 2.0;

                let sphere_inertia = 0.4 * sphere_mass * radius * radius;
                let sphere_offset = half_height + radius * 0.5;
                let sphere_x = sphere_inertia + sphere_mass * sphere_offset * sphere_offset;

                Vec3::new(
                    cylinder_x + 2.0 * sphere_x,
                    cylinder_y + 2.0 * sphere_inertia,
                    cylinder_x + 2.0 * sphere_x,
                )
            }
            CollisionShape::Mesh { .. } => box_inertia(self.local_aabb().half_extents(), mass),
        }
    }

    /// Cast a ray given in the shape's local space.
    ///
    /// `direction` must be normalized. Returns the distance along the ray and
    /// the local surface normal of the first hit within `max_distance`.
    pub fn raycast_local(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        match self {
            CollisionShape::Sphere { radius } => {
                let t = ray_sphere(origin, direction, Vec3::ZERO, *radius)?;
                (t <= max_distance).then(|| (t, (origin + direction * t).normalize_or(Vec3::Y)))
            }
            CollisionShape::Box { half_extents } => ray_box(origin, direction, *half_extents, max_distance),
            CollisionShape::Capsule {
                radius,
                half_height,
            } => ray_capsule(origin, direction, *radius, *half_height, max_distance),
            CollisionShape::Mesh { mesh, scale } => {
                let mut best: Option<(f32, Vec3)> = None;
                for (_, [a, b, c]) in mesh.triangles() {
                    let (a, b, c) = (a * *scale, b * *scale, c * *scale);
                    if let Some(t) = ray_triangle(origin, direction, a, b, c) {
                        if t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
                            let mut normal = (b - a).cross(c - a).normalize_or(Vec3::Y);
                            if normal.dot(direction) > 0.0 {
                                normal = -normal;
                            }
                            best = Some((t, normal));
                        }
                    }
                }
                best
            }
        }
    }
}

fn box_inertia(half_extents: Vec3, mass: f32) -> Vec3 {
    let x = half_extents.x * 2.0;
    let y = half_extents.y * 2.0;
    let z = half_extents.z * 2.0;
    let factor = mass / 12.0;
    Vec3::new(
        factor * (y * y + z * z),
        factor * (x * x + z * z),
        factor * (x * x + y * y),
    )
}

/// Smallest non-negative hit distance of a ray against a sphere
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t1 = -b - sqrt_d;
    let t2 = -b + sqrt_d;
    if t1 >= 0.0 {
        Some(t1)
    } else if t2 >= 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Ray-box intersection using the slab method
fn ray_box(origin: Vec3, direction: Vec3, half_extents: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
    let mut t_enter = 0.0f32;
    let mut t_exit = max_distance;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];
        if d.abs() < 1e-8 {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (-h - o) * inv;
        let mut t2 = (h - o) * inv;
        let mut face = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            face = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if normal == Vec3::ZERO {
        // Origin inside the box
        normal = -direction;
    }
    Some((t_enter, normal))
}

/// Ray against a Y-aligned capsule: the side cylinder plus both end spheres
fn ray_capsule(
    origin: Vec3,
    direction: Vec3,
    radius: f32,
    half_height: f32,
    max_distance: f32,
) -> Option<(f32, Vec3)> {
    let mut best: Option<(f32, Vec3)> = None;
    let mut consider = |t: f32, normal: Vec3| {
        if t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, normal));
        }
    };

    // Side cylinder
    let a = direction.x * direction.x + direction.z * direction.z;
    if a > 1e-8 {
        let b = origin.x * direction.x + origin.z * direction.z;
        let c = origin.x * origin.x + origin.z * origin.z - radius * radius;
        let discriminant = b * b - a * c;
        if discriminant >= 0.0 {
            let t = (-b - discriminant.sqrt()) / a;
            if t >= 0.0 {
                let p = origin + direction * t;
                if p.y.abs() <= half_height {
                    consider(t, Vec3::new(p.x, 0.0, p.z).normalize_or(Vec3::X));
                }
            }
        }
    }

    for cap in [half_height, -half_height] {
        let center = Vec3::new(0.0, cap, 0.0);
        if let Some(t) = ray_sphere(origin, direction, center, radius) {
            let p = origin + direction * t;
            consider(t, (p - center).normalize_or(Vec3::Y));
        }
    }

    best
}

/// Möller-Trumbore ray/triangle test, double-sided
fn ray_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_scaling_from_desc() {
        let sphere = CollisionShape::from_desc(&ShapeDesc::Sphere { radius: 1.0 }, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(sphere, CollisionShape::Sphere { radius: 3.0 });

        let capsule = CollisionShape::from_desc(
            &ShapeDesc::Capsule {
                radius: 0.5,
                half_height: 1.0,
            },
            Vec3::new(2.0, 3.0, 1.0),
        );
        assert_eq!(
            capsule,
            CollisionShape::Capsule {
                radius: 1.0,
                half_height: 3.0
            }
        );
    }

    #[test]
    fn test_rotated_box_aabb() {
        let shape = CollisionShape::Box {
            half_extents: Vec3::new(2.0, 1.0, 1.0),
        };
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let aabb = shape.world_aabb(&pose);
        assert!((aabb.half_extents() - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_mesh_aabb_uses_scale() {
        let shape = CollisionShape::Mesh {
            mesh: Arc::new(MeshData::quad(2.0)),
            scale: Vec3::splat(3.0),
        };
        let aabb = shape.local_aabb();
        assert_eq!(aabb.max, Vec3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_box_inertia() {
        let shape = CollisionShape::Box {
            half_extents: Vec3::splat(0.5),
        };
        let inertia = shape.local_inertia(12.0);
        assert!((inertia - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_raycast() {
        let shape = CollisionShape::Sphere { radius: 1.0 };
        let (t, normal) = shape
            .raycast_local(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 100.0)
            .unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!((normal + Vec3::X).length() < 1e-5);
        assert!(shape.raycast_local(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 3.0).is_none());
    }

    #[test]
    fn test_box_raycast_normal() {
        let shape = CollisionShape::Box {
            half_extents: Vec3::ONE,
        };
        let (t, normal) = shape
            .raycast_local(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 100.0)
            .unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert_eq!(normal, Vec3::Y);
    }

    #[test]
    fn test_capsule_raycast_side_and_cap() {
        let shape = CollisionShape::Capsule {
            radius: 0.5,
            half_height: 1.0,
        };
        let (t, normal) = shape
            .raycast_local(Vec3::new(-5.0, 0.5, 0.0), Vec3::X, 100.0)
            .unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        assert!((normal + Vec3::X).length() < 1e-5);

        let (t, normal) = shape
            .raycast_local(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 100.0)
            .unwrap();
        assert!((t - 3.5).abs() < 1e-5);
        assert!((normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_mesh_raycast() {
        let shape = CollisionShape::Mesh {
            mesh: Arc::new(MeshData::quad(4.0)),
            scale: Vec3::ONE,
        };
        let (t, normal) = shape
            .raycast_local(Vec3::new(0.5, 2.0, 0.5), -Vec3::Y, 100.0)
            .unwrap();
        assert!((t - 2.0).abs() < 1e-5);
        assert!((normal - Vec3::Y).length() < 1e-5);
    }
}
