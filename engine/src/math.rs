//! Math helpers shared by the object model, physics and particles
//!
//! Rotations are stored as Euler angles in degrees and applied in X, Y, Z
//! order (`Rx * Ry * Rz`). Everything that converts between the stored form
//! and quaternions goes through this module so the convention lives in one
//! place.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Convert Euler angles in degrees to a quaternion
pub fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Convert a quaternion back to Euler angles in degrees
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.normalize().to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Build `T * R * S` from a position, Euler rotation in degrees and scale
pub fn compose_transform(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_to_quat(rotation), position)
}

/// Barycentric point-in-triangle test.
///
/// The point is implicitly projected onto the triangle's plane, so a point
/// slightly above or below the surface still counts as inside.
pub fn point_in_triangle(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = point - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= f32::EPSILON {
        // Degenerate triangle
        return false;
    }

    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;

    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

/// Closest point to `point` on the triangle `abc`
pub fn closest_point_on_triangle(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = point - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = point - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Closest point to `point` on the segment `a..b`
pub fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `p1..q1` and `p2..q2`
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if a <= f32::EPSILON && e <= f32::EPSILON {
        return (p1, p2);
    }

    let (s, t) = if a <= f32::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= f32::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > f32::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_roundtrip() {
        let degrees = Vec3::new(10.0, 20.0, 30.0);
        let back = quat_to_euler(euler_to_quat(degrees));
        assert!((back - degrees).length() < 1e-3, "got {back:?}");
    }

    #[test]
    fn test_euler_order_is_x_then_y_then_z() {
        let degrees = Vec3::new(90.0, 0.0, 90.0);
        let expected = Quat::from_rotation_x(90f32.to_radians())
            * Quat::from_rotation_z(90f32.to_radians());
        let q = euler_to_quat(degrees);
        assert!(q.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn test_compose_transform_order() {
        let m = compose_transform(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 90.0, 0.0),
            Vec3::splat(2.0),
        );
        // Scale first, then rotate +X onto -Z, then translate
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5, "got {p:?}");
    }

    #[test]
    fn test_point_in_triangle() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        let c = Vec3::Z;
        assert!(point_in_triangle(Vec3::new(0.25, 0.0, 0.25), a, b, c));
        assert!(point_in_triangle(Vec3::new(0.25, 0.3, 0.25), a, b, c));
        assert!(!point_in_triangle(Vec3::new(1.0, 0.0, 1.0), a, b, c));
        assert!(!point_in_triangle(Vec3::new(-0.1, 0.0, 0.2), a, b, c));
    }

    #[test]
    fn test_closest_point_on_triangle() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        let c = Vec3::Z;
        let inside = closest_point_on_triangle(Vec3::new(0.2, 1.0, 0.2), a, b, c);
        assert!((inside - Vec3::new(0.2, 0.0, 0.2)).length() < 1e-6);
        let corner = closest_point_on_triangle(Vec3::new(-1.0, 0.0, -1.0), a, b, c);
        assert!((corner - a).length() < 1e-6);
    }

    #[test]
    fn test_closest_points_between_parallel_segments() {
        let (p, q) = closest_points_between_segments(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        );
        assert!(((q - p).length() - 2.0).abs() < 1e-6);
    }
}
