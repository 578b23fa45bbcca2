//! Shape queries backing [`SimpleSolver`](crate::physics::SimpleSolver):
//! bounding boxes, pair culling and per-pair contact generation

pub mod broad_phase;
pub mod narrow_phase;
pub mod shapes;

pub use shapes::CollisionShape;

use glam::Vec3;

/// Deepest contact between shape A and shape B
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// On A's surface
    pub point_on_a: Vec3,
    /// On B's surface
    pub point_on_b: Vec3,
    /// Unit normal from A towards B
    pub normal: Vec3,
    /// Overlap depth; slightly negative when only within the contact margin
    pub penetration: f32,
}

impl Contact {
    pub fn new(point_on_a: Vec3, point_on_b: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            point_on_a,
            point_on_b,
            normal,
            penetration,
        }
    }

    /// Same contact seen from B
    pub fn reversed(self) -> Self {
        Self::new(self.point_on_b, self.point_on_a, -self.normal, self.penetration)
    }

    pub fn midpoint(&self) -> Vec3 {
        self.point_on_a.lerp(self.point_on_b, 0.5)
    }
}

/// World- or shape-space axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of half size `half_extents` centered on `center`
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box holding every point; a degenerate box at the origin
    /// when there are none
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::around(Vec3::ZERO, Vec3::ZERO);
        };
        points.fold(Self::new(first, first), |aabb, point| {
            Self::new(aabb.min.min(point), aabb.max.max(point))
        })
    }

    /// Inclusive on every face, so touching boxes overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn inflated(&self, margin: f32) -> Aabb {
        Self::around(self.center(), self.half_extents() + Vec3::splat(margin))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners, in binary order over x, y, z
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::select(
                glam::BVec3::new(i & 1 != 0, i & 2 != 0, i & 4 != 0),
                self.max,
                self.min,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_boxes_overlap() {
        let unit = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let touching = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let apart = Aabb::around(Vec3::splat(5.0), Vec3::ONE);

        assert!(unit.overlaps(&touching));
        assert!(touching.overlaps(&unit));
        assert!(!unit.overlaps(&apart));
        assert!(unit.inflated(3.0).overlaps(&apart));
    }

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points([Vec3::ONE, -Vec3::ONE, Vec3::new(0.0, 3.0, 0.0)]);
        assert_eq!(aabb.min, -Vec3::ONE);
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 1.0));

        let empty = Aabb::from_points(std::iter::empty());
        assert_eq!(empty.half_extents(), Vec3::ZERO);
    }

    #[test]
    fn test_corners_span_the_box() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        let corners = aabb.corners();
        assert_eq!(corners[0], Vec3::ZERO);
        assert_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Aabb::from_points(corners), aabb);
    }

    #[test]
    fn test_reversed_contact_keeps_midpoint() {
        let contact = Contact::new(Vec3::X, Vec3::Y, Vec3::Z, 0.1);
        let reversed = contact.reversed();
        assert_eq!(reversed.point_on_a, Vec3::Y);
        assert_eq!(reversed.normal, -Vec3::Z);
        assert_eq!(reversed.midpoint(), contact.midpoint());
    }
}
