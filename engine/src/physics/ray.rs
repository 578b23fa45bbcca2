//! One-shot ray casts against the physical world

use super::world::PhysicalWorld;
use crate::core::object::ObjectId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default reach of a ray
pub const DEFAULT_RAY_DISTANCE: f32 = 10_000.0;

/// A ray query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
    /// Collision groups the ray can hit
    pub mask: u32,
}

/// Closest hit of a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Physics body that was hit; `None` for particles and untagged shapes
    pub hit: Option<ObjectId>,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            max_distance: DEFAULT_RAY_DISTANCE,
            mask: u32::MAX,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Cast the ray; a zero direction never hits
    pub fn cast(&self, world: &PhysicalWorld) -> Option<RaycastHit> {
        let direction = self.direction.try_normalize()?;
        let hit = world
            .solver()
            .cast_ray(self.origin, direction, self.max_distance, self.mask)?;
        let owner = world.body_owner(hit.body);
        trace!(point = ?hit.point, ?owner, "Ray hit");
        Some(RaycastHit {
            point: hit.point,
            normal: hit.normal,
            distance: hit.distance,
            hit: owner,
        })
    }
}
