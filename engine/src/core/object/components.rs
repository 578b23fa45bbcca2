//! Components every object carries

use crate::math::{compose_transform, euler_to_quat};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable handle of an object in the scene
pub type ObjectId = hecs::Entity;

/// Local transform of an object
///
/// `rotation` holds Euler angles in degrees, applied X then Y then Z.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,
    /// Euler rotation in degrees relative to the parent
    pub rotation: Vec3,
    /// Scale relative to the parent
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the Euler rotation in degrees
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local rotation as a quaternion
    pub fn quat(&self) -> Quat {
        euler_to_quat(self.rotation)
    }

    /// Local `T * R * S` matrix
    pub fn to_matrix(&self) -> Mat4 {
        compose_transform(self.position, self.rotation, self.scale)
    }

    /// Local +Z axis
    pub fn forward(&self) -> Vec3 {
        self.quat() * Vec3::Z
    }

    /// Local +X axis
    pub fn right(&self) -> Vec3 {
        self.quat() * Vec3::X
    }

    /// Local +Y axis
    pub fn up(&self) -> Vec3 {
        self.quat() * Vec3::Y
    }

    /// Turn the transform towards `target` by setting pitch and yaw.
    ///
    /// Roll is left unchanged. Looking at the current position is a no-op.
    pub fn look_at(&mut self, target: Vec3) {
        let delta = target - self.position;
        if delta.length_squared() <= f32::EPSILON {
            return;
        }
        let direction = delta.normalize();
        let pitch = direction.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = direction.z.atan2(direction.x).to_degrees();
        self.rotation = Vec3::new(pitch, yaw, self.rotation.z);
    }
}

/// Name component for user-friendly object identification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Whether the object (and its subtree) takes part in the update traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

/// Parent and ordered children of an object.
///
/// Only [`Objects::set_parent`](super::Objects::set_parent) mutates this, which
/// keeps both directions of the link in agreement.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
}

impl Hierarchy {
    /// Parent of this object, if any
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}
