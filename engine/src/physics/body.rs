//! Rigid-body operations on a scene object

use super::error::PhysicsError;
use super::solver::{BodyHandle, Pose};
use super::world::PhysicalWorld;
use crate::core::object::ObjectId;
use glam::{Mat3, Vec3};

/// Mutable access to the solver body of one `PhysicsBody` object.
///
/// Every operation fails with [`PhysicsError::NotSimulated`] until the body
/// has been created by its first update, and again after it was removed.
pub struct BodyMut<'a> {
    world: &'a mut PhysicalWorld,
    object: ObjectId,
    pid: Option<usize>,
}

impl<'a> BodyMut<'a> {
    pub(crate) fn new(world: &'a mut PhysicalWorld, object: ObjectId, pid: Option<usize>) -> Self {
        Self { world, object, pid }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn is_simulated(&self) -> bool {
        self.handle().is_ok()
    }

    fn handle(&self) -> Result<BodyHandle, PhysicsError> {
        self.pid
            .and_then(|pid| self.world.body_handle(pid))
            .ok_or(PhysicsError::NotSimulated {
                object: self.object,
            })
    }

    pub fn pose(&self) -> Result<Pose, PhysicsError> {
        let handle = self.handle()?;
        self.world
            .solver()
            .body_pose(handle)
            .ok_or(PhysicsError::NotSimulated {
                object: self.object,
            })
    }

    pub fn velocity(&self) -> Result<Vec3, PhysicsError> {
        let handle = self.handle()?;
        Ok(self.world.solver().linear_velocity(handle))
    }

    pub fn set_velocity(&mut self, velocity: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().set_linear_velocity(handle, velocity);
        Ok(())
    }

    pub fn set_angular(&mut self, velocity: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().set_angular_velocity(handle, velocity);
        Ok(())
    }

    pub fn add_impulse(&mut self, impulse: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().apply_central_impulse(handle, impulse);
        Ok(())
    }

    pub fn add_force(&mut self, force: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().apply_central_force(handle, force);
        Ok(())
    }

    pub fn set_linear_factor(&mut self, factor: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().set_linear_factor(handle, factor);
        Ok(())
    }

    pub fn set_angular_factor(&mut self, factor: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().set_angular_factor(handle, factor);
        Ok(())
    }

    pub fn set_damping(&mut self, linear: f32, angular: f32) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        self.world.solver_mut().set_damping(handle, linear, angular);
        Ok(())
    }

    /// Turn the body so its +Z axis points along `forward`
    pub fn set_forward(&mut self, forward: Vec3) -> Result<(), PhysicsError> {
        let handle = self.handle()?;
        let Some(direction) = forward.try_normalize() else {
            return Ok(());
        };
        let mut pose = self.pose()?;
        pose.rotation = glam::Quat::from_rotation_arc(Vec3::Z, direction);
        self.world.solver_mut().set_body_pose(handle, pose);
        Ok(())
    }

    /// Column `index` of the body's world rotation matrix (its local axis in world space)
    pub fn basis_column(&self, index: usize) -> Result<Vec3, PhysicsError> {
        if index > 2 {
            return Err(PhysicsError::InvalidBasisIndex(index));
        }
        let basis = Mat3::from_quat(self.pose()?.rotation);
        Ok(basis.col(index))
    }

    /// Row `index` of the body's world rotation matrix
    pub fn basis_row(&self, index: usize) -> Result<Vec3, PhysicsError> {
        if index > 2 {
            return Err(PhysicsError::InvalidBasisIndex(index));
        }
        let basis = Mat3::from_quat(self.pose()?.rotation);
        Ok(basis.row(index))
    }
}
