//! Physics command queue
//!
//! Collision callbacks run while the world is walking contact manifolds, so
//! they cannot touch solver bodies directly. They queue commands instead,
//! and the world applies them once dispatch has finished.

use crate::core::object::ObjectId;
use glam::Vec3;

/// Physics command to be executed after collision dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsCommand {
    /// Apply an impulse through the body's center of mass
    ApplyImpulse { object: ObjectId, impulse: Vec3 },

    /// Apply a force through the body's center of mass for the next step
    ApplyForce { object: ObjectId, force: Vec3 },

    /// Set the linear velocity of a body
    SetVelocity { object: ObjectId, velocity: Vec3 },

    /// Set the angular velocity of a body
    SetAngular { object: ObjectId, velocity: Vec3 },

    /// Remove the body and its shape from the world
    RemoveBody { object: ObjectId },

    /// Destroy the object and its subtree, releasing their solver resources
    Destroy { object: ObjectId },
}

impl PhysicsCommand {
    /// Object the command targets
    pub fn object(&self) -> ObjectId {
        match self {
            Self::ApplyImpulse { object, .. }
            | Self::ApplyForce { object, .. }
            | Self::SetVelocity { object, .. }
            | Self::SetAngular { object, .. }
            | Self::RemoveBody { object }
            | Self::Destroy { object } => *object,
        }
    }
}

/// Ordered queue of pending physics commands
#[derive(Debug, Default)]
pub struct PhysicsCommands {
    queue: Vec<PhysicsCommand>,
}

impl PhysicsCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: PhysicsCommand) {
        self.queue.push(command);
    }

    pub fn apply_impulse(&mut self, object: ObjectId, impulse: Vec3) {
        self.push(PhysicsCommand::ApplyImpulse { object, impulse });
    }

    pub fn apply_force(&mut self, object: ObjectId, force: Vec3) {
        self.push(PhysicsCommand::ApplyForce { object, force });
    }

    pub fn set_velocity(&mut self, object: ObjectId, velocity: Vec3) {
        self.push(PhysicsCommand::SetVelocity { object, velocity });
    }

    pub fn set_angular(&mut self, object: ObjectId, velocity: Vec3) {
        self.push(PhysicsCommand::SetAngular { object, velocity });
    }

    pub fn remove_body(&mut self, object: ObjectId) {
        self.push(PhysicsCommand::RemoveBody { object });
    }

    pub fn destroy(&mut self, object: ObjectId) {
        self.push(PhysicsCommand::Destroy { object });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued command, in submission order
    pub fn drain(&mut self) -> Vec<PhysicsCommand> {
        std::mem::take(&mut self.queue)
    }
}
