//! Configuration types for the engine

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables of the physics world and its default solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration
    pub gravity: Vec3,
    /// Length of the single sub-step advanced per physics update
    pub fixed_timestep: f32,
    /// Coefficient of restitution used by the contact resolver
    pub restitution: f32,
    /// Below this approach speed a contact is treated as resting (no bounce)
    pub rest_velocity_threshold: f32,
    /// Speed under which a body that allows deactivation counts as idle
    pub sleep_threshold: f32,
    /// Consecutive idle steps before such a body is put to sleep
    pub sleep_delay_steps: u32,
    /// Linear speed clamp, to limit tunneling
    pub max_linear_velocity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: 1.0 / 60.0,
            restitution: 0.3,
            rest_velocity_threshold: 0.1,
            sleep_threshold: 0.05,
            sleep_delay_steps: 60,
            max_linear_velocity: 100.0,
        }
    }
}

/// Defaults shared by every particle emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleDefaults {
    /// Base seed of the emitter RNG; each emitter mixes in its own id
    pub seed: u64,
}

impl Default for ParticleDefaults {
    fn default() -> Self {
        Self { seed: 0x5EED }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub particles: ParticleDefaults,
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = ?path, "Loading engine config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;

        if !physics.fixed_timestep.is_finite() || physics.fixed_timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                physics.fixed_timestep
            )));
        }

        if !physics.gravity.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite".to_string()));
        }

        let thresholds = [
            ("restitution", physics.restitution),
            ("rest_velocity_threshold", physics.rest_velocity_threshold),
            ("sleep_threshold", physics.sleep_threshold),
            ("max_linear_velocity", physics.max_linear_velocity),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}
