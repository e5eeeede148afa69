//! Physics configuration

use crate::error::{PhysicsError, Result};
use crate::island::IslandPolicy;
use serde::{Deserialize, Serialize};

/// How the engine treats the pairs the broad phase reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionMode {
    /// Record pairs and veto every collision response
    #[default]
    PairDiscovery,
    /// Record pairs and let the solver resolve contacts
    Resolve,
}

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: none)
    pub gravity: [f32; 3],

    /// Base timestep used to pick the substep count
    pub timestep: f32,

    /// Solver iterations for velocity
    pub velocity_iterations: usize,

    /// Whether the solver may resolve collected pairs
    pub collision_mode: CollisionMode,

    /// Pairs reserved up front in the pair cache
    pub pair_cache_capacity: usize,

    /// Contacts reserved up front in the contact cache
    pub contact_cache_capacity: usize,

    /// Linear damping applied to every new body
    pub linear_damping: f32,

    /// Angular damping applied to every new body
    pub angular_damping: f32,

    /// Linear velocity threshold for sleeping
    pub sleep_linear_threshold: f32,

    /// Angular velocity threshold for sleeping
    pub sleep_angular_threshold: f32,

    /// Friction coefficient for every new collider
    pub friction: f32,

    /// Inverse masses at or below this are treated as immovable
    pub mass_epsilon: f64,

    /// Inertia magnitudes outside this range are reported
    pub inertia_warning_range: [f64; 2],

    /// Thickness of static planes
    pub plane_thickness: f64,

    /// Whether isolated objects become singleton islands
    pub island_policy: IslandPolicy,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, 0.0],
            timestep: 1.0 / 60.0,
            velocity_iterations: 4,
            collision_mode: CollisionMode::PairDiscovery,
            pair_cache_capacity: 1024,
            contact_cache_capacity: 1024,
            linear_damping: 0.02,
            angular_damping: 0.02,
            sleep_linear_threshold: 0.1,
            sleep_angular_threshold: 0.1,
            friction: 1.0,
            mass_epsilon: 1e-4,
            inertia_warning_range: [1e-5, 20.0],
            plane_thickness: 0.01,
            island_policy: IslandPolicy::PairsOnly,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration where the solver resolves contacts
    pub fn resolving() -> Self {
        Self {
            collision_mode: CollisionMode::Resolve,
            ..Default::default()
        }
    }

    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            velocity_iterations: 8,
            timestep: 1.0 / 240.0,
            ..Default::default()
        }
    }

    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PhysicsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PhysicsError::InvalidConfig(e.to_string()))
    }

    /// Reject values the stepper cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "velocity_iterations must be at least 1".into(),
            ));
        }
        if !(self.mass_epsilon.is_finite() && self.mass_epsilon >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "mass_epsilon must be non-negative, got {}",
                self.mass_epsilon
            )));
        }
        let [low, high] = self.inertia_warning_range;
        if !(low.is_finite() && high.is_finite() && low <= high) {
            return Err(PhysicsError::InvalidConfig(format!(
                "inertia_warning_range [{low}, {high}] is not a range"
            )));
        }
        if !(self.plane_thickness.is_finite() && self.plane_thickness >= 0.0) {
            return Err(PhysicsError::InvalidConfig("plane_thickness must be non-negative".into()));
        }
        Ok(())
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.gravity = [x, y, z];
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set collision mode
    pub fn with_collision_mode(mut self, mode: CollisionMode) -> Self {
        self.collision_mode = mode;
        self
    }

    /// Set island policy
    pub fn with_island_policy(mut self, policy: IslandPolicy) -> Self {
        self.island_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gravity, [0.0, 0.0, 0.0]);
        assert_eq!(config.collision_mode, CollisionMode::PairDiscovery);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PhysicsConfig::from_json(r#"{ "collision_mode": "Resolve", "timestep": 0.01 }"#)
            .unwrap();
        assert_eq!(config.collision_mode, CollisionMode::Resolve);
        assert_eq!(config.timestep, 0.01);
        assert_eq!(config.friction, 1.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PhysicsConfig::resolving().with_gravity(0.0, -9.81, 0.0);
        let json = config.to_json().unwrap();
        let back = PhysicsConfig::from_json(&json).unwrap();
        assert_eq!(back.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(back.collision_mode, CollisionMode::Resolve);
    }

    #[test]
    fn test_rejects_bad_timestep() {
        let err = PhysicsConfig::from_json(r#"{ "timestep": 0.0 }"#).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidConfig(_)));
        assert!(PhysicsConfig::default().with_timestep(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_rejects_garbage_json() {
        assert!(PhysicsConfig::from_json("not json").is_err());
    }
}
