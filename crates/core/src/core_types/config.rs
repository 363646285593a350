//! Particle field configuration and presets
//!
//! [`FieldConfig`] carries everything needed to build a
//! [`ParticleField`](crate::ParticleField). The two presets cover the usual scene effects:
//! a snow field filling a room and a nether ember field drifting out of a portal.
//!
//! Configurations deserialize with defaults for any missing key, so a JSON document only
//! needs to name what differs from the snow preset:
//!
//! ```
//! use particle_field_core::{FieldConfig, VelocityPolicy};
//!
//! let config: FieldConfig = serde_json::from_str(
//!     r#"{ "count": 50, "policy": { "kind": "drifting", "forward_speed": 0.3 } }"#,
//! ).unwrap();
//! assert_eq!(config.count, 50);
//! assert_eq!(config.policy, VelocityPolicy::drifting(0.3));
//! assert_eq!(config.spread, [10.0, 10.0, 10.0]);
//! ```

use crate::core_types::bounds::FieldBounds;
use crate::core_types::policy::{VelocityPolicy, FALL_GRAVITY, NETHER_FORWARD_SPEED};
use crate::core_types::vec3::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Construction parameters for a particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Velocity policy (snow or ember behaviour)
    pub policy: VelocityPolicy,
    /// Number of particles, fixed for the field's lifetime
    pub count: usize,
    /// Full extent of the volume along X, Y and Z
    pub spread: [f32; 3],
    /// Floor of the volume; particles below it are recycled
    pub vertical_offset: f32,
    /// Translation of the whole field in world space
    pub origin: [f32; 3],
    /// Downward acceleration applied every step
    pub gravity: f32,
    /// Seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::snow()
    }
}

impl FieldConfig {
    /// Falling snow filling a 10×10×10 volume.
    pub fn snow() -> Self {
        Self {
            policy: VelocityPolicy::Falling,
            count: 500,
            spread: [10.0, 10.0, 10.0],
            vertical_offset: 0.0,
            origin: [0.0, 0.0, 0.0],
            gravity: FALL_GRAVITY,
            seed: None,
        }
    }

    /// Nether embers drifting forward out of the portal.
    ///
    /// The field is pushed one unit forward and one unit down, matching where the
    /// portal opening sits relative to the room.
    pub fn nether() -> Self {
        Self {
            policy: VelocityPolicy::drifting(NETHER_FORWARD_SPEED),
            count: 100,
            spread: [10.0, 10.0, 10.0],
            vertical_offset: 0.0,
            origin: [0.0, -1.0, -1.0],
            gravity: FALL_GRAVITY,
            seed: None,
        }
    }

    pub fn with_policy(mut self, policy: VelocityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_spread(mut self, x: f32, y: f32, z: f32) -> Self {
        self.spread = [x, y, z];
        self
    }

    pub fn with_vertical_offset(mut self, offset: f32) -> Self {
        self.vertical_offset = offset;
        self
    }

    /// Translate the field; `forward` moves it along Z, `ground` along Y.
    pub fn with_origin(mut self, forward: f32, ground: f32) -> Self {
        self.origin = [0.0, ground, forward];
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Simulation volume described by this configuration
    pub fn bounds(&self) -> FieldBounds {
        let [x, y, z] = self.spread;
        FieldBounds::new(x, y, z, self.vertical_offset)
    }

    /// World-space translation as a vector
    pub fn origin_vector(&self) -> Vec3 {
        Vec3::from(self.origin)
    }

    /// Check every parameter.
    ///
    /// A zero count and zero spreads are accepted; they produce an empty or
    /// collapsed field rather than an error.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found: a negative or non-finite spread,
    /// a non-finite offset or origin, or a negative or non-finite gravity or
    /// forward speed.
    pub fn validate(&self) -> Result<(), FieldConfigError> {
        for (axis, value) in AXES.into_iter().zip(self.spread) {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldConfigError::InvalidSpread { axis, value });
            }
        }
        if !self.vertical_offset.is_finite() {
            return Err(FieldConfigError::NonFiniteOffset(self.vertical_offset));
        }
        for (axis, value) in AXES.into_iter().zip(self.origin) {
            if !value.is_finite() {
                return Err(FieldConfigError::NonFiniteOrigin { axis, value });
            }
        }
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(FieldConfigError::InvalidGravity(self.gravity));
        }
        if let Some(speed) = self.policy.forward_speed() {
            if !speed.is_finite() || speed < 0.0 {
                return Err(FieldConfigError::InvalidForwardSpeed(speed));
            }
        }
        Ok(())
    }

    /// Copy with every invalid parameter replaced by a usable value.
    ///
    /// Bad spreads collapse to zero, bad offsets, origins and speeds fall back to zero
    /// and bad gravity to [`FALL_GRAVITY`]. Negative gravity and speeds count as bad.
    /// Each replacement is logged.
    pub(crate) fn sanitized(&self) -> Self {
        let mut config = self.clone();

        for (axis, value) in AXES.into_iter().zip(config.spread.iter_mut()) {
            if !value.is_finite() || *value < 0.0 {
                warn!("Spread {axis}={value} is invalid, collapsing to 0");
                *value = 0.0;
            }
        }
        if !config.vertical_offset.is_finite() {
            warn!("Vertical offset {} is not finite, using 0", config.vertical_offset);
            config.vertical_offset = 0.0;
        }
        for (axis, value) in AXES.into_iter().zip(config.origin.iter_mut()) {
            if !value.is_finite() {
                warn!("Origin {axis}={value} is not finite, using 0");
                *value = 0.0;
            }
        }
        if !config.gravity.is_finite() || config.gravity < 0.0 {
            warn!("Gravity {} is invalid, using {FALL_GRAVITY}", config.gravity);
            config.gravity = FALL_GRAVITY;
        }
        if let VelocityPolicy::Drifting { forward_speed } = &mut config.policy {
            if !forward_speed.is_finite() || *forward_speed < 0.0 {
                warn!("Forward speed {forward_speed} is invalid, using 0");
                *forward_speed = 0.0;
            }
        }

        config
    }
}

/// Invalid construction parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldConfigError {
    /// Spread along `axis` is negative or not finite
    InvalidSpread { axis: char, value: f32 },
    /// Vertical offset is not finite
    NonFiniteOffset(f32),
    /// Origin component along `axis` is not finite
    NonFiniteOrigin { axis: char, value: f32 },
    /// Gravity is negative or not finite
    InvalidGravity(f32),
    /// Drifting forward speed is negative or not finite
    InvalidForwardSpeed(f32),
}

impl fmt::Display for FieldConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpread { axis, value } => {
                write!(f, "spread {axis} must be finite and non-negative, got {value}")
            }
            Self::NonFiniteOffset(value) => {
                write!(f, "vertical offset must be finite, got {value}")
            }
            Self::NonFiniteOrigin { axis, value } => {
                write!(f, "origin {axis} must be finite, got {value}")
            }
            Self::InvalidGravity(value) => {
                write!(f, "gravity must be finite and non-negative, got {value}")
            }
            Self::InvalidForwardSpeed(value) => {
                write!(f, "forward speed must be finite and non-negative, got {value}")
            }
        }
    }
}

impl std::error::Error for FieldConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(FieldConfig::snow().validate(), Ok(()));
        assert_eq!(FieldConfig::nether().validate(), Ok(()));

        let nether = FieldConfig::nether();
        assert_eq!(nether.count, 100);
        assert_eq!(nether.policy.forward_speed(), Some(0.3));
        assert_eq!(nether.origin_vector(), Vec3::new(0.0, -1.0, -1.0));
    }

    #[test]
    fn test_zero_count_and_spread_are_accepted() {
        let config = FieldConfig::snow().with_count(0).with_spread(0.0, 0.0, 0.0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_first_bad_parameter() {
        let config = FieldConfig::snow().with_spread(1.0, -2.0, f32::NAN);
        assert_eq!(
            config.validate(),
            Err(FieldConfigError::InvalidSpread {
                axis: 'y',
                value: -2.0
            })
        );

        let config = FieldConfig::snow().with_gravity(f32::INFINITY);
        assert_eq!(
            config.validate(),
            Err(FieldConfigError::InvalidGravity(f32::INFINITY))
        );

        // Negative gravity would lift particles away from the floor forever
        let config = FieldConfig::snow().with_gravity(-1.0);
        assert_eq!(config.validate(), Err(FieldConfigError::InvalidGravity(-1.0)));

        let config = FieldConfig::snow().with_gravity(0.0);
        assert_eq!(config.validate(), Ok(()));

        let config = FieldConfig::snow().with_vertical_offset(f32::NEG_INFINITY);
        assert!(matches!(
            config.validate(),
            Err(FieldConfigError::NonFiniteOffset(_))
        ));

        let config = FieldConfig::nether().with_policy(VelocityPolicy::drifting(f32::NAN));
        assert!(matches!(
            config.validate(),
            Err(FieldConfigError::InvalidForwardSpeed(_))
        ));

        let config = FieldConfig::nether().with_policy(VelocityPolicy::drifting(-0.3));
        assert_eq!(
            config.validate(),
            Err(FieldConfigError::InvalidForwardSpeed(-0.3))
        );
    }

    #[test]
    fn test_sanitized_repairs_everything_validate_rejects() {
        let broken = FieldConfig {
            policy: VelocityPolicy::drifting(f32::NAN),
            count: 3,
            spread: [-1.0, f32::INFINITY, 4.0],
            vertical_offset: f32::NAN,
            origin: [f32::NAN, 1.0, 2.0],
            gravity: f32::NEG_INFINITY,
            seed: Some(9),
        };
        assert!(broken.validate().is_err());

        let repaired = broken.sanitized();
        assert_eq!(repaired.validate(), Ok(()));
        assert_eq!(repaired.spread, [0.0, 0.0, 4.0]);
        assert_eq!(repaired.vertical_offset, 0.0);
        assert_eq!(repaired.origin, [0.0, 1.0, 2.0]);
        assert_eq!(repaired.gravity, FALL_GRAVITY);
        assert_eq!(repaired.policy, VelocityPolicy::drifting(0.0));
        assert_eq!(repaired.count, 3);
        assert_eq!(repaired.seed, Some(9));

        let backwards = FieldConfig::nether()
            .with_policy(VelocityPolicy::drifting(-0.3))
            .with_gravity(-1.0);
        assert!(backwards.validate().is_err());

        let repaired = backwards.sanitized();
        assert_eq!(repaired.validate(), Ok(()));
        assert_eq!(repaired.gravity, FALL_GRAVITY);
        assert_eq!(repaired.policy, VelocityPolicy::drifting(0.0));
    }

    #[test]
    fn test_error_messages_name_the_parameter() {
        let err = FieldConfigError::InvalidSpread {
            axis: 'x',
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "spread x must be finite and non-negative, got -1"
        );
    }
}
