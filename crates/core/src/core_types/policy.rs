//! Velocity policies for particle fields
//!
//! Snow and ember fields share seeding, integration and recycling; they differ only
//! in how a particle's velocity is seeded, evolved each step and reseeded on recycle.
//!
//! | Policy     | Seed                               | Each step                         | Recycle                          |
//! |------------|------------------------------------|-----------------------------------|----------------------------------|
//! | `Falling`  | `vy ∈ (-0.1, 0]`                   | `vy -= g·dt`                      | `vy ∈ (-0.3, -0.1]`              |
//! | `Drifting` | `vy ∈ (-0.1, 0]`, `vx, vz ∈ ±0.025` | `vx = 0`, `vz = forward`, `vy -= g·dt` | `vx = 0`, `vz = forward`, `vy ∈ (-0.3, -0.1]` |

use crate::core_types::vec3::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default downward acceleration applied to every field (units per second²).
pub const FALL_GRAVITY: f32 = 0.1;

/// Forward speed of the nether ember field (base speed 0.1, tripled).
pub const NETHER_FORWARD_SPEED: f32 = 0.3;

/// Upper bound of the downward speed drawn at construction.
const SEED_FALL_SPEED: f32 = 0.1;

/// Slowest downward speed drawn on recycle.
const RECYCLE_MIN_FALL_SPEED: f32 = 0.1;

/// Width of the downward speed range drawn on recycle.
const RECYCLE_FALL_SPEED_RANGE: f32 = 0.2;

/// Half-width of the horizontal jitter seeded into drifting particles.
const DRIFT_JITTER: f32 = 0.025;

/// Rule governing how a particle's velocity evolves.
///
/// # Example
///
/// ```
/// use particle_field_core::VelocityPolicy;
///
/// let embers = VelocityPolicy::drifting(0.3);
/// assert_eq!(embers.forward_speed(), Some(0.3));
/// assert_eq!(VelocityPolicy::Falling.forward_speed(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VelocityPolicy {
    /// Gravity-only fall (snow).
    #[default]
    Falling,
    /// Constant forward motion along +Z with a weak downward pull (embers).
    Drifting {
        /// Z velocity forced onto every particle each step
        forward_speed: f32,
    },
}

impl VelocityPolicy {
    /// Drifting policy with the given forward speed.
    pub fn drifting(forward_speed: f32) -> Self {
        Self::Drifting { forward_speed }
    }

    /// Forward speed for drifting fields, `None` for falling ones.
    pub fn forward_speed(&self) -> Option<f32> {
        match *self {
            Self::Falling => None,
            Self::Drifting { forward_speed } => Some(forward_speed),
        }
    }

    /// Short lowercase label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Falling => "snow",
            Self::Drifting { .. } => "ember",
        }
    }

    /// Initial velocity of a freshly constructed particle.
    pub(crate) fn seed_velocity<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match self {
            Self::Falling => Vec3::new(0.0, -rng.random::<f32>() * SEED_FALL_SPEED, 0.0),
            Self::Drifting { .. } => {
                let vx = rng.random::<f32>() * 2.0 * DRIFT_JITTER - DRIFT_JITTER;
                let vz = rng.random::<f32>() * 2.0 * DRIFT_JITTER - DRIFT_JITTER;
                let vy = -rng.random::<f32>() * SEED_FALL_SPEED;
                Vec3::new(vx, vy, vz)
            }
        }
    }

    /// Advance `velocity` by one step, before position integration.
    ///
    /// Drifting overwrites the horizontal components instead of accumulating them.
    #[inline]
    pub(crate) fn step_velocity(&self, velocity: &mut Vec3, gravity: f32, dt: f32) {
        if let Self::Drifting { forward_speed } = *self {
            velocity.x = 0.0;
            velocity.z = forward_speed;
        }
        velocity.y -= gravity * dt;
    }

    /// Reseed `velocity` for a particle re-entering through the top face.
    ///
    /// Falling fields only redraw the vertical speed and leave the horizontal
    /// components as they were.
    pub(crate) fn recycle_velocity<R: Rng + ?Sized>(&self, velocity: &mut Vec3, rng: &mut R) {
        if let Self::Drifting { forward_speed } = *self {
            velocity.x = 0.0;
            velocity.z = forward_speed;
        }
        velocity.y = -(rng.random::<f32>() * RECYCLE_FALL_SPEED_RANGE + RECYCLE_MIN_FALL_SPEED);
    }
}
