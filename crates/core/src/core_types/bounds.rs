//! Simulation volume of a particle field
//!
//! A field lives in an axis-aligned box centred on the X/Z origin. Vertically the
//! box spans `[floor, floor + spread.y]`: particles are seeded anywhere inside it and
//! re-enter through the top face once they drop below the floor.

use crate::core_types::vec3::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Rectangular prism a particle field is confined to.
///
/// # Example
///
/// ```
/// use particle_field_core::FieldBounds;
///
/// let bounds = FieldBounds::new(10.0, 4.0, 6.0, -2.0);
/// assert_eq!(bounds.floor(), -2.0);
/// assert_eq!(bounds.ceiling(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    spread: Vec3,
    floor: f32,
}

impl FieldBounds {
    /// Create bounds from the three extents and the floor level.
    ///
    /// Extents are expected to be finite and non-negative; see
    /// [`FieldConfig::validate`](crate::FieldConfig::validate).
    pub fn new(spread_x: f32, spread_y: f32, spread_z: f32, floor: f32) -> Self {
        Self {
            spread: Vec3::new(spread_x, spread_y, spread_z),
            floor,
        }
    }

    /// Full extent along each axis
    pub fn spread(&self) -> Vec3 {
        self.spread
    }

    /// Vertical level below which particles are recycled
    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Vertical level recycled particles re-enter at (`floor + spread.y`)
    pub fn ceiling(&self) -> f32 {
        self.spread.y + self.floor
    }

    /// Whether `position` has fallen through the floor.
    #[inline]
    pub fn is_below_floor(&self, position: &Vec3) -> bool {
        position.y < self.floor
    }

    /// Whether `position` lies within the horizontal footprint of the box.
    ///
    /// Only guaranteed for a particle at the moment it is seeded or recycled;
    /// drifting particles may leave the footprint between recycles.
    pub fn contains_horizontal(&self, position: &Vec3) -> bool {
        let half_x = self.spread.x * 0.5;
        let half_z = self.spread.z * 0.5;
        (-half_x..=half_x).contains(&position.x) && (-half_z..=half_z).contains(&position.z)
    }

    /// Uniform point anywhere inside the box.
    pub(crate) fn sample_interior<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let x = centred(rng, self.spread.x);
        let y = rng.random::<f32>() * self.spread.y + self.floor;
        let z = centred(rng, self.spread.z);
        Vec3::new(x, y, z)
    }

    /// Uniform point on the top face of the box.
    pub(crate) fn sample_top<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let x = centred(rng, self.spread.x);
        let z = centred(rng, self.spread.z);
        Vec3::new(x, self.ceiling(), z)
    }
}

/// Uniform value in `[-extent/2, extent/2)`.
///
/// Scaling a unit sample keeps zero extents valid, where an empty range would panic.
#[inline]
fn centred<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * extent
}
