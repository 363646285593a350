//! Particle field simulation
//!
//! A [`ParticleField`] owns a fixed number of point particles confined to a
//! [`FieldBounds`] volume. Each call to [`ParticleField::update`] runs one explicit Euler
//! step:
//!
//! 1. **Velocity policy** - gravity, plus the forward drift for ember fields
//! 2. **Integration** - `position += velocity * dt`
//! 3. **Recycling** - particles below the floor re-enter at a random point on the top face
//!
//! Integration of large fields runs on the rayon pool. Recycling always walks the
//! particles in index order on the calling thread, so a seeded field produces the same
//! positions whichever path integration took.
//!
//! The host renderer reads [`ParticleField::positions`] after each update and uploads
//! them when [`ParticleField::needs_upload`] reports new data, acknowledging with
//! [`ParticleField::mark_uploaded`].

mod field_set;

pub use field_set::FieldSet;

use crate::core_types::{FieldBounds, FieldConfig, FieldConfigError, Vec3, VelocityPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fields at least this large integrate on the rayon pool.
const PARALLEL_THRESHOLD: usize = 4096;

/// Runtime statistics of a particle field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldStats {
    /// Number of particles
    pub count: usize,
    /// Particles recycled during the most recent update
    pub recycled_last_step: usize,
    /// Particles recycled since construction or the last reset
    pub total_recycled: u64,
    /// Sum of every accepted `dt`
    pub simulated_time: f32,
    /// Buffer generation, advanced whenever positions change
    pub generation: u64,
}

/// Fixed-size set of point particles falling or drifting through a box.
///
/// # Example
///
/// ```
/// use particle_field_core::{FieldConfig, ParticleField};
///
/// let mut snow = ParticleField::new(FieldConfig::snow().with_seed(1));
///
/// for _ in 0..600 {
///     snow.update(0.016);
/// }
///
/// let floor = snow.bounds().floor();
/// assert!(snow.positions().iter().all(|p| p.y >= floor));
/// assert_eq!(snow.positions().len(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FieldConfig,
    bounds: FieldBounds,
    origin: Vec3,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    rng: StdRng,
    generation: u64,
    uploaded_generation: u64,
    simulated_time: f32,
    recycled_last_step: usize,
    total_recycled: u64,
}

impl ParticleField {
    /// Build a field, repairing invalid parameters instead of failing.
    ///
    /// Negative or non-finite spreads collapse to zero and other bad values fall back
    /// to defaults (each logged as a warning). A zero count gives an empty field whose
    /// updates are no-ops.
    pub fn new(config: FieldConfig) -> Self {
        Self::build(config.sanitized())
    }

    /// Build a field, rejecting invalid parameters.
    ///
    /// # Errors
    ///
    /// Returns the first parameter [`FieldConfig::validate`] rejects.
    pub fn try_new(config: FieldConfig) -> Result<Self, FieldConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FieldConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bounds = config.bounds();
        let origin = config.origin_vector();

        let (positions, velocities): (Vec<Vec3>, Vec<Vec3>) = (0..config.count)
            .map(|_| {
                let position = bounds.sample_interior(&mut rng);
                let velocity = config.policy.seed_velocity(&mut rng);
                (position, velocity)
            })
            .unzip();

        info!(
            "Particle field created: {} {} particles, spread=({:.2}, {:.2}, {:.2}), floor={:.2}",
            config.count,
            config.policy.label(),
            bounds.spread().x,
            bounds.spread().y,
            bounds.spread().z,
            bounds.floor()
        );

        Self {
            config,
            bounds,
            origin,
            positions,
            velocities,
            rng,
            generation: 1,
            uploaded_generation: 0,
            simulated_time: 0.0,
            recycled_last_step: 0,
            total_recycled: 0,
        }
    }

    /// Advance every particle by `dt`.
    ///
    /// `dt = 0` moves nothing, but particles already below the floor are still recycled.
    /// Negative or non-finite `dt` is ignored with a warning.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Ignoring particle field update with invalid dt={dt}");
            return;
        }
        if self.positions.is_empty() {
            return;
        }

        let policy = self.config.policy;
        let gravity = self.config.gravity;

        if self.positions.len() >= PARALLEL_THRESHOLD {
            self.positions
                .par_iter_mut()
                .zip(self.velocities.par_iter_mut())
                .for_each(|(position, velocity)| {
                    integrate(policy, gravity, dt, position, velocity);
                });
        } else {
            for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
                integrate(policy, gravity, dt, position, velocity);
            }
        }

        let mut recycled = 0;
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            if self.bounds.is_below_floor(position) {
                *position = self.bounds.sample_top(&mut self.rng);
                policy.recycle_velocity(velocity, &mut self.rng);
                recycled += 1;
            }
        }

        self.recycled_last_step = recycled;
        self.total_recycled += recycled as u64;
        self.simulated_time += dt;
        self.generation = self.generation.wrapping_add(1);

        debug!(
            "Particle field update: t={:.3}s, dt={:.4}s, recycled={}",
            self.simulated_time, dt, recycled
        );
    }

    /// Reseed every particle as if the field had just been constructed.
    ///
    /// The random stream continues rather than restarting, and statistics start over.
    pub fn reset(&mut self) {
        let policy = self.config.policy;
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *position = self.bounds.sample_interior(&mut self.rng);
            *velocity = policy.seed_velocity(&mut self.rng);
        }

        self.simulated_time = 0.0;
        self.recycled_last_step = 0;
        self.total_recycled = 0;
        self.generation = self.generation.wrapping_add(1);
        info!("Particle field reset: {} particles", self.positions.len());
    }

    /// Number of particles
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Configuration the field was built from (after repair by [`ParticleField::new`])
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn bounds(&self) -> &FieldBounds {
        &self.bounds
    }

    pub fn policy(&self) -> VelocityPolicy {
        self.config.policy
    }

    /// World-space translation applied by [`ParticleField::world_positions`]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Local-space particle positions, indexed by particle
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Particle velocities, parallel to [`ParticleField::positions`]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Positions translated by the field origin
    pub fn world_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.iter().map(move |p| p + self.origin)
    }

    /// Fill `out` with local positions as interleaved `x, y, z` floats.
    ///
    /// `out` is cleared first and keeps its capacity, so a host can reuse one upload
    /// buffer across frames.
    pub fn write_flat_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.positions.len() * 3);
        out.extend(self.positions.iter().flat_map(|p| [p.x, p.y, p.z]));
    }

    /// Overwrite one particle's position. Returns `false` if `index` is out of range.
    ///
    /// A position below the floor is recycled on the next update.
    pub fn set_position(&mut self, index: usize, position: Vec3) -> bool {
        match self.positions.get_mut(index) {
            Some(slot) => {
                *slot = position;
                self.generation = self.generation.wrapping_add(1);
                true
            }
            None => false,
        }
    }

    /// Overwrite one particle's velocity. Returns `false` if `index` is out of range.
    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) -> bool {
        match self.velocities.get_mut(index) {
            Some(slot) => {
                *slot = velocity;
                true
            }
            None => false,
        }
    }

    /// Current buffer generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether positions changed since the host last called [`ParticleField::mark_uploaded`]
    pub fn needs_upload(&self) -> bool {
        self.generation != self.uploaded_generation
    }

    /// Record that the host has uploaded the current positions.
    pub fn mark_uploaded(&mut self) {
        self.uploaded_generation = self.generation;
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats {
            count: self.positions.len(),
            recycled_last_step: self.recycled_last_step,
            total_recycled: self.total_recycled,
            simulated_time: self.simulated_time,
            generation: self.generation,
        }
    }
}

/// Velocity policy then Euler integration for one particle.
#[inline(always)]
fn integrate(
    policy: VelocityPolicy,
    gravity: f32,
    dt: f32,
    position: &mut Vec3,
    velocity: &mut Vec3,
) {
    policy.step_velocity(velocity, gravity, dt);
    *position += *velocity * dt;
}
