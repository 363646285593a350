//! Particle Field Core Library
//!
//! Fixed-size point particle fields for real-time scenes: falling snow and drifting
//! nether embers. Each field is confined to a box, advanced once per frame by the host
//! and recycles particles that drop through its floor back in at the top.
//!
//! The library performs no rendering. Hosts read the position buffer after each
//! update and upload it to their own point-sprite pipeline.
//!
//! ## Modules
//!
//! - [`core_types`] - volume, velocity policies, configuration and presets
//! - [`field`] - the simulator and named collections of fields

// Core types and utilities
pub mod core_types;

// Simulation
pub mod field;

// Re-export core types
pub use core_types::{FieldBounds, FieldConfig, FieldConfigError, Vec3, VelocityPolicy};
pub use core_types::policy::{FALL_GRAVITY, NETHER_FORWARD_SPEED};

// Re-export simulation types
pub use field::{FieldSet, FieldStats, ParticleField};
