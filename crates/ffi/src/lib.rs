//! C ABI over `particle-field-core`.
//!
//! Each field lives behind an opaque `ParticleFieldInstance` pointer created by
//! `particle_field_new` and released with `particle_field_destroy`. Fallible calls
//! return a `ParticleFieldErrorCode`; `particle_field_get_last_error` describes the
//! most recent failure on the calling thread.

mod error;
mod helpers;
mod instance;
mod queries;
mod simulation;

pub use error::{
    particle_field_get_last_error, particle_field_get_last_error_code, ParticleFieldErrorCode,
};
pub use instance::{
    particle_field_destroy, particle_field_new, FieldDesc, ParticleFieldInstance,
    PARTICLE_FIELD_KIND_EMBER, PARTICLE_FIELD_KIND_SNOW,
};
pub use queries::{
    particle_field_get_positions, particle_field_get_stats, particle_field_needs_upload,
    ParticlePosition, ParticleFieldStats,
};
pub use simulation::{particle_field_mark_uploaded, particle_field_reset, particle_field_update};
