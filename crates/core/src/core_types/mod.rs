//! Core types and utilities

pub mod bounds;
pub mod config;
pub mod policy;
pub mod vec3;

pub use bounds::FieldBounds;
pub use config::{FieldConfig, FieldConfigError};
pub use policy::VelocityPolicy;
pub use vec3::Vec3;
