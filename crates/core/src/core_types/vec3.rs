//! Vector type alias for 3D positions and velocities.

use nalgebra::Vector3;

/// 3D vector type for particle positions, velocities, and field origins.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`. The Y axis is vertical;
/// fields fall along negative Y and embers drift along positive Z.
pub type Vec3 = Vector3<f32>;
