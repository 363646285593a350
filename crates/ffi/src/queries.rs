use particle_field_core::{FieldStats, ParticleField};
use std::ptr;

use crate::error::{DefaultParticleFieldError, ParticleFieldErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_field};
use crate::instance::ParticleFieldInstance;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// World-space position of one particle, laid out for direct upload as `vec3`.
pub struct ParticlePosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// FFI-friendly snapshot of a field's runtime statistics.
/// Keep this layout stable for C/C++/C# consumers.
pub struct ParticleFieldStats {
    /// Number of particles.
    pub count: usize,

    /// Particles recycled during the most recent update.
    pub recycled_last_step: usize,

    /// Particles recycled since creation or the last reset.
    pub total_recycled: u64,

    /// Simulated time in seconds.
    pub simulated_time: f32,

    /// Position buffer generation.
    pub generation: u64,

    /// Whether positions changed since the last `particle_field_mark_uploaded`.
    pub needs_upload: bool,
}

impl From<(FieldStats, bool)> for ParticleFieldStats {
    fn from((stats, needs_upload): (FieldStats, bool)) -> Self {
        Self {
            count: stats.count,
            recycled_last_step: stats.recycled_last_step,
            total_recycled: stats.total_recycled,
            simulated_time: stats.simulated_time,
            generation: stats.generation,
            needs_upload,
        }
    }
}

#[no_mangle]
/// Return a borrowed pointer to a cached snapshot of world-space particle positions.
///
/// **PERFORMANCE & THREAD SAFETY**: This function reuses an internal buffer protected by
/// Mutex to avoid per-frame allocations. The returned pointer is valid until the next call
/// to this function on the same instance or `particle_field_destroy`.
///
/// **DO NOT FREE THIS POINTER**.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) on success with `out_len` positions at `out_array`
/// - `ParticleFieldErrorCode::NullPointer` if `ptr`, `out_len`, or `out_array` is null
/// - `ParticleFieldErrorCode::LockPoisoned` if an internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `particle_field_new` or null.
/// - `out_len` must be a valid, non-null pointer to a `usize`.
/// - `out_array` must be a valid, non-null pointer to a `*const ParticlePosition`.
///
/// # Example Usage (C++)
/// ```cpp
/// uintptr_t len = 0;
/// const ParticlePosition* points = nullptr;
/// if (particle_field_get_positions(snow, &len, &points) == ParticleFieldErrorCode::Ok) {
///     glBufferSubData(GL_ARRAY_BUFFER, 0, len * sizeof(ParticlePosition), points);
/// }
/// ```
pub unsafe extern "C" fn particle_field_get_positions(
    ptr: *const ParticleFieldInstance,
    out_len: *mut usize,
    out_array: *mut *const ParticlePosition,
) -> ParticleFieldErrorCode {
    if out_len.is_null() {
        return track_error(&DefaultParticleFieldError::null_pointer("out_len"));
    }

    if out_array.is_null() {
        unsafe {
            *out_len = 0;
        }
        return track_error(&DefaultParticleFieldError::null_pointer("out_array"));
    }

    let result = handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let mut snapshot = instance
            .positions_snapshot
            .lock()
            .map_err(|_| DefaultParticleFieldError::lock_poisoned("Mutex"))?;
        snapshot.clear(); // O(1) - keeps capacity

        with_field(instance, |field| {
            snapshot.extend(field.world_positions().map(|p| ParticlePosition {
                x: p.x,
                y: p.y,
                z: p.z,
            }));
        })?;

        unsafe {
            *out_len = snapshot.len();
            *out_array = snapshot.as_ptr();
        }

        Ok::<(), DefaultParticleFieldError>(())
    });

    // Set to null on error (per documentation contract)
    if result != ParticleFieldErrorCode::Ok {
        unsafe {
            *out_array = ptr::null();
            *out_len = 0;
        }
    }

    result
}

#[no_mangle]
/// Fill `out_stats` with the field's current statistics.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) on success
/// - `ParticleFieldErrorCode::NullPointer` if `ptr` or `out_stats` is null
/// - `ParticleFieldErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `particle_field_new` or null.
/// - `out_stats` must be a valid, non-null pointer to a `ParticleFieldStats`.
pub unsafe extern "C" fn particle_field_get_stats(
    ptr: *const ParticleFieldInstance,
    out_stats: *mut ParticleFieldStats,
) -> ParticleFieldErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultParticleFieldError::null_pointer("out_stats"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let stats = with_field(instance, |field| {
            ParticleFieldStats::from((field.stats(), field.needs_upload()))
        })?;
        unsafe {
            *out_stats = stats;
        }
        Ok::<(), DefaultParticleFieldError>(())
    })
}

#[no_mangle]
/// Report whether positions changed since the host last uploaded them.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) on success
/// - `ParticleFieldErrorCode::NullPointer` if `ptr` or `out_flag` is null
/// - `ParticleFieldErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `particle_field_new` or null.
/// - `out_flag` must be a valid, non-null pointer to a `bool`.
pub unsafe extern "C" fn particle_field_needs_upload(
    ptr: *const ParticleFieldInstance,
    out_flag: *mut bool,
) -> ParticleFieldErrorCode {
    if out_flag.is_null() {
        return track_error(&DefaultParticleFieldError::null_pointer("out_flag"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let dirty = with_field(instance, ParticleField::needs_upload)?;
        unsafe {
            *out_flag = dirty;
        }
        Ok::<(), DefaultParticleFieldError>(())
    })
}
