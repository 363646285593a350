use crate::error::{DefaultParticleFieldError, ParticleFieldErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, with_field_mut};
use crate::instance::ParticleFieldInstance;
use particle_field_core::ParticleField;

/// Advance the field by `dt` seconds.
///
/// Thread-safe: acquires `RwLock` write lock for the update.
///
/// Safety:
/// - `ptr` must be a valid pointer returned by `particle_field_new`.
/// - Calling with an invalid pointer is undefined behavior.
/// - If `ptr` is null or `dt` is negative or non-finite this function is a no-op.
///   `dt = 0` still recycles particles moved below the floor.
#[no_mangle]
pub extern "C" fn particle_field_update(ptr: *const ParticleFieldInstance, dt: f32) {
    if !dt.is_finite() || dt < 0.0 {
        return;
    }

    // Silently ignore errors for void-returning function
    let _ = handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;

        with_field_mut(instance, |field| {
            field.update(dt);
        })?;

        Ok::<(), DefaultParticleFieldError>(())
    });
}

/// Reseed every particle inside the volume and clear the statistics.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) on success
/// - `ParticleFieldErrorCode::NullPointer` if `ptr` is null
/// - `ParticleFieldErrorCode::LockPoisoned` if the internal lock is poisoned
#[no_mangle]
pub extern "C" fn particle_field_reset(
    ptr: *const ParticleFieldInstance,
) -> ParticleFieldErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_field_mut(instance, ParticleField::reset)?;
        Ok::<(), DefaultParticleFieldError>(())
    })
}

/// Acknowledge that the host uploaded the current positions.
///
/// After this call `particle_field_needs_upload` reports `false` until the next
/// update changes the buffer.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) on success
/// - `ParticleFieldErrorCode::NullPointer` if `ptr` is null
/// - `ParticleFieldErrorCode::LockPoisoned` if the internal lock is poisoned
#[no_mangle]
pub extern "C" fn particle_field_mark_uploaded(
    ptr: *const ParticleFieldInstance,
) -> ParticleFieldErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_field_mut(instance, ParticleField::mark_uploaded)?;
        Ok::<(), DefaultParticleFieldError>(())
    })
}
