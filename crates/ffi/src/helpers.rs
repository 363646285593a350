use crate::error::{
    with_last_error_mut, DefaultParticleFieldError, ParticleFieldError, ParticleFieldErrorCode,
};
use crate::instance::ParticleFieldInstance;
use particle_field_core::ParticleField;
use std::ffi::CString;

/// Set the thread-local error message and code.
/// Internal helper for FFI functions to record failure details.
/// Accepts any type implementing `ParticleFieldError` trait.
pub(crate) fn set_last_error(error: &impl ParticleFieldError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
/// More efficient than handling results for immediate errors.
#[inline]
pub(crate) fn track_error(error: &impl ParticleFieldError) -> ParticleFieldErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Internal helper called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = ParticleFieldErrorCode::Ok;
    });
}

/// Record the outcome of a fallible operation, keeping the value on success.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultParticleFieldError>,
) -> Result<T, ParticleFieldErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run `f` and translate its result into an FFI error code, recording any failure.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> ParticleFieldErrorCode
where
    F: FnOnce() -> Result<(), DefaultParticleFieldError>,
{
    match track_result(f()) {
        Ok(()) => ParticleFieldErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance from a raw pointer handed back by the host.
///
/// The pointer must be null or come from `particle_field_new` and not yet be destroyed.
pub(crate) fn instance_from_ptr<'a>(
    ptr: *const ParticleFieldInstance,
) -> Result<&'a ParticleFieldInstance, DefaultParticleFieldError> {
    if ptr.is_null() {
        return Err(DefaultParticleFieldError::null_pointer("ptr"));
    }
    // SAFETY: non-null, and the host contract guarantees it points to a live instance.
    Ok(unsafe { &*ptr })
}

/// Run `f` with shared access to the field.
pub(crate) fn with_field<F, R>(
    instance: &ParticleFieldInstance,
    f: F,
) -> Result<R, DefaultParticleFieldError>
where
    F: FnOnce(&ParticleField) -> R,
{
    let field = instance
        .field
        .read()
        .map_err(|_| DefaultParticleFieldError::lock_poisoned("RwLock"))?;
    Ok(f(&field))
}

/// Run `f` with exclusive access to the field.
pub(crate) fn with_field_mut<F, R>(
    instance: &ParticleFieldInstance,
    f: F,
) -> Result<R, DefaultParticleFieldError>
where
    F: FnOnce(&mut ParticleField) -> R,
{
    let mut field = instance
        .field
        .write()
        .map_err(|_| DefaultParticleFieldError::lock_poisoned("RwLock"))?;
    Ok(f(&mut field))
}
