use particle_field_core::FieldConfigError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// This trait provides a unified way to handle errors across the FFI boundary,
/// allowing both simple error codes and custom error messages.
///
/// # Design
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait ParticleFieldError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> ParticleFieldErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `ParticleFieldError` for common FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultParticleFieldError {
    code: ParticleFieldErrorCode,
    msg: String,
}

impl DefaultParticleFieldError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: ParticleFieldErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned (e.g., `"RwLock"`, `"Mutex"`)
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: ParticleFieldErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for a field description the core rejected.
    pub fn invalid_field_parameter(error: &FieldConfigError) -> Self {
        Self {
            code: ParticleFieldErrorCode::InvalidFieldParameters,
            msg: format!("Field parameter {error}"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: ParticleFieldErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl ParticleFieldError for DefaultParticleFieldError {
    fn code(&self) -> ParticleFieldErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<FieldConfigError> for DefaultParticleFieldError {
    fn from(error: FieldConfigError) -> Self {
        Self::invalid_field_parameter(&error)
    }
}

/// FFI error codes returned by particle field functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleFieldErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Invalid field parameters: spreads, gravity and forward speed must be finite
    /// and non-negative; offsets must be finite.
    InvalidFieldParameters = 3,

    /// Invalid parameter passed to function.
    InvalidParameter = 4,
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// Allows callers to retrieve diagnostic information after operations that fail.
    /// The `CString` is stored to prevent memory leaks when returning raw pointers via FFI.
    static LAST_ERROR: RefCell<(Option<CString>, ParticleFieldErrorCode)> = const { RefCell::new((None, ParticleFieldErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, ParticleFieldErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, ParticleFieldErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if no error has occurred or the last call succeeded.
///
/// # Thread Safety
/// Error messages are stored per-thread (thread-local storage), so each thread
/// has its own independent error state.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread that sets
/// or clears the error, or until the thread terminates.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// ParticleFieldInstance* snow = nullptr;
/// ParticleFieldErrorCode err = particle_field_new(desc, &snow);
/// if (err != ParticleFieldErrorCode::Ok) {
///     const char* error = particle_field_get_last_error();
///     if (error) {
///         printf("Particle field creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn particle_field_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns:
/// - `ParticleFieldErrorCode::Ok` (0) if no error has occurred
/// - The specific error code from the last failed operation
#[no_mangle]
pub extern "C" fn particle_field_get_last_error_code() -> ParticleFieldErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
