use particle_field_core::{FieldConfig, ParticleField, VelocityPolicy, FALL_GRAVITY};
use std::ptr;
use std::sync::{Mutex, RwLock};

use crate::error::{DefaultParticleFieldError, ParticleFieldErrorCode};
use crate::helpers::{track_error, track_result};
use crate::queries::ParticlePosition;

/// `FieldDesc::kind` value for a falling snow field.
pub const PARTICLE_FIELD_KIND_SNOW: u8 = 0;
/// `FieldDesc::kind` value for a drifting ember field.
pub const PARTICLE_FIELD_KIND_EMBER: u8 = 1;

/// C-compatible description of a particle field.
///
/// Carries what a scene passes when it sets up snow or portal embers: a count,
/// three spreads, a floor offset and, for embers, the translation that moves the
/// field out of the portal.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FieldDesc {
    /// `PARTICLE_FIELD_KIND_SNOW` or `PARTICLE_FIELD_KIND_EMBER`.
    pub kind: u8,
    /// Number of particles. Zero gives an empty field.
    pub count: u32,
    /// Extent along X, centred on the origin.
    pub spread_x: f32,
    /// Extent along Y, above `vertical_offset`.
    pub spread_y: f32,
    /// Extent along Z, centred on the origin.
    pub spread_z: f32,
    /// Floor of the volume.
    pub vertical_offset: f32,
    /// Translation of the whole field along Z.
    pub forward_offset: f32,
    /// Translation of the whole field along Y.
    pub ground_offset: f32,
    /// Forward speed of ember fields; ignored for snow.
    pub forward_speed: f32,
    /// Downward acceleration used when `use_gravity` is true.
    pub gravity: f32,
    /// Apply `gravity` instead of the default.
    pub use_gravity: bool,
    /// Seed used when `use_seed` is true.
    pub seed: u64,
    /// Seed the random stream from `seed` instead of the OS.
    pub use_seed: bool,
}

impl FieldDesc {
    fn to_config(self) -> Result<FieldConfig, DefaultParticleFieldError> {
        let policy = match self.kind {
            PARTICLE_FIELD_KIND_SNOW => VelocityPolicy::Falling,
            PARTICLE_FIELD_KIND_EMBER => VelocityPolicy::drifting(self.forward_speed),
            other => {
                return Err(DefaultParticleFieldError::invalid_parameter(format!(
                    "Invalid field kind: {other}. Must be 0 (snow) or 1 (ember)"
                )));
            }
        };
        let gravity = if self.use_gravity {
            self.gravity
        } else {
            FALL_GRAVITY
        };

        let mut config = FieldConfig::snow()
            .with_policy(policy)
            .with_count(self.count as usize)
            .with_spread(self.spread_x, self.spread_y, self.spread_z)
            .with_vertical_offset(self.vertical_offset)
            .with_origin(self.forward_offset, self.ground_offset)
            .with_gravity(gravity);
        config.seed = self.use_seed.then_some(self.seed);
        Ok(config)
    }

    /// Reproducible snow field 10 units on a side with its floor at -2.
    #[cfg(test)]
    pub(crate) fn seeded_snow(count: u32, seed: u64) -> Self {
        Self {
            kind: PARTICLE_FIELD_KIND_SNOW,
            count,
            spread_x: 10.0,
            spread_y: 10.0,
            spread_z: 10.0,
            vertical_offset: -2.0,
            forward_offset: 0.0,
            ground_offset: 0.0,
            forward_speed: 0.0,
            gravity: 0.0,
            use_gravity: false,
            seed,
            use_seed: true,
        }
    }
}

/// A particle field owned by the host.
///
/// # Thread Safety
/// The field is protected by an `RwLock`: `particle_field_update` takes the write lock
/// briefly once per frame, queries take the read lock. Render threads may therefore read
/// positions while the game thread owns the update.
///
/// # Usage
/// ```cpp
/// FieldDesc desc = {};
/// desc.kind = PARTICLE_FIELD_KIND_SNOW;
/// desc.count = 500;
/// desc.spread_x = desc.spread_y = desc.spread_z = 10.0f;
///
/// ParticleFieldInstance* snow = nullptr;
/// if (particle_field_new(desc, &snow) != ParticleFieldErrorCode::Ok) {
///     return;
/// }
///
/// void Tick(float dt) {
///     particle_field_update(snow, dt);
///     uintptr_t len = 0;
///     const ParticlePosition* points = nullptr;
///     particle_field_get_positions(snow, &len, &points);
///     // upload points[0..len] to the point buffer
///     particle_field_mark_uploaded(snow);
/// }
///
/// particle_field_destroy(snow);
/// ```
pub struct ParticleFieldInstance {
    pub(crate) field: RwLock<ParticleField>,
    /// Cached world-space positions to avoid per-frame allocations.
    /// Reused across calls to `particle_field_get_positions`.
    pub(crate) positions_snapshot: Mutex<Vec<ParticlePosition>>,
}

impl ParticleFieldInstance {
    /// Creates a new instance from a host description.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an unknown kind and `InvalidFieldParameters`
    /// for spreads, offsets or speeds the core rejects.
    pub(crate) fn new(desc: FieldDesc) -> Result<Box<Self>, DefaultParticleFieldError> {
        let config = desc.to_config()?;
        let field = ParticleField::try_new(config)?;
        let snapshot = Vec::with_capacity(field.count());

        Ok(Box::new(Self {
            field: RwLock::new(field),
            positions_snapshot: Mutex::new(snapshot),
        }))
    }
}

/// Create a new particle field and return it via out-parameter.
///
/// Returns
/// - `ParticleFieldErrorCode::Ok` (0) - success, `out_instance` contains valid pointer
/// - `ParticleFieldErrorCode::NullPointer` - `out_instance` is null
/// - `ParticleFieldErrorCode::InvalidParameter` - unknown `kind`
/// - `ParticleFieldErrorCode::InvalidFieldParameters` - negative or non-finite spreads,
///   gravity or forward speed, non-finite offsets
///
/// Call `particle_field_get_last_error()` for a human-readable description.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller takes ownership of the returned instance and MUST call
///   `particle_field_destroy` exactly once.
#[no_mangle]
pub unsafe extern "C" fn particle_field_new(
    desc: FieldDesc,
    out_instance: *mut *mut ParticleFieldInstance,
) -> ParticleFieldErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultParticleFieldError::null_pointer("out_instance"));
    }

    match track_result(ParticleFieldInstance::new(desc)) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            ParticleFieldErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                // Set to null on error (per documentation contract)
                *out_instance = ptr::null_mut();
            }

            code
        }
    }
}

/// Destroys a particle field previously created by `particle_field_new`.
///
/// If `ptr` is null this is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `particle_field_new`.
/// - The pointer MUST NOT have been freed already.
/// - After calling this function, the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn particle_field_destroy(ptr: *mut ParticleFieldInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: the pointer came from `Box::into_raw` in `particle_field_new` and has not
    // been freed; rebuilding the Box drops the field and its snapshot buffer.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{particle_field_get_last_error, particle_field_get_last_error_code};
    use std::ffi::CStr;

    fn snow_desc() -> FieldDesc {
        FieldDesc::seeded_snow(64, 1234)
    }

    #[test]
    fn test_new_and_destroy() {
        let mut instance: *mut ParticleFieldInstance = ptr::null_mut();
        let code = unsafe { particle_field_new(snow_desc(), &mut instance) };

        assert_eq!(code, ParticleFieldErrorCode::Ok);
        assert!(!instance.is_null());
        assert!(particle_field_get_last_error().is_null());

        unsafe { particle_field_destroy(instance) };
        unsafe { particle_field_destroy(ptr::null_mut()) };
    }

    #[test]
    fn test_new_rejects_null_out_pointer() {
        let code = unsafe { particle_field_new(snow_desc(), ptr::null_mut()) };
        assert_eq!(code, ParticleFieldErrorCode::NullPointer);
        assert_eq!(
            particle_field_get_last_error_code(),
            ParticleFieldErrorCode::NullPointer
        );
    }

    #[test]
    fn test_new_rejects_unknown_kind() {
        let mut instance: *mut ParticleFieldInstance = ptr::null_mut();
        let desc = FieldDesc {
            kind: 7,
            ..snow_desc()
        };

        let code = unsafe { particle_field_new(desc, &mut instance) };

        assert_eq!(code, ParticleFieldErrorCode::InvalidParameter);
        assert!(instance.is_null());
        let msg = unsafe { CStr::from_ptr(particle_field_get_last_error()) };
        assert!(msg.to_string_lossy().contains("Invalid field kind: 7"));
    }

    #[test]
    fn test_new_rejects_negative_spread() {
        let mut instance: *mut ParticleFieldInstance = ptr::null_mut();
        let desc = FieldDesc {
            spread_y: -1.0,
            ..snow_desc()
        };

        let code = unsafe { particle_field_new(desc, &mut instance) };

        assert_eq!(code, ParticleFieldErrorCode::InvalidFieldParameters);
        assert!(instance.is_null());
        let msg = unsafe { CStr::from_ptr(particle_field_get_last_error()) };
        assert_eq!(
            msg.to_string_lossy(),
            "Field parameter spread y must be finite and non-negative, got -1"
        );
    }

    #[test]
    fn test_desc_maps_to_config() {
        let desc = FieldDesc {
            kind: PARTICLE_FIELD_KIND_EMBER,
            forward_speed: 0.3,
            forward_offset: -1.0,
            ground_offset: -1.0,
            gravity: 0.2,
            use_gravity: true,
            use_seed: false,
            ..snow_desc()
        };

        let config = desc.to_config().expect("valid desc");

        assert_eq!(config.policy, VelocityPolicy::drifting(0.3));
        assert_eq!(config.origin, [0.0, -1.0, -1.0]);
        assert_eq!(config.gravity, 0.2);
        assert_eq!(config.count, 64);
        assert_eq!(config.seed, None);

        let config = snow_desc().to_config().expect("valid desc");
        assert_eq!(config.gravity, FALL_GRAVITY);
    }

    #[test]
    fn test_new_accepts_zero_gravity() {
        let mut instance: *mut ParticleFieldInstance = ptr::null_mut();
        let desc = FieldDesc {
            gravity: 0.0,
            use_gravity: true,
            ..snow_desc()
        };

        let code = unsafe { particle_field_new(desc, &mut instance) };

        assert_eq!(code, ParticleFieldErrorCode::Ok);
        let gravity = unsafe { (*instance).field.read().map(|field| field.config().gravity) };
        assert_eq!(gravity.ok(), Some(0.0));
        unsafe { particle_field_destroy(instance) };
    }

    #[test]
    fn test_new_rejects_bad_gravity_and_speed() {
        let rejected = [
            FieldDesc {
                gravity: f32::NAN,
                use_gravity: true,
                ..snow_desc()
            },
            FieldDesc {
                gravity: -1.0,
                use_gravity: true,
                ..snow_desc()
            },
            FieldDesc {
                kind: PARTICLE_FIELD_KIND_EMBER,
                forward_speed: -0.3,
                ..snow_desc()
            },
        ];

        for desc in rejected {
            let mut instance: *mut ParticleFieldInstance = ptr::null_mut();
            let code = unsafe { particle_field_new(desc, &mut instance) };

            assert_eq!(code, ParticleFieldErrorCode::InvalidFieldParameters, "{desc:?}");
            assert!(instance.is_null());
        }
    }
}
