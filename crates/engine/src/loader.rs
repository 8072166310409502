//! Native function table validation

use std::ptr::NonNull;

use objbridge_sdk::{RawNativeApi, API_VERSION};

use crate::error::ApiError;
use crate::globals::EngineGlobals;

/// Validate the native function table and build engine globals
///
/// Called during bridge load with the table the engine passes in.
///
/// # Safety
/// `api` must be null or point to a valid, initialized `RawNativeApi`.
#[tracing::instrument(skip_all)]
pub unsafe fn load_api(api: *const RawNativeApi) -> Result<EngineGlobals, ApiError> {
    let api = api.as_ref().ok_or(ApiError::NullTable)?;

    if api.version != API_VERSION {
        return Err(ApiError::VersionMismatch {
            expected: API_VERSION,
            found: api.version,
        });
    }

    let context = NonNull::new(api.context).ok_or(ApiError::NullContext)?;
    tracing::info!("NativeContext: {:p}", context.as_ptr());

    // Required entry points - fail if any are missing
    let register_factory = api
        .register_factory
        .ok_or(ApiError::MissingFunction("RegisterFactory"))?;
    let remove_factory = api
        .remove_factory
        .ok_or(ApiError::MissingFunction("RemoveFactory"))?;

    Ok(EngineGlobals::new(context, register_factory, remove_factory))
}
