//! Opaque native types and the function table exported by the engine
//!
//! These types are never constructed in Rust. They only appear behind raw
//! pointers handed over by the native engine.

use std::ffi::c_char;

/// Native engine context (one per engine instance)
#[repr(C)]
pub struct NativeContext {
    _private: [u8; 0],
}

/// Native half of a bridged object
#[repr(C)]
pub struct NativeObject {
    _private: [u8; 0],
}

/// Raw cross-boundary object handle
///
/// Encodes an arena slot (index + version). `0` is the empty handle.
pub type RawObjectHandle = u64;

/// The empty object handle returned when no factory is registered
pub const INVALID_OBJECT_HANDLE: RawObjectHandle = 0;

/// `void RegisterFactory(Context*, const char* typeName, uint32 baseTypeHash, const char* category)`
pub type RegisterFactoryFn =
    unsafe extern "C" fn(*mut NativeContext, *const c_char, u32, *const c_char);

/// `void RemoveFactory(Context*, const char* typeName)`
pub type RemoveFactoryFn = unsafe extern "C" fn(*mut NativeContext, *const c_char);

/// Function table handed to Rust when the bridge is loaded
///
/// Every function pointer is nullable on the C side; required entries are
/// validated by the engine crate's loader.
#[repr(C)]
pub struct RawNativeApi {
    /// Must equal [`API_VERSION`](crate::API_VERSION)
    pub version: u32,

    /// Native context all registrations are made against
    pub context: *mut NativeContext,

    /// Required: publish a factory to the native registry
    pub register_factory: Option<RegisterFactoryFn>,

    /// Required: withdraw a factory from the native registry
    pub remove_factory: Option<RemoveFactoryFn>,
}
