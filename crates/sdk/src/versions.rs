//! ABI version constants
//!
//! The native engine passes the version it was compiled against inside
//! [`RawNativeApi`](crate::RawNativeApi). A mismatch is rejected at load time.

/// Version of the [`RawNativeApi`](crate::RawNativeApi) layout
///
/// Bump whenever a field is added, removed or reordered.
pub const API_VERSION: u32 = 1;

/// Prefix the native side uses to name the director class of a wrapper base
///
/// The base type hash sent with every factory registration is the hash of
/// `DIRECTOR_PREFIX + <wrapper base name>`, which is the class the engine
/// actually instantiates before calling back into Rust.
pub const DIRECTOR_PREFIX: &str = "SwigDirector_";
