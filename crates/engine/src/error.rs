//! Error types for native function table loading

/// Error type for native API loading operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The engine passed a null function table
    #[error("Native API table is null")]
    NullTable,

    /// The engine passed a null context pointer
    #[error("Native context is null")]
    NullContext,

    /// A required function pointer was missing from the table
    #[error("Required native function missing: {0}")]
    MissingFunction(&'static str),

    /// The table was built against a different ABI version
    #[error("API version mismatch: engine={found}, bridge={expected}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Engine already initialized
    #[error("Engine already initialized")]
    AlreadyInitialized,
}
