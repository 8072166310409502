//! Bridge error types

use crate::attributes::AttributeError;
use crate::tasks::TaskQueueError;
use crate::types::ConstructionError;

/// Errors raised by the object factory bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The type cannot be registered as a factory at all
    #[error("Invalid factory type {type_name}: {reason}")]
    InvalidArgument {
        type_name: String,
        reason: &'static str,
    },

    /// No ancestor of the type is recognized by the native registry
    #[error("Type {type_name} has no base type known to the native registry")]
    UnregisterableType { type_name: String },

    #[error("Subsystem not found: {name}")]
    SubsystemNotFound { name: &'static str },

    /// The type's constructor failed; the source is passed through unchanged
    #[error("Failed to construct {type_name}")]
    Construction {
        type_name: String,
        #[source]
        source: ConstructionError,
    },

    #[error("Failed to register attributes of {type_name}")]
    Attributes {
        type_name: String,
        #[source]
        source: AttributeError,
    },

    /// Strict type names: a different type already owns the identifier
    #[error("Type name {type_name} is already registered by {existing}")]
    DuplicateType {
        type_name: String,
        existing: String,
    },

    #[error(transparent)]
    Queue(#[from] TaskQueueError),
}

impl BridgeError {
    pub(crate) fn invalid(type_name: &str, reason: &'static str) -> Self {
        Self::InvalidArgument {
            type_name: type_name.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_construction_error_keeps_source() {
        let err = BridgeError::Construction {
            type_name: "Foo".to_string(),
            source: ConstructionError::new("out of memory"),
        };
        assert_eq!(err.to_string(), "Failed to construct Foo");
        assert_eq!(err.source().unwrap().to_string(), "out of memory");
    }

    #[test]
    fn test_queue_error_is_transparent() {
        let err = BridgeError::from(TaskQueueError::Full);
        assert_eq!(err.to_string(), TaskQueueError::Full.to_string());
    }
}
