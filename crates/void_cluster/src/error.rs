//! Error types for the cluster physics core

use crate::body::ObjectId;
use thiserror::Error;

/// Cluster physics errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Object not found in the store
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Caller-supplied buffer cannot hold the requested batch
    #[error("Buffer too short: need {required} slots, got {actual}")]
    BufferTooShort {
        /// Slots the operation needs
        required: usize,
        /// Slots the caller provided
        actual: usize,
    },

    /// Invalid stepping parameters
    #[error("Invalid step parameters: {0}")]
    InvalidStep(String),

    /// Bracketed text could not be decoded
    #[error("Malformed text encoding: {0}")]
    MalformedText(String),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}

impl PhysicsError {
    /// Whether the failure stems from a caller breaking the call contract.
    ///
    /// These abort the whole batch before any mutation.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ObjectNotFound(_) | Self::BufferTooShort { .. } | Self::InvalidStep(_)
        )
    }
}

/// Result type for cluster physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
