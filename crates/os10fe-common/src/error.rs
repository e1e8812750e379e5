//! Error types for fabric reconciliation.
//!
//! All errors implement `std::error::Error` via `thiserror`. The reconciler
//! never retries internally; every error propagates synchronously to the
//! caller, which decides whether to re-drive the same idempotent call on a
//! later cycle.

use thiserror::Error;

/// Result type alias for fabric operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur while reconciling switch configuration.
#[derive(Debug, Error)]
pub enum FabricError {
    /// Could not reach the switch at all (connect, TLS, timeout).
    #[error("Transport error talking to switch {address}: {message}")]
    Transport {
        /// Management address of the switch.
        address: String,
        /// Underlying transport error text.
        message: String,
    },

    /// The switch answered with a non-success RESTCONF status.
    #[error("Switch {address} returned {status} for {operation}: {message}")]
    Remote {
        /// Management address of the switch.
        address: String,
        /// The logical operation that failed (e.g. "get-all-interfaces").
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the RESTCONF error body, if any.
        message: String,
    },

    /// The configured port-channel range cannot satisfy the requested slot.
    ///
    /// This indicates a capacity/configuration problem, not a transient
    /// fault, and is never retried.
    #[error("Port-channel range {begin}..={end} cannot fit slot {slot}")]
    AllocationExhausted {
        /// First allocatable channel id.
        begin: u32,
        /// Last allocatable channel id.
        end: u32,
        /// Requested slot offset.
        slot: u32,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// An interface name did not parse as its expected kind.
    #[error("Cannot parse interface name '{name}'")]
    InvalidInterfaceName {
        /// The offending name.
        name: String,
    },
}

impl FabricError {
    /// Creates a transport error.
    pub fn transport(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a remote (non-success response) error.
    pub fn remote(
        address: impl Into<String>,
        operation: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Remote {
            address: address.into(),
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid interface name error.
    pub fn invalid_interface_name(name: impl Into<String>) -> Self {
        Self::InvalidInterfaceName { name: name.into() }
    }

    /// Returns true if this error indicates a transient condition that may
    /// succeed when the caller re-drives the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FabricError::Transport { .. } | FabricError::Remote { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FabricError::transport("100.127.0.125", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error talking to switch 100.127.0.125: connection refused"
        );
    }

    #[test]
    fn test_remote_error() {
        let err = FabricError::remote("100.127.0.125", "get-all-interfaces", 500, "oops");
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("get-all-interfaces"));
    }

    #[test]
    fn test_allocation_exhausted_display() {
        let err = FabricError::AllocationExhausted {
            begin: 125,
            end: 128,
            slot: 4,
        };
        assert_eq!(
            err.to_string(),
            "Port-channel range 125..=128 cannot fit slot 4"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(FabricError::transport("a", "b").is_retryable());
        assert!(FabricError::remote("a", "op", 503, "").is_retryable());
        assert!(!FabricError::AllocationExhausted {
            begin: 125,
            end: 128,
            slot: 9
        }
        .is_retryable());
        assert!(!FabricError::invalid_config("category", "unknown").is_retryable());
    }
}
