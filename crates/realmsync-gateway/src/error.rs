//! Gateway error types.
//!
//! Lookup misses are not errors: every `get_*` on the gateway contract
//! returns `Ok(None)` when the resource does not exist. The variants here
//! cover genuine failures, plus `FeatureUnavailable` for endpoints the
//! target server version does not expose (callers treat that as a soft
//! skip, not a failure).

use thiserror::Error;

/// Error from a gateway operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status on a mutating or
    /// mandatory call.
    #[error("admin API returned {status} for {operation}: {message}")]
    Http {
        status: u16,
        operation: String,
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("network error during {operation}: {message}")]
    Network { operation: String, message: String },

    /// Response body could not be decoded into the expected shape.
    #[error("failed to decode {operation} response: {message}")]
    Serialization { operation: String, message: String },

    /// The adapter was constructed with unusable settings.
    #[error("invalid gateway configuration: {message}")]
    InvalidConfig { message: String },

    /// The server version does not expose this feature's endpoints.
    #[error("server does not support {feature}")]
    FeatureUnavailable { feature: String },
}

impl GatewayError {
    /// Create an HTTP status error.
    pub fn http(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        GatewayError::Http {
            status,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Network {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn serialization(operation: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Serialization {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        GatewayError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a feature-unavailable error.
    pub fn feature_unavailable(feature: impl Into<String>) -> Self {
        GatewayError::FeatureUnavailable {
            feature: feature.into(),
        }
    }

    /// Whether this error means the server lacks the feature entirely,
    /// rather than the call failing.
    #[must_use]
    pub fn is_feature_unavailable(&self) -> bool {
        matches!(self, GatewayError::FeatureUnavailable { .. })
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
