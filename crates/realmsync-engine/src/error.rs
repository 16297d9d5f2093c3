//! Engine error taxonomy.
//!
//! Three fatal classes: `Validation` (bad declared configuration, raised
//! before any remote mutation), `Processing` (the diff/patch engine could
//! not canonicalize an object — a schema mismatch), and `Remote` (a gateway
//! call failed; partial application is accepted, there is no rollback).
//! "Not found" never appears here: gateway lookups return `Option`.

use thiserror::Error;

use realmsync_gateway::GatewayError;

/// Error from an import pass.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Structurally invalid desired configuration.
    #[error("invalid declared configuration: {message}")]
    Validation { message: String },

    /// A step could not proceed: canonicalization failure, dangling
    /// reference, or a remote answer missing data the step needs.
    #[error("import processing failed: {message}")]
    Processing { message: String },

    /// A gateway call failed; aborts the realm's remaining steps.
    #[error(transparent)]
    Remote(#[from] GatewayError),

    /// The declared checksum-changed policy requested a hard stop.
    #[error("realm '{realm}' checksum changed and policy is fail")]
    ChecksumChanged { realm: String },
}

impl ImportError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ImportError::Validation {
            message: message.into(),
        }
    }

    /// Create a processing error.
    pub fn processing(message: impl Into<String>) -> Self {
        ImportError::Processing {
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type ImportResult<T> = Result<T, ImportError>;
