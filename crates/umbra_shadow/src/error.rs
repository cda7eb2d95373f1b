//! Shadow baking error types

use thiserror::Error;

use crate::backend::Capability;

/// Shadow baking errors
#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("{0} not supported by the graphics context; shadow mapping disabled")]
    Unsupported(Capability),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid shadow configuration: {0}")]
    InvalidConfig(String),

    #[error("No opaque render delegate configured")]
    NoDelegate,

    #[error("Shadow map {index} has no depth texture")]
    MissingTexture { index: usize },
}

/// Failure reported by a [`ShadowBackend`](crate::backend::ShadowBackend)
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct BackendError {
    pub operation: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Result type for shadow baking operations
pub type ShadowResult<T> = Result<T, ShadowError>;
