//! Error types for the Prerender core library.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for Prerender.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid build input, reported before any path is processed.
    #[error("construction error: {message}")]
    Construction { message: String },

    /// A route node that can be neither flattened nor matched.
    #[error("invalid route at '{at}': {message}")]
    InvalidRoute { at: String, message: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CoreError {
    /// Create a new construction error with a message.
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Create a new invalid-route error for the node at `at`.
    pub fn invalid_route(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoute {
            at: at.into(),
            message: message.into(),
        }
    }
}
