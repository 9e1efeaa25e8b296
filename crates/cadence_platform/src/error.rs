//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// A user-agent pattern from the classifier configuration failed to compile
    #[error("Invalid user-agent pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A classifier threshold is not a usable number
    #[error("Invalid classifier threshold `{name}`: {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
