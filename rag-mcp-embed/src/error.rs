//! Error types for the embedding system

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Everything that can go wrong while talking to an embedding service.
///
/// Transport failures (connection refused, timeouts) surface as [`EmbedError::Request`],
/// while a service that answers with a non-2xx status surfaces as
/// [`EmbedError::Status`] carrying the response body for diagnosis.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when the provider configuration is unusable
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The HTTP request could not be completed
    #[error("Embedding request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    /// The service answered with an error status
    #[error("Embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered, but not with something we can use
    #[error("Invalid embedding response: {message}")]
    InvalidResponse { message: String },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid response error with a custom message.
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
