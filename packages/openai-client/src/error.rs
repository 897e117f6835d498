//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing API key or invalid client settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed or timed out before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// The API answered but returned no choices or empty content
    #[error("Empty response from OpenAI")]
    EmptyResponse,
}
