use thiserror::Error;

/// Top-level error type for iris.
#[derive(Debug, Error)]
pub enum IrisError {
    /// Error from the completion service (network, status, malformed payload).
    #[error("provider error: {0}")]
    Provider(String),

    /// Outbound delivery failure on a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Webhook signature rejected.
    #[error("signature error: {0}")]
    Signature(String),

    /// News feed failure.
    #[error("feed error: {0}")]
    Feed(String),

    /// User input did not match an accepted pattern.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
