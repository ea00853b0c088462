use miette::Diagnostic;
use thiserror::Error;

/// Error type for API-server operations
#[derive(Error, Debug, Diagnostic)]
pub enum ClientError {
    /// HTTP transport failure (connect, timeout, body read)
    #[error("API server request failed: {0}")]
    #[diagnostic(
        code(protostar::client::transport),
        help("Check that the API server is reachable at the configured host")
    )]
    Transport(#[from] reqwest::Error),

    /// The API server answered with a status the operation does not accept
    #[error("{operation}: unexpected HTTP status {status}: {body}")]
    #[diagnostic(
        code(protostar::client::unexpected_status),
        help("The API server rejected the request; a conflict on a binding means the pod is already bound")
    )]
    UnexpectedStatus {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A response body could not be decoded
    #[error("Failed to decode API server response: {message}")]
    #[diagnostic(
        code(protostar::client::decode),
        help("The API server is expected to speak the v1 core API in JSON")
    )]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Create an UnexpectedStatus error
    pub fn unexpected_status(
        operation: &'static str,
        status: reqwest::StatusCode,
        body: impl Into<String>,
    ) -> Self {
        Self::UnexpectedStatus {
            operation,
            status,
            body: body.into(),
        }
    }

    /// Create a Decode error
    pub fn decode(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            source,
        }
    }
}
