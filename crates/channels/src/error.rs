use std::error::Error as StdError;

/// Crate-wide result type for transport and endpoint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level and frame-level errors.
///
/// Everything here is recoverable: transport variants end the current
/// connection and hand control back to the reconnect loop, frame variants
/// only discard the offending frame.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not establish a connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The connection went away while writing.
    #[error("connection closed")]
    Closed,

    /// WebSocket protocol or I/O failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be decoded or encoded.
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped source error from an external dependency.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection(message.to_string())
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error ends the connection it happened on.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Json(_))
    }
}
