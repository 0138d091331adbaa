use thiserror::Error;

/// Top-level error type for the `jellyfish-api` crate.
///
/// Covers the transport and codec failure modes. `jellyfish-core` maps
/// these into caller-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// A frame was handed to a transport whose connection is gone.
    #[error("Transport is not connected")]
    NotConnected,

    /// The outbound frame could not be queued or written.
    #[error("Failed to send frame: {0}")]
    Send(String),

    /// Closing the connection did not finish within the allotted time.
    #[error("Timed out closing connection after {timeout_ms}ms")]
    CloseTimeout { timeout_ms: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// An outbound payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
