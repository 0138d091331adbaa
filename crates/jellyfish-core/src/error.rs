// ── Core error types ──
//
// Caller-facing errors from jellyfish-core. Transport and codec failures
// from jellyfish-api are translated by the `From` impl below; decode errors
// on inbound frames never reach a caller, the monitor logs and drops them.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Not connected to controller")]
    NotConnected,

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Confirmation errors ──────────────────────────────────────────
    #[error("Timed out after {timeout_ms}ms waiting for {operation}{}", outstanding(keys))]
    Timeout {
        operation: String,
        keys: Vec<String>,
        timeout_ms: u64,
    },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.into(),
        }
    }
}

fn outstanding(keys: &[String]) -> String {
    if keys.is_empty() {
        String::new()
    } else {
        format!(" (outstanding: {})", keys.join(", "))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<jellyfish_api::Error> for CoreError {
    fn from(err: jellyfish_api::Error) -> Self {
        match err {
            jellyfish_api::Error::NotConnected => CoreError::NotConnected,
            jellyfish_api::Error::InvalidUrl(e) => CoreError::ConnectionFailed {
                address: String::new(),
                reason: e.to_string(),
            },
            jellyfish_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                address: String::new(),
                reason,
            },
            jellyfish_api::Error::Send(reason) => CoreError::Internal(reason),
            jellyfish_api::Error::CloseTimeout { timeout_ms } => CoreError::ConnectionFailed {
                address: String::new(),
                reason: format!("close did not complete within {timeout_ms}ms"),
            },
            jellyfish_api::Error::Deserialization { message, .. } => {
                CoreError::Protocol { message }
            }
            jellyfish_api::Error::Serialization(e) => CoreError::Internal(e.to_string()),
        }
    }
}
