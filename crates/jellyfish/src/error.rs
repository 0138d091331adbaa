//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use jellyfish_config::ConfigError;
use jellyfish_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {address}")]
    #[diagnostic(
        code(jellyfish::connection_failed),
        help(
            "Check that the controller is powered on and reachable on port 9000.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(jellyfish::not_found),
        help("Run: jellyfish {list_command} to see what the controller has")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Controller did not confirm '{operation}' within {timeout_ms}ms")]
    #[diagnostic(
        code(jellyfish::timeout),
        help(
            "Still waiting on: {outstanding}\n\
             Increase the wait with --timeout, or use --no-wait to skip confirmation."
        )
    )]
    Timeout {
        operation: String,
        outstanding: String,
        timeout_ms: u64,
    },

    #[error("Controller error: {message}")]
    #[diagnostic(code(jellyfish::controller))]
    Controller { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(jellyfish::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(jellyfish::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: jellyfish config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(jellyfish::no_config),
        help(
            "Pass --host, set JELLYFISH_HOST, or create a profile with: jellyfish config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(jellyfish::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(jellyfish::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(jellyfish::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Validation failure for a user-supplied field.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => {
                CliError::ConnectionFailed { address, reason }
            }

            CoreError::NotConnected => CliError::ConnectionFailed {
                address: "(disconnected)".into(),
                reason: "the controller closed the connection".into(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{}s list", entity_type.to_lowercase()),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Timeout {
                operation,
                keys,
                timeout_ms,
            } => CliError::Timeout {
                operation,
                outstanding: if keys.is_empty() {
                    "(reply)".into()
                } else {
                    keys.join(", ")
                },
                timeout_ms,
            },

            CoreError::Protocol { message } | CoreError::Internal(message) => {
                CliError::Controller { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_class() {
        let err = CliError::from(CoreError::Timeout {
            operation: "turn on".into(),
            keys: vec!["Front".into()],
            timeout_ms: 100,
        });
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err = CliError::from(CoreError::NotFound {
            entity_type: "Zone".into(),
            identifier: "Garage".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        let CliError::NotFound { list_command, .. } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "zones list");

        assert_eq!(
            CliError::from(CoreError::NotConnected).exit_code(),
            exit_code::CONNECTION
        );
    }
}
