// ── Runtime connection configuration ──
//
// Describes *how* to reach one controller. Never touches disk: the CLI (or
// any other caller) builds a `ControllerConfig` and hands it in.

use std::time::Duration;

use url::Url;

use crate::error::CoreError;

/// Default budget for confirmation waits and connection setup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Hostname or IP address of the controller.
    pub host: String,
    /// WebSocket port.
    pub port: u16,
    /// Default confirmation timeout for requests.
    pub timeout: Duration,
    /// How long `connect` waits for the socket to open.
    pub connect_timeout: Duration,
}

impl ControllerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// `ws://{host}:{port}`
    pub fn url(&self) -> Result<Url, CoreError> {
        let raw = format!("ws://{}:{}", self.host, self.port);
        Url::parse(&raw).map_err(|e| CoreError::ConnectionFailed {
            address: raw,
            reason: e.to_string(),
        })
    }

    /// `host:port`, as used in log fields and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: jellyfish_api::DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }
}
