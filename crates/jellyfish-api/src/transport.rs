// Transport capability traits
//
// The client core talks to the controller through these three seams: a
// `Connector` opens a duplex text-frame connection, the returned
// `Transport` sends frames and closes, and connection events are pushed to
// a `FrameListener`. The default implementation lives in `websocket`; tests
// substitute in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::Error;

/// Receives connection events. Called from the transport's own task,
/// concurrently with callers, so implementations must not block.
pub trait FrameListener: Send + Sync {
    fn on_open(&self);

    /// `code` is the close code from the peer's close frame, if one arrived.
    fn on_close(&self, code: Option<u16>, reason: &str);

    fn on_message(&self, frame: &str);

    fn on_error(&self, error: &Error);
}

/// An open (or opening) connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Queue a text frame. Never waits for the peer.
    fn send(&self, frame: String) -> Result<(), Error>;

    /// Close the connection and wait up to `timeout` for its task to finish.
    async fn close(&self, timeout: Duration) -> Result<(), Error>;
}

/// Opens connections. `open` returns as soon as the connection attempt
/// has started; success is reported through [`FrameListener::on_open`].
pub trait Connector: Send + Sync {
    fn open(&self, url: &Url, listener: Arc<dyn FrameListener>)
    -> Result<Box<dyn Transport>, Error>;
}
