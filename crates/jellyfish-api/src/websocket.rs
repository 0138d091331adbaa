//! WebSocket transport for the controller's `ws://{host}:9000` endpoint.
//!
//! One spawned task owns the socket. Outbound frames reach it through an
//! unbounded channel so [`Transport::send`] never waits; inbound frames,
//! open/close and errors are pushed to the [`FrameListener`]. There is no
//! reconnection: when the socket drops the listener is told and the task
//! exits.
//!
//! # Example
//!
//! ```rust,ignore
//! use jellyfish_api::{Connector, WebSocketConnector};
//!
//! let transport = WebSocketConnector::new().open(&url, listener)?;
//! transport.send(r#"{"cmd":"toCtlrGet","get":[["zones"]]}"#.into())?;
//! transport.close(Duration::from_secs(5)).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::{Connector, FrameListener, Transport};

// ── Connector ────────────────────────────────────────────────────────

/// Opens [`WebSocketTransport`]s. Must be used inside a Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn open(
        &self,
        url: &Url,
        listener: Arc<dyn FrameListener>,
    ) -> Result<Box<dyn Transport>, Error> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        let task_url = url.clone();
        let task = tokio::spawn(async move {
            run_connection(task_url, listener, outbound_rx, task_cancel).await;
        });

        Ok(Box::new(WebSocketTransport {
            outbound: outbound_tx,
            cancel,
            task: Mutex::new(Some(task)),
        }))
    }
}

// ── Transport ────────────────────────────────────────────────────────

/// Handle to a running connection task.
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn send(&self, frame: String) -> Result<(), Error> {
        self.outbound.send(frame).map_err(|_| Error::NotConnected)
    }

    async fn close(&self, timeout: Duration) -> Result<(), Error> {
        self.cancel.cancel();
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::WebSocketConnect(format!("connection task failed: {e}"))),
            Err(_) => Err(Error::CloseTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Connection lifecycle ─────────────────────────────────────────────

/// Connect, then pump frames both ways until either side closes.
async fn run_connection(
    url: Url,
    listener: Arc<dyn FrameListener>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    tracing::info!(url = %url, "Connecting to WebSocket");

    let connected = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            listener.on_close(None, "cancelled before connecting");
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let err = Error::WebSocketConnect(e.to_string());
            tracing::warn!(error = %err, url = %url, "WebSocket connection failed");
            listener.on_error(&err);
            listener.on_close(None, "connection failed");
            return;
        }
    };

    tracing::info!(url = %url, "WebSocket connected");
    listener.on_open();

    let (mut write, mut read) = ws_stream.split();

    let (code, reason) = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Failed to send close frame");
                }
                break (None, String::from("closed by client"));
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break (None, String::from("transport dropped"));
                };
                tracing::debug!(frame = %frame, "Sending");
                if let Err(e) = write.send(Message::text(frame)).await {
                    let err = Error::Send(e.to_string());
                    tracing::warn!(error = %err, "WebSocket write failed");
                    listener.on_error(&err);
                    break (None, err.to_string());
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(frame = %text.as_str(), "Received");
                        listener.on_message(text.as_str());
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame.map_or((None, String::new()), |cf| {
                            (Some(u16::from(cf.code)), cf.reason.as_str().to_owned())
                        });
                        tracing::info!(code = ?code, reason = %reason, "WebSocket close frame received");
                        break (code, reason);
                    }
                    Some(Err(e)) => {
                        let err = Error::WebSocketConnect(e.to_string());
                        tracing::warn!(error = %err, "WebSocket read failed");
                        listener.on_error(&err);
                        break (None, err.to_string());
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break (None, String::from("stream ended"));
                    }
                    Some(Ok(_)) => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    };

    listener.on_close(code, &reason);
    tracing::debug!("WebSocket task exiting");
}
