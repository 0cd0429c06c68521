//! The device link: one owned WebSocket connection to a command endpoint.
//!
//! A [`DeviceLink`] is constructed by dialing `ws://<host>:<port>/` and owns
//! the connection exclusively. Outbound plain-text commands go through
//! [`DeviceLink::send`]; inbound frames are read by a background task and
//! delivered, in transport order, to the handler installed with
//! [`DeviceLink::start`]. There is no reconnect: once the link reaches
//! [`LinkState::Closed`], a new link must be constructed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use watchpost_types::LinkConfig;

use crate::error::LinkError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Callback invoked with each inbound text payload.
pub type InboundHandler = Box<dyn FnMut(String) + Send>;

/// Lifecycle states of a device link.
///
/// `Connecting -> Open -> Closing -> Closed`, with a direct jump to
/// `Closed` from any state on transport error or remote close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// The WebSocket handshake is in progress.
    Connecting,
    /// The link is established; `send` is valid.
    Open,
    /// A close frame has been written; waiting for the transport to drain.
    Closing,
    /// The connection is gone. Terminal.
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Connecting => "connecting",
            LinkState::Open => "open",
            LinkState::Closing => "closing",
            LinkState::Closed => "closed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DeviceLink
// ---------------------------------------------------------------------------

/// Exclusive owner of one WebSocket connection to a device-control endpoint.
///
/// # Example (conceptual)
///
/// ```ignore
/// let config = LinkConfig::new("192.168.2.10", 1000)?;
/// let link = DeviceLink::connect(&config).await?;
/// link.start(|payload| println!("device: {payload}"));
/// link.send("lidar LDA0 open").await?;
/// link.stop().await?;
/// ```
pub struct DeviceLink {
    /// WebSocket write half, behind a mutex for shared access.
    writer: Arc<Mutex<WsSink>>,
    /// Single writer side of the state channel (shared with the read task).
    state_tx: Arc<watch::Sender<LinkState>>,
    /// Observation side of the state channel.
    state_rx: watch::Receiver<LinkState>,
    /// Installed inbound handler, if any. Replaced wholesale by `start`.
    handler: Arc<std::sync::Mutex<Option<InboundHandler>>>,
    /// Handle to the background read task.
    _read_task: tokio::task::JoinHandle<()>,
}

impl fmt::Debug for DeviceLink {
    // The sink and handler slot are not Debug; the state is what matters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceLink")
            .field("state", &*self.state_rx.borrow())
            .finish_non_exhaustive()
    }
}

impl DeviceLink {
    /// Dial the configured endpoint and return an open link.
    ///
    /// The handshake is bounded by `config.connect_timeout`; an unreachable
    /// or unresponsive endpoint surfaces as a typed error, never as a link
    /// stuck in `Connecting`.
    pub async fn connect(config: &LinkConfig) -> Result<Self, LinkError> {
        let url = config.endpoint_url();
        tracing::info!(url = %url, "connecting to device endpoint");

        let (state_tx, state_rx) = watch::channel(LinkState::Connecting);
        let state_tx = Arc::new(state_tx);

        let handshake = tokio_tungstenite::connect_async(url.as_str());
        let (ws_stream, _) = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| LinkError::ConnectTimeout {
                duration: config.connect_timeout,
            })?
            .map_err(|e| LinkError::ConnectFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let _ = state_tx.send(LinkState::Open);
        tracing::info!(url = %url, "device link established");

        let (writer, reader) = ws_stream.split();
        let handler: Arc<std::sync::Mutex<Option<InboundHandler>>> =
            Arc::new(std::sync::Mutex::new(None));

        let state_for_reader = Arc::clone(&state_tx);
        let handler_for_reader = Arc::clone(&handler);
        let read_task = tokio::spawn(async move {
            Self::read_loop(reader, state_for_reader, handler_for_reader).await;
        });

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            state_tx,
            state_rx,
            handler,
            _read_task: read_task,
        })
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Install the inbound handler.
    ///
    /// Frames that arrive while no handler is installed are dropped with a
    /// debug log. Calling `start` again replaces the previous handler; there
    /// is no accumulation.
    pub fn start<F>(&self, handler: F)
    where
        F: FnMut(String) + Send + 'static,
    {
        if let Ok(mut slot) = self.handler.lock() {
            *slot = Some(Box::new(handler));
        }
    }

    /// Transmit one plain-text command verbatim.
    ///
    /// Valid only while the link is `Open`; anything else is a
    /// [`LinkError::SendAfterClose`]. A transport-level write failure closes
    /// the link.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), LinkError> {
        let state = self.state();
        if state != LinkState::Open {
            return Err(LinkError::SendAfterClose { state });
        }

        let payload = text.into();
        tracing::debug!(len = payload.len(), "sending command frame");

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send(Message::Text(payload.into())).await {
            let _ = self.state_tx.send(LinkState::Closed);
            return Err(LinkError::SendFailed {
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Request an orderly close.
    ///
    /// Writes a close frame and moves to `Closing`; the read task observes
    /// the close handshake and lands in `Closed`. Stopping a link that is
    /// not open is a no-op. In-flight sends are not guaranteed to complete.
    pub async fn stop(&self) -> Result<(), LinkError> {
        if self.state() != LinkState::Open {
            return Ok(());
        }

        let _ = self.state_tx.send(LinkState::Closing);
        tracing::info!("closing device link");

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send(Message::Close(None)).await {
            // The transport is already gone; that still counts as closed.
            let _ = self.state_tx.send(LinkState::Closed);
            return Err(LinkError::CloseFailed {
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Wait until the link reaches `target`, bounded by `wait`.
    pub async fn wait_for_state(&self, target: LinkState, wait: Duration) -> Result<(), LinkError> {
        let mut rx = self.state_rx.clone();
        let reached = tokio::time::timeout(wait, async {
            loop {
                if *rx.borrow() == target {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return *rx.borrow() == target;
                }
            }
        })
        .await;

        match reached {
            Ok(true) => Ok(()),
            _ => Err(LinkError::StateTimeout {
                target,
                duration: wait,
            }),
        }
    }

    /// Background task: read frames until the connection ends.
    ///
    /// Text frames (and binary frames that decode as UTF-8) go to the
    /// installed handler in arrival order. Malformed binary frames are
    /// logged and skipped. Any read error, close frame, or stream end moves
    /// the link to `Closed`.
    async fn read_loop(
        mut reader: WsSource,
        state: Arc<watch::Sender<LinkState>>,
        handler: Arc<std::sync::Mutex<Option<InboundHandler>>>,
    ) {
        while let Some(msg_result) = reader.next().await {
            let msg = match msg_result {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, "read error on device link, stopping reader");
                    break;
                }
            };

            let text = match msg {
                Message::Text(t) => t.to_string(),
                Message::Binary(b) => match String::from_utf8(b.to_vec()) {
                    Ok(s) => s,
                    Err(_) => {
                        tracing::warn!("malformed inbound frame: not valid UTF-8, skipping");
                        continue;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("device endpoint closed the link");
                    break;
                }
                _ => continue,
            };

            match handler.lock() {
                Ok(mut slot) => match slot.as_mut() {
                    Some(h) => h(text),
                    None => {
                        tracing::debug!("inbound frame dropped: no handler installed");
                    }
                },
                Err(_) => {
                    tracing::warn!("inbound handler poisoned, stopping reader");
                    break;
                }
            }
        }

        let _ = state.send(LinkState::Closed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
