//! Error types for the watchpost-link crate.

use std::time::Duration;

use thiserror::Error;

use crate::link::LinkState;

/// Errors that can occur on the device link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The WebSocket handshake to the device endpoint failed.
    #[error("failed to connect to device endpoint {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// The handshake did not complete within the configured timeout.
    #[error("connection attempt timed out after {duration:?}")]
    ConnectTimeout { duration: Duration },

    /// `send` was called while the link was not open.
    #[error("cannot send on a {state} link")]
    SendAfterClose { state: LinkState },

    /// The transport rejected an outbound frame; the link is now closed.
    #[error("failed to transmit frame: {reason}")]
    SendFailed { reason: String },

    /// The close frame could not be written.
    #[error("failed to close link: {reason}")]
    CloseFailed { reason: String },

    /// The link did not reach the expected state within the given wait.
    #[error("link did not reach state {target} within {duration:?}")]
    StateTimeout {
        target: LinkState,
        duration: Duration,
    },
}
