//! WebSocket device link for the Watchpost console.
//!
//! One [`DeviceLink`] owns one outbound connection to a device-control
//! endpoint (`ws://<host>:<port>/`, plain-text frames, no sub-protocol).
//! The crate provides:
//!
//! - **`link`**: the [`DeviceLink`] itself, its explicit
//!   [`LinkState`] machine, guarded `send`, and handler-based inbound
//!   delivery.
//! - **`error`**: typed [`LinkError`] values so connection failures and
//!   sends on a dead link surface to the console instead of being
//!   swallowed.

pub mod error;
pub mod link;

pub use error::LinkError;
pub use link::{DeviceLink, InboundHandler, LinkState};
