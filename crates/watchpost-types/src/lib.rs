//! Core types shared across the Watchpost crates.
//!
//! Defines the command catalog (the static palette the console renders),
//! the plain-text command grammar operators type, link configuration, and
//! the error types used by the link layer and the CLI.

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;

pub use catalog::{CommandCatalog, CommandDescriptor};
pub use command::{CommandLine, DeviceOp};
pub use config::{LinkConfig, PartialLinkConfig, DEFAULT_CONNECT_TIMEOUT};
pub use error::{CatalogError, CommandParseError, ConfigError};
