//! Error types for the watchpost-types crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when constructing a [`crate::CommandCatalog`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two descriptors share the same `command` key.
    #[error("duplicate command '{command}' in catalog")]
    DuplicateCommand { command: String },

    /// A catalog must describe at least one command.
    #[error("catalog contains no commands")]
    EmptyCatalog,
}

/// Errors raised when parsing an operator command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    /// The input was empty or all whitespace.
    #[error("empty command line")]
    Empty,

    /// The command is not present in the catalog.
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    /// No target token followed the command.
    #[error("command '{command}' is missing a device name or ID")]
    MissingTarget { command: String },

    /// No operation token followed the target.
    #[error("command '{command}' is missing an operation")]
    MissingOperation { command: String },

    /// The operation token is not one of the known operations.
    #[error("unknown operation '{op}' (expected open, close, start_record or stop_record)")]
    UnknownOperation { op: String },
}

/// Errors raised while loading or assembling a [`crate::LinkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// The config file is not valid TOML for the expected shape.
    #[error("failed to parse config file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// No host was provided by any configuration source.
    #[error("no host configured; set `host` in the config file, WATCHPOST_HOST, or --host")]
    MissingHost,

    /// No port was provided by any configuration source.
    #[error("no port configured; set `port` in the config file, WATCHPOST_PORT, or --port")]
    MissingPort,

    /// A port or timeout value could not be parsed as a number.
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}
