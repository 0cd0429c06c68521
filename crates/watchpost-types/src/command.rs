//! The plain-text command grammar the console transmits.
//!
//! Wire form: `<command> <target> <operation> [params...]`, whitespace
//! separated. The device endpoint interprets the line; the console only
//! validates shape before transmission so a typo never reaches the device.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandParseError;

// ---------------------------------------------------------------------------
// DeviceOp
// ---------------------------------------------------------------------------

/// Operations shared by all controllable device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOp {
    /// Bring the device online.
    Open,
    /// Take the device offline.
    Close,
    /// Begin recording the device's data stream.
    StartRecord,
    /// Stop an in-progress recording.
    StopRecord,
}

impl DeviceOp {
    /// The exact token used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceOp::Open => "open",
            DeviceOp::Close => "close",
            DeviceOp::StartRecord => "start_record",
            DeviceOp::StopRecord => "stop_record",
        }
    }
}

impl fmt::Display for DeviceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceOp {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DeviceOp::Open),
            "close" => Ok(DeviceOp::Close),
            "start_record" => Ok(DeviceOp::StartRecord),
            "stop_record" => Ok(DeviceOp::StopRecord),
            other => Err(CommandParseError::UnknownOperation {
                op: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandLine
// ---------------------------------------------------------------------------

/// One parsed operator command line.
///
/// `Display` renders the exact wire text, so a parsed line can be
/// transmitted without reassembly drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Command key (e.g. `lidar`); catalog membership is checked separately.
    pub command: String,
    /// Device name or ID the operation targets.
    pub target: String,
    /// The operation to perform.
    pub op: DeviceOp,
    /// Trailing parameters, opaque to the console, in positional order.
    pub params: Vec<String>,
}

impl CommandLine {
    /// Parse a raw operator line against the grammar.
    ///
    /// Leading/trailing whitespace is ignored; tokens are split on any
    /// whitespace run. Catalog membership of `command` is not checked here
    /// (see [`crate::CommandCatalog::parse_line`]).
    pub fn parse(input: &str) -> Result<Self, CommandParseError> {
        let mut tokens = input.split_whitespace();

        let command = tokens.next().ok_or(CommandParseError::Empty)?.to_string();
        let target = tokens
            .next()
            .ok_or_else(|| CommandParseError::MissingTarget {
                command: command.clone(),
            })?
            .to_string();
        let op_token = tokens
            .next()
            .ok_or_else(|| CommandParseError::MissingOperation {
                command: command.clone(),
            })?;
        let op = op_token.parse::<DeviceOp>()?;
        let params = tokens.map(str::to_string).collect();

        Ok(Self {
            command,
            target,
            op,
            params,
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.command, self.target, self.op)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
