//! The command palette: a fixed, ordered list of command descriptors.
//!
//! The catalog is pure data. The console renders it as the operator's
//! command palette and uses the `command` key to validate input before
//! transmission. It is hand-authored, immutable after construction, and
//! deterministic: [`CommandCatalog::list`] returns the same sequence on
//! every call.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::command::CommandLine;
use crate::error::{CatalogError, CommandParseError};

// ---------------------------------------------------------------------------
// CommandDescriptor
// ---------------------------------------------------------------------------

/// Describes one controllable device class for UI display.
///
/// `mnemonic` is purely presentational (`<3-letter-prefix>[<index>]`, e.g.
/// `LDA[0]`); nothing parses it. The `usage` slots are ordered: they are
/// positional in the command syntax the operator types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Stable lowercase identifier, unique within the catalog.
    pub command: String,
    /// Short display code shown alongside the command.
    pub mnemonic: String,
    /// Human-readable parameter-slot descriptions, in positional order.
    pub usage: Vec<String>,
}

impl CommandDescriptor {
    /// Create a descriptor from string-like parts.
    pub fn new(
        command: impl Into<String>,
        mnemonic: impl Into<String>,
        usage: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            command: command.into(),
            mnemonic: mnemonic.into(),
            usage: usage.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandCatalog
// ---------------------------------------------------------------------------

/// Immutable, ordered collection of [`CommandDescriptor`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    entries: Vec<CommandDescriptor>,
}

impl CommandCatalog {
    /// Build a catalog, rejecting duplicates and empty sets.
    ///
    /// Declaration order is preserved.
    pub fn new(entries: Vec<CommandDescriptor>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.command.as_str()) {
                return Err(CatalogError::DuplicateCommand {
                    command: entry.command.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The standard hand-authored panel set: `lidar` and `camera`.
    pub fn standard() -> Self {
        // Known-unique by construction, so this bypasses the duplicate check.
        Self {
            entries: vec![
                CommandDescriptor::new(
                    "lidar",
                    "LDA[0]",
                    [
                        "[lidar name or ID]",
                        "[lidar operations]{open, close, start_record, stop_record}",
                        "[other parameters]",
                    ],
                ),
                CommandDescriptor::new(
                    "camera",
                    "CMA[1]",
                    [
                        "[camera name or ID]",
                        "[camera operations]{open, close, start_record, stop_record}",
                        "[other parameters]",
                    ],
                ),
            ],
        }
    }

    /// All descriptors, in declaration order.
    pub fn list(&self) -> &[CommandDescriptor] {
        &self.entries
    }

    /// Look up a descriptor by its `command` key.
    pub fn get(&self, command: &str) -> Option<&CommandDescriptor> {
        self.entries.iter().find(|d| d.command == command)
    }

    /// Whether the catalog contains the given command key.
    pub fn contains(&self, command: &str) -> bool {
        self.get(command).is_some()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty. Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse an operator line and verify its command is in this catalog.
    ///
    /// The grammar check is [`CommandLine::parse`]; on top of it this rejects
    /// commands the palette does not offer.
    pub fn parse_line(&self, input: &str) -> Result<CommandLine, CommandParseError> {
        let line = CommandLine::parse(input)?;
        if !self.contains(&line.command) {
            return Err(CommandParseError::UnknownCommand {
                command: line.command,
            });
        }
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
