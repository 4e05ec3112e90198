//! Validation command-trace writer.
//!
//! One line per issued command, in issue order:
//! `<clk> <cmd_name> <channel> <rank> <bankgroup> <bank> <row> <column>`
//! with the clock left-justified to eight columns and addresses decimal.
//! The format is stable; downstream checkers diff it against reference
//! simulators.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::common::command::Command;
use crate::common::error::ConfigError;

/// Buffered line writer for the validation trace.
#[derive(Debug)]
pub struct CommandTrace {
    path: String,
    out: Option<BufWriter<File>>,
}

impl CommandTrace {
    /// Creates (truncates) the trace file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be created; trace output
    /// was requested, so failing to provide it fails construction.
    pub fn create(path: &str) -> Result<Self, ConfigError> {
        let file = File::create(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_string(),
            out: Some(BufWriter::new(file)),
        })
    }

    /// Appends one issued command.
    ///
    /// A write failure mid-run logs a warning and disables the writer; the
    /// simulation itself is unaffected.
    pub fn write(&mut self, clk: u64, cmd: &Command) {
        if let Some(out) = self.out.as_mut() {
            if let Err(err) = writeln!(out, "{clk:<8} {cmd}") {
                tracing::warn!(path = %self.path, %err, "validation trace write failed; disabling");
                self.out = None;
            }
        }
    }
}
