//! Configuration error types.
//!
//! Every failure in this module is a construction-time error: the simulator
//! fails fast before the first cycle rather than recovering. Contract
//! violations *during* simulation (illegal bank transitions, commands issued
//! before their earliest cycle) are simulator bugs and abort via panic
//! instead of flowing through these types.

use std::io;

use thiserror::Error;

/// Errors raised while building a memory system from a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The address-mapping string is not six two-letter fields.
    #[error("address mapping must be exactly 12 characters (six 2-letter fields), got `{0}`")]
    MalformedAddressMapping(String),

    /// The address-mapping string names an unknown field token.
    #[error("unrecognized address-mapping field `{0}` (expected ch, ra, bg, ba, ro, co)")]
    UnknownAddressField(String),

    /// The address-mapping string repeats a field token.
    #[error("duplicate address-mapping field `{0}`")]
    DuplicateAddressField(String),

    /// A structural parameter is zero or otherwise unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The configuration selects a protocol this system cannot drive.
    #[error("protocol `{0}` is not supported by the JEDEC memory system")]
    UnsupportedProtocol(String),

    /// The configuration file could not be read or parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configured output file could not be opened.
    #[error("cannot open `{path}`: {source}")]
    Io {
        /// Path of the file that failed to open.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}
