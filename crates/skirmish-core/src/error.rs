//! Error types for the Skirmish core.
//!
//! Only boundary operations fail: parsing flat records, opening or writing a
//! backing store, loading configuration and spawning scheduler threads. The
//! entity model, the combat protocol and the fight channel never return
//! errors; races inside a live simulation are expected outcomes, not failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single flat record could not be turned into an entity.
///
/// Record errors are recovered locally: the loader skips the offending record
/// and keeps reading the rest of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The leading kind tag does not name a known entity kind.
    #[error("unexpected entity kind tag: {0}")]
    UnknownKind(i64),

    /// The record ended before the named field.
    #[error("record is missing the {0} field")]
    MissingField(&'static str),

    /// A numeric field did not parse as an integer.
    #[error("invalid integer in {field} field: {value:?}")]
    BadInteger {
        /// Name of the field being parsed.
        field: &'static str,
        /// The raw token that failed to parse.
        value: String,
    },

    /// The name token contained an escape sequence we do not write.
    #[error("invalid escape sequence in name: {0:?}")]
    BadEscape(String),

    /// Extra tokens followed the last field.
    #[error("unexpected trailing data: {0:?}")]
    TrailingData(String),
}

/// The backing store for a saved arena could not be used.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file could not be opened or created.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Writing records to the store failed part way.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Reading the record stream failed.
    #[error("cannot read record stream: {0}")]
    Read(#[from] io::Error),

    /// The leading count line was absent or not a non-negative integer.
    #[error("invalid record count line: {0:?}")]
    BadCount(String),
}

/// Simulation configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for [`SimulationConfig`](crate::config::SimulationConfig).
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The values parsed but violate a scheduling or map constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The realtime scheduler could not start.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The OS refused to spawn one of the scheduler threads.
    #[error("cannot spawn {thread} thread: {source}")]
    Spawn {
        /// Which scheduler task failed to start.
        thread: &'static str,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn spawn_failure_names_the_thread() {
        let err = SimulationError::Spawn {
            thread: "skirmish-mover",
            source: io::Error::new(io::ErrorKind::WouldBlock, "no threads left"),
        };
        assert_eq!(
            err.to_string(),
            "cannot spawn skirmish-mover thread: no threads left"
        );
        assert!(err.source().is_some());
    }
}
