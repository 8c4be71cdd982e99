//! Configuration error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the local configuration registry
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No configuration file at the expected location
    #[error("No configuration found at {path}.\n\nRun `tracksmith init` to create one.")]
    NotFound { path: PathBuf },

    /// A configuration file is already there; init refuses to overwrite
    #[error("A configuration already exists at {path}; refusing to overwrite it")]
    AlreadyExists { path: PathBuf },

    /// The file exists but does not decode into a valid workspace config.
    /// The detail names the missing field, the mistyped field, or the parse
    /// failure so the message is directly actionable.
    #[error("Configuration at {path} is malformed: {detail}")]
    Malformed { path: PathBuf, detail: String },

    /// Two events in the file share an id
    #[error("Duplicate event id '{id}' in configuration; event ids must be unique")]
    DuplicateEventId { id: String },

    /// Insert of an id that is already declared
    #[error("Event '{id}' is already added to this workspace")]
    EventAlreadyExists { id: String },

    /// Update or removal of an id that is not declared
    #[error("Event '{id}' is not added to this workspace")]
    EventNotFound { id: String },

    /// The in-memory config could not be serialized
    #[error("Failed to serialize configuration: {detail}")]
    Serialize { detail: String },

    /// Filesystem failure while reading or replacing the config file
    #[error("Failed to {action} configuration at {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
