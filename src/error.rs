//! Error types for mail2tracks.

use std::path::PathBuf;

use crate::sync::resolve::ResourceKind;

/// Why a subject line could not be turned into an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Two or more contexts in subject (@).")]
    DuplicateContext,

    #[error("Two or more projects in subject (>).")]
    DuplicateProject,

    #[error("No description for the action given.")]
    NoDescription,
}

/// Failures talking to the Tracks REST API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Error: {reason}\nURL: {url}")]
    Request { url: String, reason: String },

    #[error("Error HTTP returned {status}\n\nHeaders:\n{headers}\n\nURL: {url}")]
    Status {
        url: String,
        status: u16,
        headers: String,
    },

    #[error("Could not find location header.\n{headers}")]
    MissingLocation { headers: String },

    #[error("Bad location header.\n{line}")]
    BadLocation { line: String },

    #[error("Failed to parse XML from {url}: {reason}")]
    InvalidXml { url: String, reason: String },
}

/// Anything that stops an action from reaching one Tracks target.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unknown {kind}: {name}")]
    UnknownResource { kind: ResourceKind, name: String },

    #[error("No credentials for {base_url}: {reason}")]
    Credentials { base_url: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this system")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Bounce delivery errors. These are logged, never surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BounceError {
    #[error("Invalid bounce address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build bounce email: {0}")]
    Build(String),

    #[error("Failed to send bounce email: {0}")]
    Send(String),
}
