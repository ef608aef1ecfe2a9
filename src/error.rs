//! Error types for remote storage connections.
//!
//! Configuration, registry and provider failures are kept apart so callers
//! can tell a broken config file from a missing plugin or a failing backend.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or validating connection settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A mandatory property is absent.
    #[error("{connection} connection must contain a '{field}'")]
    MissingField {
        connection: &'static str,
        field: &'static str,
    },

    /// A mandatory child node is absent.
    #[error("missing '{section}' section")]
    MissingSection { section: &'static str },

    /// A property is present but cannot be used.
    #[error("invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The connection was never loaded (or its last load failed).
    #[error("{connection} connection is not configured: '{field}' is empty")]
    Incomplete {
        connection: &'static str,
        field: &'static str,
    },

    /// Malformed JSON in a persisted config file.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An embedded locale bundle could not be decoded.
    #[error("invalid locale bundle '{lang}': {reason}")]
    Locale { lang: String, reason: String },
}

/// Errors raised by the plugin registry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("plugin '{0}' is already registered")]
    DuplicateId(String),

    #[error("no plugin registered with id '{0}'")]
    NotFound(String),

    /// The factory builds connections belonging to another plugin.
    #[error("plugin '{id}' creates '{connection}' connections")]
    IdMismatch { id: String, connection: String },
}

/// Errors raised by transfer managers while talking to a backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to connect to {plugin} storage: {source}")]
    Connect {
        plugin: &'static str,
        #[source]
        source: opendal::Error,
    },

    #[error("{plugin} {operation} failed: {source}")]
    Backend {
        plugin: &'static str,
        operation: &'static str,
        #[source]
        source: opendal::Error,
    },

    #[error("no such remote file: {name}")]
    RemoteFileNotFound { name: String },

    /// The name would be taken for an upload leftover.
    #[error("remote name '{name}' uses the reserved temp prefix")]
    ReservedName { name: String },

    #[error("no such local file: {path}")]
    LocalFileNotFound { path: PathBuf },

    #[error("local I/O error on {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for operations spanning several layers.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result alias for operations returning the umbrella [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
