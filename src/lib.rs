//! Pluggable remote storage for file synchronization.
//!
//! A repository is configured by a JSON [`ConfigNode`](config::ConfigNode)
//! tree. Its `connection` child names a backend plugin through its `type`
//! attribute; the [`PluginRegistry`](plugins::PluginRegistry) turns that into
//! a [`Connection`](plugins::Connection), which in turn builds a
//! [`TransferManager`](transfer::TransferManager) for the actual file I/O.
//!
//! Backends: local folder, FTP, Amazon S3 (and compatibles), Google Storage
//! and WebDAV, all driven through `opendal`.

pub mod config;
pub mod error;
pub mod i18n;
pub mod plugins;
pub mod transfer;

pub use error::{ConfigError, Error, ProviderError, RegistryError, Result};
