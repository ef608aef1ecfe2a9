//! Storage backend plugins.
//!
//! Each backend is a plugin: an id, display metadata and a factory for an
//! empty [`Connection`]. The [`PluginRegistry`] maps ids found in the
//! repository config (`type` attribute) to those factories.
//!
//! ```text
//! repository.json ──▶ ConfigNode ──type──▶ PluginRegistry ──factory──▶ Connection
//!                                                                    │ load()
//!                                                                    ▼
//!                                                    create_transfer_manager()
//! ```

mod connection;
pub mod ftp;
pub mod gs;
pub mod local;
mod registry;
mod rest;
pub mod s3;
mod types;
pub mod webdav;

pub use connection::{Connection, ConnectionDisplay};
pub use ftp::FtpConnection;
pub use gs::GsConnection;
pub use local::LocalConnection;
pub use registry::PluginRegistry;
pub use rest::{CredentialBuilder, CredentialProvider, ProviderCredentials, RestSettings};
pub use s3::S3Connection;
pub use types::{PluginInfo, PluginVersion};
pub use webdav::WebdavConnection;
