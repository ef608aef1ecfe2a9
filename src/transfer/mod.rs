//! Transfer managers: the I/O side of a connection.
//!
//! A [`Connection`](crate::plugins::Connection) only holds settings. Calling
//! `create_transfer_manager()` binds those settings to a transfer manager,
//! which performs the actual upload, download, list and delete calls.
//!
//! ```text
//! ┌──────────────────────┐  create_transfer_manager()  ┌──────────────────────────┐
//! │ Connection (enum)    │ ──────────────────────────▶ │ OperatorTransferManager  │
//! │  settings only       │                             │  <LocalConnection>, ...  │
//! └──────────────────────┘                             │  opendal Operator (lazy) │
//!                                                      └──────────────────────────┘
//! ```

mod operator;

pub use operator::{
    FtpTransferManager, GsTransferManager, LocalTransferManager, OperatorSource,
    OperatorTransferManager, S3TransferManager, TEMP_PREFIX, WebdavTransferManager,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ProviderError;

/// A file stored in the remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Object name relative to the repository root.
    pub name: String,
    /// Size in bytes, when the backend reports it.
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            last_modified: None,
        }
    }
}

/// Remote files keyed by name.
pub type RemoteFileMap = BTreeMap<String, RemoteFile>;

/// Uniform contract over every storage backend.
///
/// Operations connect lazily, so calling [`connect`](Self::connect) first is
/// optional. Implementations never retry; failures surface as
/// [`ProviderError`].
#[async_trait]
pub trait TransferManager: Send + Sync {
    /// Id of the plugin this manager belongs to.
    fn plugin_id(&self) -> &'static str;

    /// Open the backend and verify it is reachable.
    async fn connect(&mut self) -> Result<(), ProviderError>;

    /// Drop the backend handle. Safe to call when not connected.
    async fn disconnect(&mut self) -> Result<(), ProviderError>;

    async fn is_connected(&self) -> bool;

    /// Upload `local` as `remote`.
    ///
    /// Existing remote files are never overwritten; uploading a name that is
    /// already present succeeds without writing. Names whose last segment
    /// starts with [`TEMP_PREFIX`] are reserved and rejected.
    async fn upload(&self, local: &Path, remote: &RemoteFile) -> Result<(), ProviderError>;

    /// Download `remote` into `local`, replacing it atomically.
    async fn download(&self, remote: &RemoteFile, local: &Path) -> Result<(), ProviderError>;

    /// Delete `remote`. Deleting a missing file succeeds.
    async fn delete(&self, remote: &RemoteFile) -> Result<(), ProviderError>;

    /// List all files in the repository root.
    async fn list(&self) -> Result<RemoteFileMap, ProviderError> {
        self.list_prefix("").await
    }

    /// List files whose name starts with `prefix`.
    async fn list_prefix(&self, prefix: &str) -> Result<RemoteFileMap, ProviderError>;

    /// Remove leftovers of interrupted uploads.
    async fn clean(&self) -> Result<(), ProviderError>;
}

/// A boxed transfer manager for dynamic dispatch.
pub type BoxedTransferManager = Box<dyn TransferManager>;
