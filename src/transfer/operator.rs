//! Transfer manager implementation using OpenDAL.
//!
//! Every backend shares the same transfer logic; only the way the
//! [`Operator`] is built differs. Each connection type implements
//! [`OperatorSource`] and gets its own concrete manager type.

use async_lock::RwLock;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use opendal::{EntryMode, ErrorKind, Operator};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use super::{BoxedTransferManager, RemoteFile, RemoteFileMap, TransferManager};
use crate::error::ProviderError;
use crate::plugins::{FtpConnection, GsConnection, LocalConnection, S3Connection, WebdavConnection};

/// Name prefix of in-flight upload objects.
pub const TEMP_PREFIX: &str = ".temp-";

/// Connection settings that can open an OpenDAL operator.
pub trait OperatorSource: Clone + Send + Sync + 'static {
    /// Id of the plugin owning these settings.
    const PLUGIN_ID: &'static str;

    /// Build the operator. Must not perform I/O.
    fn build_operator(&self) -> Result<Operator, opendal::Error>;

    /// Upload bandwidth limit in KiB/s, 0 for unlimited.
    fn throttle_kbps(&self) -> u32 {
        0
    }
}

pub type LocalTransferManager = OperatorTransferManager<LocalConnection>;
pub type FtpTransferManager = OperatorTransferManager<FtpConnection>;
pub type S3TransferManager = OperatorTransferManager<S3Connection>;
pub type GsTransferManager = OperatorTransferManager<GsConnection>;
pub type WebdavTransferManager = OperatorTransferManager<WebdavConnection>;

/// OpenDAL-backed transfer manager bound to a snapshot of connection settings.
pub struct OperatorTransferManager<S: OperatorSource> {
    source: S,
    operator: RwLock<Option<Operator>>,
}

impl<S: OperatorSource> OperatorTransferManager<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            operator: RwLock::new(None),
        }
    }

    pub fn boxed(source: S) -> BoxedTransferManager {
        Box::new(Self::new(source))
    }

    /// The settings this manager was created from.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn backend(operation: &'static str) -> impl FnOnce(opendal::Error) -> ProviderError {
        move |source| ProviderError::Backend {
            plugin: S::PLUGIN_ID,
            operation,
            source,
        }
    }

    /// Build the operator and check the backend answers.
    async fn open(&self) -> Result<Operator, ProviderError> {
        let connect_err = |source| ProviderError::Connect {
            plugin: S::PLUGIN_ID,
            source,
        };

        let op = self.source.build_operator().map_err(connect_err)?;
        op.check().await.map_err(connect_err)?;

        tracing::info!("Connected to {} storage", S::PLUGIN_ID);
        Ok(op)
    }

    /// Get the operator, connecting first if needed.
    async fn operator(&self) -> Result<Operator, ProviderError> {
        {
            let guard = self.operator.read().await;
            if let Some(op) = guard.as_ref() {
                return Ok(op.clone());
            }
        }

        let mut guard = self.operator.write().await;
        if let Some(op) = guard.as_ref() {
            return Ok(op.clone());
        }
        let op = self.open().await?;
        *guard = Some(op.clone());
        Ok(op)
    }

    /// Write `data` to `path`, pacing chunks when a throttle is set.
    async fn write_paced(&self, op: &Operator, path: &str, data: Bytes) -> Result<(), ProviderError> {
        let kbps = self.source.throttle_kbps();
        if kbps == 0 {
            op.write(path, data).await.map_err(Self::backend("write"))?;
            return Ok(());
        }

        let chunk_size = kbps as usize * 1024;
        let mut writer = op.writer(path).await.map_err(Self::backend("write"))?;
        let started = Instant::now();
        let mut offset = 0;

        while offset < data.len() {
            let end = (offset + chunk_size).min(data.len());
            writer
                .write(data.slice(offset..end))
                .await
                .map_err(Self::backend("write"))?;
            offset = end;

            if let Some(wait) = pace_delay(offset as u64, kbps, started.elapsed()) {
                tokio::time::sleep(wait).await;
            }
        }

        writer.close().await.map_err(Self::backend("write"))?;
        Ok(())
    }

    async fn read_local(path: &Path) -> Result<Bytes, ProviderError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ProviderError::LocalFileNotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(ProviderError::LocalIo {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// How long to wait after `sent` bytes so the average rate stays at `kbps`.
fn pace_delay(sent: u64, kbps: u32, elapsed: Duration) -> Option<Duration> {
    if kbps == 0 {
        return None;
    }
    let due = Duration::from_secs_f64(sent as f64 / (kbps as f64 * 1024.0));
    due.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Temp object name for an upload of `name`, kept in the same directory.
fn temp_name(name: &str) -> String {
    let id = Uuid::new_v4().simple();
    match name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/{}{}-{}", dir, TEMP_PREFIX, id, file),
        None => format!("{}{}-{}", TEMP_PREFIX, id, name),
    }
}

/// Whether the last segment of `name` marks an upload leftover.
fn is_temp_name(name: &str) -> bool {
    let name = name.trim_end_matches('/');
    let file = name.rsplit_once('/').map_or(name, |(_, file)| file);
    file.starts_with(TEMP_PREFIX)
}

/// Write `data` next to `target` and move it into place.
fn persist_atomically(target: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(target)?;
    Ok(())
}

#[async_trait]
impl<S: OperatorSource> TransferManager for OperatorTransferManager<S> {
    fn plugin_id(&self) -> &'static str {
        S::PLUGIN_ID
    }

    async fn connect(&mut self) -> Result<(), ProviderError> {
        self.operator().await.map(|_| ())
    }

    async fn disconnect(&mut self) -> Result<(), ProviderError> {
        let mut guard = self.operator.write().await;
        if guard.take().is_some() {
            tracing::debug!("Disconnected from {} storage", S::PLUGIN_ID);
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.operator.read().await.is_some()
    }

    async fn upload(&self, local: &Path, remote: &RemoteFile) -> Result<(), ProviderError> {
        if is_temp_name(&remote.name) {
            return Err(ProviderError::ReservedName {
                name: remote.name.clone(),
            });
        }
        let data = Self::read_local(local).await?;
        let op = self.operator().await?;

        // Do not overwrite files
        if op.exists(&remote.name).await.map_err(Self::backend("exists"))? {
            tracing::debug!("{} already exists on {}, skipping upload", remote.name, S::PLUGIN_ID);
            return Ok(());
        }

        let size = data.len();
        if op.info().full_capability().rename {
            let temp = temp_name(&remote.name);
            tracing::debug!("Uploading {} to temp file {}", local.display(), temp);
            self.write_paced(&op, &temp, data).await?;

            if let Err(source) = op.rename(&temp, &remote.name).await {
                if let Err(e) = op.delete(&temp).await {
                    tracing::warn!("Failed to remove temp file {}: {}", temp, e);
                }
                return Err(Self::backend("rename")(source));
            }
        } else {
            self.write_paced(&op, &remote.name, data).await?;
        }

        tracing::info!("Uploaded {} ({} bytes) to {}", remote.name, size, S::PLUGIN_ID);
        Ok(())
    }

    async fn download(&self, remote: &RemoteFile, local: &Path) -> Result<(), ProviderError> {
        let op = self.operator().await?;

        let data = match op.read(&remote.name).await {
            Ok(buffer) => buffer.to_vec(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::RemoteFileNotFound {
                    name: remote.name.clone(),
                });
            }
            Err(source) => return Err(Self::backend("read")(source)),
        };

        let target = local.to_path_buf();
        let size = data.len();
        tokio::task::spawn_blocking(move || persist_atomically(&target, &data))
            .await
            .map_err(io::Error::other)
            .and_then(|result| result)
            .map_err(|source| ProviderError::LocalIo {
                path: local.to_path_buf(),
                source,
            })?;

        tracing::info!("Downloaded {} ({} bytes) from {}", remote.name, size, S::PLUGIN_ID);
        Ok(())
    }

    async fn delete(&self, remote: &RemoteFile) -> Result<(), ProviderError> {
        let op = self.operator().await?;
        op.delete(&remote.name).await.map_err(Self::backend("delete"))?;
        tracing::debug!("Deleted {} from {}", remote.name, S::PLUGIN_ID);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<RemoteFileMap, ProviderError> {
        let op = self.operator().await?;

        let (dir, name_prefix) = match prefix.rsplit_once('/') {
            Some((dir, rest)) => (format!("{}/", dir), rest),
            None => (String::new(), prefix),
        };

        let mut lister = op.lister(&dir).await.map_err(Self::backend("list"))?;
        let mut files = RemoteFileMap::new();

        while let Some(entry) = lister.try_next().await.map_err(Self::backend("list"))? {
            if entry.metadata().mode() != EntryMode::FILE {
                continue;
            }
            if is_temp_name(entry.path()) || !entry.name().starts_with(name_prefix) {
                continue;
            }

            let name = entry.path().to_string();
            let mut metadata = entry.metadata().clone();
            // Some listers omit sizes
            if metadata.content_length() == 0 {
                metadata = op.stat(&name).await.map_err(Self::backend("stat"))?;
            }

            files.insert(
                name.clone(),
                RemoteFile {
                    name,
                    size: Some(metadata.content_length()),
                    last_modified: metadata.last_modified(),
                },
            );
        }

        Ok(files)
    }

    async fn clean(&self) -> Result<(), ProviderError> {
        let op = self.operator().await?;

        let mut lister = op
            .lister_with("")
            .recursive(true)
            .await
            .map_err(Self::backend("list"))?;

        let mut removed = 0usize;
        while let Some(entry) = lister.try_next().await.map_err(Self::backend("list"))? {
            if entry.metadata().mode() == EntryMode::FILE && is_temp_name(entry.path()) {
                op.delete(entry.path()).await.map_err(Self::backend("delete"))?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("Removed {} stale temp files from {}", removed, S::PLUGIN_ID);
        }
        Ok(())
    }
}
