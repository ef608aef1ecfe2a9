//! Repository settings: chunk size and the storage connection.

use std::path::Path;

use super::ConfigNode;
use crate::error::{ConfigError, Error};
use crate::plugins::{Connection, PluginRegistry};

/// Chunk size used when the config does not set one.
pub const DEFAULT_CHUNK_SIZE_KB: u32 = 512;

/// Top-level settings of one synchronized repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    chunk_size_kb: u32,
    connection: Connection,
}

impl RepositoryConfig {
    pub fn new(connection: Connection) -> Self {
        Self {
            chunk_size_kb: DEFAULT_CHUNK_SIZE_KB,
            connection,
        }
    }

    /// Chunk size in KiB.
    pub fn chunk_size_kb(&self) -> u32 {
        self.chunk_size_kb
    }

    pub fn set_chunk_size_kb(&mut self, chunk_size_kb: u32) {
        self.chunk_size_kb = chunk_size_kb;
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Load from a `repository` node.
    ///
    /// The `connection` child is mandatory and its `type` must be registered.
    pub fn load(node: &ConfigNode, registry: &PluginRegistry) -> Result<Self, Error> {
        let chunk_size_kb = u32::try_from(node.integer("chunksize", DEFAULT_CHUNK_SIZE_KB.into()))
            .ok()
            .filter(|kb| *kb > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE_KB);

        let connection_node = node
            .child("connection")
            .ok_or(ConfigError::MissingSection {
                section: "connection",
            })?;
        let connection = registry.connection_from_node(connection_node)?;

        tracing::debug!(
            "Loaded repository config ({} connection, {} KiB chunks)",
            connection.plugin_id(),
            chunk_size_kb
        );

        Ok(Self {
            chunk_size_kb,
            connection,
        })
    }

    pub fn save(&self, node: &mut ConfigNode) {
        node.set_property("chunksize", self.chunk_size_kb);
        self.connection.save(node.child_or_insert("connection"));
    }

    pub fn read_file(path: &Path, registry: &PluginRegistry) -> Result<Self, Error> {
        let node = ConfigNode::read_from(path)?;
        Self::load(&node, registry)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), ConfigError> {
        let mut node = ConfigNode::new("repository");
        self.save(&mut node);
        node.write_to(path)
    }
}
