//! Plugin registry.
//!
//! The registry is an explicit value: build it once at startup, then share it
//! (by reference or `Arc`) with whatever loads connections. After startup it
//! is only read, so concurrent lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use super::connection::Connection;
use super::types::PluginInfo;
use super::{ftp, gs, local, s3, webdav};
use crate::config::ConfigNode;
use crate::error::{ConfigError, Error, RegistryError};

/// Maps plugin ids to their metadata and connection factory.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Arc<PluginInfo>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in backend.
    pub fn with_builtin_plugins() -> Self {
        let mut registry = Self::new();
        for info in [
            local::plugin_info(),
            ftp::plugin_info(),
            s3::plugin_info(),
            gs::plugin_info(),
            webdav::plugin_info(),
        ] {
            // Built-in ids are distinct
            if let Err(e) = registry.register(info) {
                tracing::error!("Skipping built-in plugin: {}", e);
            }
        }
        registry
    }

    /// Register a plugin under its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if the id is taken and
    /// [`RegistryError::IdMismatch`] if the factory's connections report a
    /// different plugin id.
    pub fn register(&mut self, info: PluginInfo) -> Result<(), RegistryError> {
        let id = info.id();
        if self.plugins.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        let connection_id = info.create_connection().plugin_id();
        if connection_id != id {
            return Err(RegistryError::IdMismatch {
                id: id.to_string(),
                connection: connection_id.to_string(),
            });
        }
        tracing::debug!("Registered plugin {} v{}", id, info.version());
        self.plugins.insert(id, Arc::new(info));
        Ok(())
    }

    /// Look up a plugin. Repeated lookups return the same instance.
    pub fn get(&self, id: &str) -> Result<Arc<PluginInfo>, RegistryError> {
        self.plugins
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Create an empty connection for the plugin `id`.
    pub fn create_connection(&self, id: &str) -> Result<Connection, RegistryError> {
        Ok(self.get(id)?.create_connection())
    }

    /// Build a connection from a node carrying a `type` attribute.
    ///
    /// An unknown type is a registry error, never a silent fallback.
    pub fn connection_from_node(&self, node: &ConfigNode) -> Result<Connection, Error> {
        let kind = node.attribute("type").ok_or(ConfigError::MissingField {
            connection: "repository",
            field: "type",
        })?;

        let mut connection = self.create_connection(kind)?;
        connection.load(node)?;
        Ok(connection)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.plugins.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Registered plugins, sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = Arc<PluginInfo>> + '_ {
        self.ids().into_iter().filter_map(|id| self.plugins.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
