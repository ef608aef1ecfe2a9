//! Plugin metadata.

use std::fmt;

use super::connection::Connection;
use crate::i18n::ResourceBundle;

/// Plugin version as an ordered list of numbers, e.g. `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginVersion(Vec<u32>);

impl PluginVersion {
    pub fn new(parts: &[u32]) -> Self {
        Self(parts.to_vec())
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Registration metadata for a storage backend.
///
/// Immutable once registered. The `factory` produces an empty connection of
/// the plugin's type, to be populated with [`Connection::load`].
#[derive(Debug, Clone)]
pub struct PluginInfo {
    id: &'static str,
    name: &'static str,
    version: PluginVersion,
    description_key: &'static str,
    factory: fn() -> Connection,
}

impl PluginInfo {
    pub fn new(
        id: &'static str,
        name: &'static str,
        version: PluginVersion,
        description_key: &'static str,
        factory: fn() -> Connection,
    ) -> Self {
        Self {
            id,
            name,
            version,
            description_key,
            factory,
        }
    }

    /// Unique id, also used as the `type` tag in persisted config.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Human-readable backend name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> &PluginVersion {
        &self.version
    }

    /// Localized one-line description.
    pub fn description<'a>(&self, bundle: &'a ResourceBundle) -> &'a str {
        bundle.get(self.description_key)
    }

    /// Create an empty connection for this plugin.
    pub fn create_connection(&self) -> Connection {
        (self.factory)()
    }
}
