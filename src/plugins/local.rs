//! Local folder backend.
//!
//! Stores the repository in a directory on this machine or on a mounted
//! network drive.

use opendal::layers::LoggingLayer;
use opendal::services::Fs;
use opendal::{ErrorKind, Operator};
use std::fmt;
use std::path::{Path, PathBuf};

use super::connection::{Connection, ensure_set, load_or_reset};
use super::types::{PluginInfo, PluginVersion};
use crate::config::ConfigNode;
use crate::error::ConfigError;
use crate::i18n::ResourceBundle;
use crate::transfer::OperatorSource;

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(
        LocalConnection::PLUGIN_ID,
        "Local Folder",
        PluginVersion::new(&[0, 1]),
        "use_local_folder",
        || Connection::Local(LocalConnection::default()),
    )
}

/// Settings for a local folder repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalConnection {
    folder: PathBuf,
    throttle_kbps: u32,
}

impl LocalConnection {
    pub fn new(folder: PathBuf) -> Self {
        Self {
            folder,
            throttle_kbps: 0,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn set_folder(&mut self, folder: PathBuf) {
        self.folder = folder;
    }

    /// Upload bandwidth limit in KiB/s, 0 for unlimited.
    pub fn throttle_kbps(&self) -> u32 {
        self.throttle_kbps
    }

    pub fn set_throttle_kbps(&mut self, throttle_kbps: u32) {
        self.throttle_kbps = throttle_kbps;
    }

    fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        // Mandatory
        let folder = node.require("local", "folder")?;
        if folder.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "folder",
                value: folder.to_string(),
                reason: "folder must not be empty".to_string(),
            });
        }

        // Optional
        let throttle_kbps = u32::try_from(node.integer("throttle-kbps", 0)).unwrap_or(0);

        Ok(Self {
            folder: PathBuf::from(folder),
            throttle_kbps,
        })
    }

    pub fn load(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        load_or_reset(self, Self::from_node(node))
    }

    pub fn save(&self, node: &mut ConfigNode) {
        node.clear_properties();
        node.set_attribute("type", Self::PLUGIN_ID);
        node.set_property("folder", self.folder.display());
        // Throttle is session policy and is never persisted.
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_set("local", "folder", &self.folder.to_string_lossy())
    }

    pub(crate) fn summary(&self, bundle: &ResourceBundle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocalConnection[{}={}]",
            bundle.get("local_folder"),
            self.folder.display()
        )
    }
}

impl OperatorSource for LocalConnection {
    const PLUGIN_ID: &'static str = "local";

    fn build_operator(&self) -> Result<Operator, opendal::Error> {
        let root = self.folder.to_str().ok_or_else(|| {
            opendal::Error::new(ErrorKind::ConfigInvalid, "folder path is not valid UTF-8")
        })?;

        let builder = Fs::default().root(root);
        let op = Operator::new(builder)?
            .layer(LoggingLayer::default())
            .finish();

        Ok(op)
    }

    fn throttle_kbps(&self) -> u32 {
        self.throttle_kbps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_folder(folder: &str) -> ConfigNode {
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "local");
        node.set_property("folder", folder);
        node
    }

    #[test]
    fn test_load_folder() {
        for folder in ["/srv/repo", "relative/dir", "C:\\Sync"] {
            let mut connection = LocalConnection::default();
            connection.load(&node_with_folder(folder)).unwrap();
            assert_eq!(connection.folder(), Path::new(folder));
            assert_eq!(connection.throttle_kbps(), 0);
        }
    }

    #[test]
    fn test_load_throttle() {
        let mut node = node_with_folder("/srv/repo");
        node.set_property("throttle-kbps", "256");

        let mut connection = LocalConnection::default();
        connection.load(&node).unwrap();
        assert_eq!(connection.throttle_kbps(), 256);

        node.set_property("throttle-kbps", "-5");
        connection.load(&node).unwrap();
        assert_eq!(connection.throttle_kbps(), 0);
    }

    #[test]
    fn test_missing_folder_fails() {
        let mut node = ConfigNode::new("connection");
        node.set_property("throttle-kbps", "10");

        let mut connection = LocalConnection::new(PathBuf::from("/previous"));
        let err = connection.load(&node).unwrap_err();

        assert!(err.to_string().contains("'folder'"));
        assert!(connection.validate().is_err());
        let wrapped = Connection::Local(connection);
        assert!(wrapped.create_transfer_manager().is_err());
    }

    #[test]
    fn test_save_drops_throttle() {
        let mut connection = LocalConnection::new(PathBuf::from("/srv/repo"));
        connection.set_throttle_kbps(512);

        let mut node = ConfigNode::new("connection");
        connection.save(&mut node);
        assert_eq!(node.attribute("type"), Some("local"));
        assert_eq!(node.property("throttle-kbps"), None);

        let mut restored = LocalConnection::default();
        restored.load(&node).unwrap();
        assert_eq!(restored.folder(), Path::new("/srv/repo"));
        assert_eq!(restored.throttle_kbps(), 0);
    }

    #[test]
    fn test_save_over_loaded_node_drops_throttle() {
        let mut node = node_with_folder("/srv/repo");
        node.set_property("throttle-kbps", "256");

        let mut connection = LocalConnection::default();
        connection.load(&node).unwrap();
        connection.set_throttle_kbps(0);
        connection.save(&mut node);

        connection.load(&node).unwrap();
        assert_eq!(connection.throttle_kbps(), 0);
    }

    #[test]
    fn test_summary() {
        let bundle = ResourceBundle::load("de").unwrap();
        let connection = Connection::Local(LocalConnection::new(PathBuf::from("/srv/repo")));
        assert_eq!(
            connection.display(&bundle).to_string(),
            "LocalConnection[Ordner=/srv/repo]"
        );
    }
}
