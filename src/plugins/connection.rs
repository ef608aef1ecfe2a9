//! The connection sum type.
//!
//! One variant per backend, each carrying only that backend's settings.

use std::fmt;
use std::sync::Arc;
use url::Url;

use super::registry::PluginRegistry;
use super::types::PluginInfo;
use super::{FtpConnection, GsConnection, LocalConnection, S3Connection, WebdavConnection};
use crate::config::ConfigNode;
use crate::error::{ConfigError, RegistryError};
use crate::i18n::ResourceBundle;
use crate::transfer::{BoxedTransferManager, OperatorSource, OperatorTransferManager};

/// A configured handle to one storage backend.
///
/// A connection starts empty (as produced by a plugin factory), gets its
/// settings from [`load`](Self::load) and can then build a transfer manager.
///
/// # Example
///
/// ```
/// use syncremote::config::ConfigNode;
/// use syncremote::plugins::PluginRegistry;
///
/// let registry = PluginRegistry::with_builtin_plugins();
///
/// let mut node = ConfigNode::new("connection");
/// node.set_attribute("type", "s3");
/// node.set_property("accessKey", "AK");
/// node.set_property("secretKey", "SK");
/// node.set_property("bucket", "b1");
///
/// let mut connection = registry.create_connection("s3")?;
/// connection.load(&node)?;
/// let _manager = connection.create_transfer_manager()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Local(LocalConnection),
    Ftp(FtpConnection),
    S3(S3Connection),
    Gs(GsConnection),
    Webdav(WebdavConnection),
}

impl Connection {
    /// Fixed id of this connection's plugin.
    pub fn plugin_id(&self) -> &'static str {
        match self {
            Connection::Local(_) => LocalConnection::PLUGIN_ID,
            Connection::Ftp(_) => FtpConnection::PLUGIN_ID,
            Connection::S3(_) => S3Connection::PLUGIN_ID,
            Connection::Gs(_) => GsConnection::PLUGIN_ID,
            Connection::Webdav(_) => WebdavConnection::PLUGIN_ID,
        }
    }

    /// Look up this connection's plugin metadata.
    pub fn plugin_info(&self, registry: &PluginRegistry) -> Result<Arc<PluginInfo>, RegistryError> {
        registry.get(self.plugin_id())
    }

    /// Populate settings from `node`.
    ///
    /// Mandatory fields are read first. On failure the connection is reset to
    /// its empty state and cannot build a transfer manager.
    pub fn load(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        match self {
            Connection::Local(c) => c.load(node),
            Connection::Ftp(c) => c.load(node),
            Connection::S3(c) => c.load(node),
            Connection::Gs(c) => c.load(node),
            Connection::Webdav(c) => c.load(node),
        }
    }

    /// Write the `type` tag and persisted settings into `node`.
    ///
    /// Properties already in `node` are dropped first, so settings that are
    /// not persisted (or belong to another backend) never survive a save.
    pub fn save(&self, node: &mut ConfigNode) {
        match self {
            Connection::Local(c) => c.save(node),
            Connection::Ftp(c) => c.save(node),
            Connection::S3(c) => c.save(node),
            Connection::Gs(c) => c.save(node),
            Connection::Webdav(c) => c.save(node),
        }
    }

    /// Check every mandatory setting is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Connection::Local(c) => c.validate(),
            Connection::Ftp(c) => c.validate(),
            Connection::S3(c) => c.validate(),
            Connection::Gs(c) => c.validate(),
            Connection::Webdav(c) => c.validate(),
        }
    }

    /// Bind a new transfer manager to the current settings.
    ///
    /// No I/O happens here; reachability is checked on first use.
    pub fn create_transfer_manager(&self) -> Result<BoxedTransferManager, ConfigError> {
        self.validate()?;

        let manager = match self {
            Connection::Local(c) => OperatorTransferManager::boxed(c.clone()),
            Connection::Ftp(c) => OperatorTransferManager::boxed(c.clone()),
            Connection::S3(c) => OperatorTransferManager::boxed(c.clone()),
            Connection::Gs(c) => OperatorTransferManager::boxed(c.clone()),
            Connection::Webdav(c) => OperatorTransferManager::boxed(c.clone()),
        };
        tracing::debug!("Created {} transfer manager", self.plugin_id());
        Ok(manager)
    }

    /// Localized summary of identity fields, for diagnostics.
    pub fn display<'a>(&'a self, bundle: &'a ResourceBundle) -> ConnectionDisplay<'a> {
        ConnectionDisplay {
            connection: self,
            bundle,
        }
    }
}

impl From<LocalConnection> for Connection {
    fn from(c: LocalConnection) -> Self {
        Connection::Local(c)
    }
}

impl From<FtpConnection> for Connection {
    fn from(c: FtpConnection) -> Self {
        Connection::Ftp(c)
    }
}

impl From<S3Connection> for Connection {
    fn from(c: S3Connection) -> Self {
        Connection::S3(c)
    }
}

impl From<GsConnection> for Connection {
    fn from(c: GsConnection) -> Self {
        Connection::Gs(c)
    }
}

impl From<WebdavConnection> for Connection {
    fn from(c: WebdavConnection) -> Self {
        Connection::Webdav(c)
    }
}

/// Helper returned by [`Connection::display`].
pub struct ConnectionDisplay<'a> {
    connection: &'a Connection,
    bundle: &'a ResourceBundle,
}

impl fmt::Display for ConnectionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.connection {
            Connection::Local(c) => c.summary(self.bundle, f),
            Connection::Ftp(c) => c.summary(self.bundle, f),
            Connection::S3(c) => c.summary(self.bundle, f),
            Connection::Gs(c) => c.summary(self.bundle, f),
            Connection::Webdav(c) => c.summary(self.bundle, f),
        }
    }
}

/// Store a freshly loaded value, or reset to empty when loading failed.
pub(crate) fn load_or_reset<T: Default>(
    slot: &mut T,
    loaded: Result<T, ConfigError>,
) -> Result<(), ConfigError> {
    match loaded {
        Ok(value) => {
            *slot = value;
            Ok(())
        }
        Err(e) => {
            *slot = T::default();
            Err(e)
        }
    }
}

/// Host as written in a URL authority. IPv6 literals get brackets.
pub(crate) fn url_host(host: &str) -> String {
    let host = host.trim();
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Validate a host by building its endpoint URL.
pub(crate) fn endpoint_url(scheme: &str, host: &str, port: u16) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: "host",
        value: host.to_string(),
        reason,
    };

    let url = Url::parse(&format!("{}://{}:{}/", scheme, url_host(host), port))
        .map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("no host name".to_string()));
    }
    Ok(url)
}

/// Fail with [`ConfigError::Incomplete`] when `value` is empty.
pub(crate) fn ensure_set(
    connection: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Incomplete { connection, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_node() -> ConfigNode {
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "s3");
        node.set_property("accessKey", "AK");
        node.set_property("secretKey", "SK");
        node.set_property("bucket", "b1");
        node
    }

    #[test]
    fn test_s3_scenario() {
        let registry = PluginRegistry::with_builtin_plugins();
        let mut connection = registry.create_connection("s3").unwrap();
        connection.load(&s3_node()).unwrap();

        let Connection::S3(s3) = &connection else {
            panic!("expected an S3 connection");
        };
        assert_eq!(s3.rest().bucket(), "b1");
        assert_eq!(s3.location(), crate::plugins::s3::DEFAULT_LOCATION);

        let mut saved = ConfigNode::new("connection");
        connection.save(&mut saved);
        assert_eq!(saved.attribute("type"), Some("s3"));
        let props: Vec<_> = saved.properties().iter().collect();
        assert_eq!(
            props,
            vec![
                ("accessKey", "AK"),
                ("secretKey", "SK"),
                ("bucket", "b1"),
                ("location", "us-east-1"),
            ]
        );
    }

    #[test]
    fn test_save_into_loaded_node_drops_throttle() {
        let registry = PluginRegistry::with_builtin_plugins();
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "local");
        node.set_property("folder", "/srv/repo");
        node.set_property("throttle-kbps", "256");

        let connection = registry.connection_from_node(&node).unwrap();
        connection.save(&mut node);
        assert_eq!(node.property("throttle-kbps"), None);

        let Connection::Local(reloaded) = registry.connection_from_node(&node).unwrap() else {
            panic!("expected a local connection");
        };
        assert_eq!(reloaded.throttle_kbps(), 0);
    }

    #[test]
    fn test_save_drops_cleared_endpoint() {
        let mut node = s3_node();
        node.set_property("endpoint", "http://localhost:9000");

        let mut s3 = S3Connection::default();
        s3.load(&node).unwrap();
        s3.set_endpoint(None);

        Connection::S3(s3).save(&mut node);
        assert_eq!(node.property("endpoint"), None);
    }

    #[test]
    fn test_switching_backend_drops_old_settings() {
        let mut node = s3_node();
        let connection: Connection = LocalConnection::new("/srv/repo".into()).into();
        connection.save(&mut node);

        assert_eq!(node.attribute("type"), Some("local"));
        let keys: Vec<_> = node.properties().keys().collect();
        assert_eq!(keys, vec!["folder"]);
    }

    #[test]
    fn test_empty_connection_has_no_transfer_manager() {
        let registry = PluginRegistry::with_builtin_plugins();
        for id in registry.ids() {
            let connection = registry.create_connection(id).unwrap();
            let err = connection.create_transfer_manager().err().unwrap();
            assert!(matches!(err, ConfigError::Incomplete { .. }), "{}", id);
        }
    }

    #[test]
    fn test_failed_load_resets_connection() {
        let registry = PluginRegistry::with_builtin_plugins();
        let mut connection = registry.create_connection("s3").unwrap();
        connection.load(&s3_node()).unwrap();
        assert!(connection.create_transfer_manager().is_ok());

        let mut broken = s3_node();
        broken.remove_property("bucket");
        let err = connection.load(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "bucket", .. }));
        assert!(connection.create_transfer_manager().is_err());
    }

    #[test]
    fn test_transfer_manager_matches_plugin() {
        let connection: Connection = LocalConnection::new("/srv/repo".into()).into();
        let manager = connection.create_transfer_manager().unwrap();
        assert_eq!(manager.plugin_id(), "local");
    }

    #[test]
    fn test_display_hides_secrets() {
        let registry = PluginRegistry::with_builtin_plugins();
        let bundle = ResourceBundle::english().unwrap();

        let mut connection = registry.create_connection("s3").unwrap();
        connection.load(&s3_node()).unwrap();
        let text = connection.display(&bundle).to_string();
        assert_eq!(text, "S3Connection[Bucket=b1, Location=us-east-1]");
        assert!(!text.contains("SK"));
        assert!(!format!("{:?}", connection).contains("SK"));
    }

    #[test]
    fn test_endpoint_url() {
        assert!(endpoint_url("ftp", "ftp.example.com", 21).is_ok());
        assert!(endpoint_url("ftp", "", 21).is_err());
        assert!(endpoint_url("ftp", "bad host", 21).is_err());
    }

    #[test]
    fn test_endpoint_url_ipv6() {
        assert_eq!(url_host("::1"), "[::1]");
        assert_eq!(url_host("[fe80::1]"), "[fe80::1]");
        assert_eq!(url_host(" example.com "), "example.com");

        let url = endpoint_url("http", "::1", 8080).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/");
        assert!(endpoint_url("ftp", "::zz::", 21).is_err());
    }
}
