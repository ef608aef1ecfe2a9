//! WebDAV backend.

use opendal::Operator;
use opendal::layers::LoggingLayer;
use opendal::services::Webdav;
use std::fmt;

use super::connection::{Connection, endpoint_url, ensure_set, load_or_reset, url_host};
use super::types::{PluginInfo, PluginVersion};
use crate::config::ConfigNode;
use crate::error::ConfigError;
use crate::i18n::ResourceBundle;
use crate::transfer::OperatorSource;

pub const DEFAULT_PORT: u16 = 80;

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(
        WebdavConnection::PLUGIN_ID,
        "WebDAV",
        PluginVersion::new(&[0, 1]),
        "use_webdav_folder",
        || Connection::Webdav(WebdavConnection::default()),
    )
}

#[derive(Clone, PartialEq, Eq)]
pub struct WebdavConnection {
    host: String,
    port: u16,
    secure: bool,
    username: String,
    password: String,
    path: String,
}

impl Default for WebdavConnection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            secure: false,
            username: String::new(),
            password: String::new(),
            path: String::new(),
        }
    }
}

impl WebdavConnection {
    pub fn new(host: String, username: String, password: String, path: String) -> Self {
        Self {
            host,
            username,
            password,
            path,
            ..Self::default()
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: String) {
        self.host = host;
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Use HTTPS. The port is not adjusted.
    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: String) {
        self.password = password;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    pub fn endpoint(&self) -> String {
        format!("{}://{}:{}", self.scheme(), url_host(&self.host), self.port)
    }

    fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        let host = node.require("webdav", "host")?.trim().to_string();
        let username = node.require("webdav", "username")?.to_string();
        let password = node.require("webdav", "password")?.to_string();
        let path = node.require("webdav", "path")?.to_string();

        let port = node.parse::<u16>("port")?.unwrap_or(DEFAULT_PORT);
        let secure = node.boolean("secure", false);

        let connection = Self {
            host,
            port,
            secure,
            username,
            password,
            path,
        };
        endpoint_url(connection.scheme(), &connection.host, port)?;

        Ok(connection)
    }

    pub fn load(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        load_or_reset(self, Self::from_node(node))
    }

    pub fn save(&self, node: &mut ConfigNode) {
        node.clear_properties();
        node.set_attribute("type", Self::PLUGIN_ID);
        node.set_property("host", &self.host);
        node.set_property("username", &self.username);
        node.set_property("password", &self.password);
        node.set_property("path", &self.path);
        node.set_property("port", self.port);
        node.set_property("secure", self.secure);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_set("webdav", "host", &self.host)?;
        ensure_set("webdav", "username", &self.username)?;
        ensure_set("webdav", "password", &self.password)?;
        ensure_set("webdav", "path", &self.path)
    }

    pub(crate) fn summary(&self, bundle: &ResourceBundle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WebdavConnection[{}={}, {}={}, {}={}]",
            bundle.get("webdav_host"),
            self.endpoint(),
            bundle.get("webdav_username"),
            self.username,
            bundle.get("webdav_path"),
            self.path
        )
    }
}

impl fmt::Debug for WebdavConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebdavConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl OperatorSource for WebdavConnection {
    const PLUGIN_ID: &'static str = "webdav";

    fn build_operator(&self) -> Result<Operator, opendal::Error> {
        let builder = Webdav::default()
            .endpoint(&self.endpoint())
            .root(&self.path)
            .username(&self.username)
            .password(&self.password);

        let op = Operator::new(builder)?
            .layer(LoggingLayer::default())
            .finish();

        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webdav_node() -> ConfigNode {
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "webdav");
        node.set_property("host", "dav.example.com");
        node.set_property("username", "bob");
        node.set_property("password", "s3cret");
        node.set_property("path", "/remote.php/dav/files/bob");
        node
    }

    #[test]
    fn test_defaults() {
        let mut connection = WebdavConnection::default();
        connection.load(&webdav_node()).unwrap();
        assert_eq!(connection.port(), 80);
        assert!(!connection.secure());
        assert_eq!(connection.endpoint(), "http://dav.example.com:80");
    }

    #[test]
    fn test_secure_keeps_port() {
        let mut node = webdav_node();
        node.set_property("secure", "true");

        let mut connection = WebdavConnection::default();
        connection.load(&node).unwrap();
        assert_eq!(connection.endpoint(), "https://dav.example.com:80");

        node.set_property("port", "443");
        connection.load(&node).unwrap();
        assert_eq!(connection.endpoint(), "https://dav.example.com:443");
    }

    #[test]
    fn test_bad_port_resets() {
        let mut node = webdav_node();
        node.set_property("port", "http");

        let mut connection = WebdavConnection::default();
        let err = connection.load(&node).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "port", .. }));
        assert!(connection.validate().is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let mut node = webdav_node();
        node.set_property("secure", "yes");

        let mut connection = WebdavConnection::default();
        connection.load(&node).unwrap();

        let mut saved = ConfigNode::new("connection");
        connection.save(&mut saved);
        assert_eq!(saved.property("secure"), Some("true"));

        let mut restored = WebdavConnection::default();
        restored.load(&saved).unwrap();
        assert_eq!(restored, connection);
    }

    #[test]
    fn test_summary_hides_password() {
        let mut connection = WebdavConnection::default();
        connection.load(&webdav_node()).unwrap();
        assert!(!format!("{:?}", connection).contains("s3cret"));

        let bundle = ResourceBundle::load("de").unwrap();
        let text = Connection::Webdav(connection).display(&bundle).to_string();
        assert_eq!(
            text,
            "WebdavConnection[Server=http://dav.example.com:80, Benutzername=bob, Pfad=/remote.php/dav/files/bob]"
        );
    }
}
