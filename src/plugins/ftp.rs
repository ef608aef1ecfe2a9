//! FTP backend.

use opendal::Operator;
use opendal::layers::LoggingLayer;
use opendal::services::Ftp;
use std::fmt;

use super::connection::{Connection, endpoint_url, ensure_set, load_or_reset, url_host};
use super::types::{PluginInfo, PluginVersion};
use crate::config::ConfigNode;
use crate::error::ConfigError;
use crate::i18n::ResourceBundle;
use crate::transfer::OperatorSource;

pub const DEFAULT_PORT: u16 = 21;

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(
        FtpConnection::PLUGIN_ID,
        "FTP",
        PluginVersion::new(&[0, 1]),
        "use_ftp_folder",
        || Connection::Ftp(FtpConnection::default()),
    )
}

/// Settings for a folder on an FTP server.
#[derive(Clone, PartialEq, Eq)]
pub struct FtpConnection {
    host: String,
    port: u16,
    username: String,
    password: String,
    path: String,
}

impl Default for FtpConnection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            path: String::new(),
        }
    }
}

impl FtpConnection {
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

    /// Remote folder, relative to the login directory unless absolute.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    /// `ftp://host:port` as handed to the backend.
    pub fn endpoint(&self) -> String {
        format!("ftp://{}:{}", url_host(&self.host), self.port)
    }

    fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        let host = node.require("ftp", "host")?.trim().to_string();
        let username = node.require("ftp", "username")?.to_string();
        let password = node.require("ftp", "password")?.to_string();
        let path = node.require("ftp", "path")?.to_string();
        let port = node.parse::<u16>("port")?.unwrap_or(DEFAULT_PORT);

        endpoint_url("ftp", &host, port)?;

        Ok(Self {
            host,
            port,
            username,
            password,
            path,
        })
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
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_set("ftp", "host", &self.host)?;
        ensure_set("ftp", "username", &self.username)?;
        ensure_set("ftp", "password", &self.password)?;
        ensure_set("ftp", "path", &self.path)
    }

    pub(crate) fn summary(&self, bundle: &ResourceBundle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FtpConnection[{}={}:{}, {}={}, {}={}]",
            bundle.get("ftp_host"),
            self.host,
            self.port,
            bundle.get("ftp_username"),
            self.username,
            bundle.get("ftp_path"),
            self.path
        )
    }
}

impl fmt::Debug for FtpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("path", &self.path)
            .finish()
    }
}

impl OperatorSource for FtpConnection {
    const PLUGIN_ID: &'static str = "ftp";

    fn build_operator(&self) -> Result<Operator, opendal::Error> {
        let builder = Ftp::default()
            .endpoint(&self.endpoint())
            .root(&self.path)
            .user(&self.username)
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

    fn ftp_node() -> ConfigNode {
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "ftp");
        node.set_property("host", "ftp.example.com");
        node.set_property("username", "alice");
        node.set_property("password", "hunter2");
        node.set_property("path", "/backup");
        node
    }

    #[test]
    fn test_default_port() {
        let mut connection = FtpConnection::default();
        connection.load(&ftp_node()).unwrap();
        assert_eq!(connection.port(), DEFAULT_PORT);
        assert_eq!(connection.endpoint(), "ftp://ftp.example.com:21");
    }

    #[test]
    fn test_port_is_parsed_strictly() {
        let mut node = ftp_node();
        node.set_property("port", "2121");
        let mut connection = FtpConnection::default();
        connection.load(&node).unwrap();
        assert_eq!(connection.port(), 2121);

        for bad in ["abc", "70000", "-1"] {
            node.set_property("port", bad);
            let err = connection.load(&node).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { field: "port", .. }), "{}", bad);
            assert_eq!(connection, FtpConnection::default());
        }
    }

    #[test]
    fn test_ipv6_host() {
        let mut node = ftp_node();
        node.set_property("host", "::1");

        let mut connection = FtpConnection::default();
        connection.load(&node).unwrap();
        assert_eq!(connection.endpoint(), "ftp://[::1]:21");
    }

    #[test]
    fn test_invalid_host() {
        let mut node = ftp_node();
        node.set_property("host", "bad host");

        let mut connection = FtpConnection::default();
        let err = connection.load(&node).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "host", .. }));
    }

    #[test]
    fn test_missing_fields_in_order() {
        let mut node = ftp_node();
        node.remove_property("username");
        node.remove_property("path");

        let mut connection = FtpConnection::default();
        let err = connection.load(&node).unwrap_err();
        assert_eq!(err.to_string(), "ftp connection must contain a 'username'");
    }

    #[test]
    fn test_save_round_trip() {
        let mut connection = FtpConnection::default();
        connection.load(&ftp_node()).unwrap();

        let mut saved = ConfigNode::new("connection");
        connection.save(&mut saved);
        assert_eq!(saved.attribute("type"), Some("ftp"));
        assert_eq!(saved.property("port"), Some("21"));

        let mut restored = FtpConnection::default();
        restored.load(&saved).unwrap();
        assert_eq!(restored, connection);
    }

    #[test]
    fn test_secrets_stay_hidden() {
        let mut connection = FtpConnection::default();
        connection.load(&ftp_node()).unwrap();
        assert!(!format!("{:?}", connection).contains("hunter2"));

        let bundle = ResourceBundle::english().unwrap();
        let text = Connection::Ftp(connection).display(&bundle).to_string();
        assert_eq!(
            text,
            "FtpConnection[Host=ftp.example.com:21, Username=alice, Path=/backup]"
        );
    }

    #[test]
    fn test_build_operator() {
        let connection = FtpConnection::new(
            "ftp.example.com".into(),
            "alice".into(),
            "hunter2".into(),
            "/backup".into(),
        );
        assert!(connection.build_operator().is_ok());
    }
}
