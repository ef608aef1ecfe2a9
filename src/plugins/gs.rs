//! Google Storage backend, using HMAC interoperability keys.

use opendal::Operator;
use std::fmt;

use super::connection::{Connection, load_or_reset};
use super::rest::{
    CredentialBuilder, CredentialProvider, ProviderCredentials, RestSettings, build_rest_operator,
};
use super::types::{PluginInfo, PluginVersion};
use crate::config::ConfigNode;
use crate::error::ConfigError;
use crate::i18n::ResourceBundle;
use crate::transfer::OperatorSource;

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(
        GsConnection::PLUGIN_ID,
        "Google Storage",
        PluginVersion::new(&[0, 1]),
        "use_gs_bucket",
        || Connection::Gs(GsConnection::default()),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GsConnection {
    rest: RestSettings,
}

impl GsConnection {
    pub fn new(rest: RestSettings) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &RestSettings {
        &self.rest
    }

    pub fn rest_mut(&mut self) -> &mut RestSettings {
        &mut self.rest
    }

    pub fn load(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        let loaded = RestSettings::from_node("gs", node).map(Self::new);
        load_or_reset(self, loaded)
    }

    pub fn save(&self, node: &mut ConfigNode) {
        self.rest.save(Self::PLUGIN_ID, node);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rest.validate("gs")
    }

    pub(crate) fn summary(&self, bundle: &ResourceBundle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GsConnection[{}={}]",
            bundle.get("gs_bucket"),
            self.rest.bucket()
        )
    }
}

impl CredentialBuilder for GsConnection {
    fn create_credentials(&self) -> ProviderCredentials {
        ProviderCredentials::new(
            CredentialProvider::Google,
            self.rest.access_key(),
            self.rest.secret_key(),
        )
    }
}

impl OperatorSource for GsConnection {
    const PLUGIN_ID: &'static str = "gs";

    fn build_operator(&self) -> Result<Operator, opendal::Error> {
        build_rest_operator(self.rest.bucket(), &self.create_credentials(), "auto", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gs_node() -> ConfigNode {
        let mut node = ConfigNode::new("connection");
        node.set_attribute("type", "gs");
        node.set_property("accessKey", "GOOG1EXAMPLE");
        node.set_property("secretKey", "SK");
        node.set_property("bucket", "photos");
        node
    }

    #[test]
    fn test_load_save() {
        let mut connection = GsConnection::default();
        connection.load(&gs_node()).unwrap();
        assert_eq!(connection.rest().bucket(), "photos");

        let mut saved = ConfigNode::new("connection");
        connection.save(&mut saved);
        assert_eq!(saved.attribute("type"), Some("gs"));
        assert_eq!(saved.property("location"), None);
        assert_eq!(saved.properties().len(), 3);
    }

    #[test]
    fn test_missing_secret_key() {
        let mut node = gs_node();
        node.remove_property("secretKey");

        let mut connection = GsConnection::default();
        let err = connection.load(&node).unwrap_err();
        assert_eq!(err.to_string(), "gs connection must contain a 'secretKey'");
        assert_eq!(connection, GsConnection::default());
    }

    #[test]
    fn test_credentials_are_google() {
        let mut connection = GsConnection::default();
        connection.load(&gs_node()).unwrap();

        let credentials = connection.create_credentials();
        assert_eq!(credentials.provider(), CredentialProvider::Google);
        assert_eq!(credentials.access_key(), "GOOG1EXAMPLE");
        assert!(connection.build_operator().is_ok());
    }

    #[test]
    fn test_summary() {
        let bundle = ResourceBundle::english().unwrap();
        let connection = Connection::Gs(GsConnection::new(RestSettings::new(
            "AK".into(),
            "SK".into(),
            "photos".into(),
        )));
        assert_eq!(
            connection.display(&bundle).to_string(),
            "GsConnection[Bucket=photos]"
        );
    }
}
