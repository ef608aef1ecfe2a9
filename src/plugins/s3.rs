//! Amazon S3 backend.
//!
//! Also works with S3-compatible services (MinIO, Cloudflare R2, ...) through
//! the optional `endpoint` property.

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

/// Location used when the config does not name one (US Standard).
pub const DEFAULT_LOCATION: &str = "us-east-1";

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(
        S3Connection::PLUGIN_ID,
        "Amazon S3",
        PluginVersion::new(&[0, 1]),
        "use_s3_bucket",
        || Connection::S3(S3Connection::default()),
    )
}

/// Settings for an Amazon S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Connection {
    rest: RestSettings,
    location: String,
    endpoint: Option<String>,
}

impl Default for S3Connection {
    fn default() -> Self {
        Self {
            rest: RestSettings::default(),
            location: DEFAULT_LOCATION.to_string(),
            endpoint: None,
        }
    }
}

impl S3Connection {
    pub fn new(rest: RestSettings) -> Self {
        Self {
            rest,
            ..Self::default()
        }
    }

    pub fn rest(&self) -> &RestSettings {
        &self.rest
    }

    pub fn rest_mut(&mut self) -> &mut RestSettings {
        &mut self.rest
    }

    /// Bucket location as configured.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: String) {
        self.location = location;
    }

    /// Custom endpoint for S3-compatible services.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.endpoint = endpoint;
    }

    /// Signing region for the configured location.
    ///
    /// Accepts the legacy location names `US` and `EU`.
    pub fn region(&self) -> &str {
        match self.location.trim() {
            "" | "US" => DEFAULT_LOCATION,
            "EU" => "eu-west-1",
            other => other,
        }
    }

    fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        let rest = RestSettings::from_node("s3", node)?;

        let location = node.property_or("location", DEFAULT_LOCATION);
        let endpoint = match node.property("endpoint").map(str::trim) {
            Some(ep) if !ep.is_empty() => {
                url::Url::parse(ep).map_err(|e| ConfigError::InvalidValue {
                    field: "endpoint",
                    value: ep.to_string(),
                    reason: e.to_string(),
                })?;
                Some(ep.to_string())
            }
            _ => None,
        };

        Ok(Self {
            rest,
            location,
            endpoint,
        })
    }

    pub fn load(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        load_or_reset(self, Self::from_node(node))
    }

    pub fn save(&self, node: &mut ConfigNode) {
        self.rest.save(Self::PLUGIN_ID, node);
        node.set_property("location", &self.location);
        if let Some(ep) = &self.endpoint {
            node.set_property("endpoint", ep);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rest.validate("s3")
    }

    pub(crate) fn summary(&self, bundle: &ResourceBundle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S3Connection[{}={}, {}={}]",
            bundle.get("bucket"),
            self.rest.bucket(),
            bundle.get("location"),
            self.location
        )
    }
}

impl CredentialBuilder for S3Connection {
    fn create_credentials(&self) -> ProviderCredentials {
        ProviderCredentials::new(
            CredentialProvider::Aws,
            self.rest.access_key(),
            self.rest.secret_key(),
        )
    }
}

impl OperatorSource for S3Connection {
    const PLUGIN_ID: &'static str = "s3";

    fn build_operator(&self) -> Result<Operator, opendal::Error> {
        build_rest_operator(
            self.rest.bucket(),
            &self.create_credentials(),
            self.region(),
            self.endpoint(),
        )
    }
}
