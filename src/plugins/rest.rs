//! Shared settings for bucket-style object stores (S3, Google Storage).
//!
//! Both providers accept an access/secret key pair and sign requests the same
//! way, so they share [`RestSettings`] and the operator construction. Each
//! provider implements [`CredentialBuilder`] to produce its own credentials.

use opendal::Operator;
use opendal::layers::LoggingLayer;
use opendal::services::S3;
use std::fmt;

use super::connection::ensure_set;
use crate::config::ConfigNode;
use crate::error::ConfigError;

/// Access key, secret key and bucket of a REST object store.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RestSettings {
    access_key: String,
    secret_key: String,
    bucket: String,
}

impl RestSettings {
    pub fn new(access_key: String, secret_key: String, bucket: String) -> Self {
        Self {
            access_key,
            secret_key,
            bucket,
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn set_access_key(&mut self, access_key: String) {
        self.access_key = access_key;
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn set_secret_key(&mut self, secret_key: String) {
        self.secret_key = secret_key;
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn set_bucket(&mut self, bucket: String) {
        self.bucket = bucket;
    }

    /// Read the shared fields. Runs before the provider's own fields.
    pub(crate) fn from_node(connection: &'static str, node: &ConfigNode) -> Result<Self, ConfigError> {
        Ok(Self {
            access_key: node.require(connection, "accessKey")?.to_string(),
            secret_key: node.require(connection, "secretKey")?.to_string(),
            bucket: node.require(connection, "bucket")?.to_string(),
        })
    }

    /// Replace the node's properties with the type tag and shared fields.
    /// Runs before the provider's own fields.
    pub(crate) fn save(&self, plugin_id: &str, node: &mut ConfigNode) {
        node.clear_properties();
        node.set_attribute("type", plugin_id);
        node.set_property("accessKey", &self.access_key);
        node.set_property("secretKey", &self.secret_key);
        node.set_property("bucket", &self.bucket);
    }

    pub(crate) fn validate(&self, connection: &'static str) -> Result<(), ConfigError> {
        ensure_set(connection, "accessKey", &self.access_key)?;
        ensure_set(connection, "secretKey", &self.secret_key)?;
        ensure_set(connection, "bucket", &self.bucket)
    }
}

impl fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSettings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Which provider a credential pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialProvider {
    /// Amazon Web Services.
    Aws,
    /// Google Storage HMAC interoperability keys.
    Google,
}

impl CredentialProvider {
    /// Fixed request endpoint, `None` to let the region decide.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            CredentialProvider::Aws => None,
            CredentialProvider::Google => Some("https://storage.googleapis.com"),
        }
    }
}

/// Provider credentials, built on demand and never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    provider: CredentialProvider,
    access_key: String,
    secret_key: String,
}

impl ProviderCredentials {
    pub fn new(provider: CredentialProvider, access_key: &str, secret_key: &str) -> Self {
        Self {
            provider,
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    pub fn provider(&self) -> CredentialProvider {
        self.provider
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("provider", &self.provider)
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Builds the provider-specific credential object for a connection.
pub trait CredentialBuilder {
    fn create_credentials(&self) -> ProviderCredentials;
}

/// Build an S3-protocol operator for a bucket.
///
/// `endpoint` overrides the provider's endpoint (S3-compatible services).
pub(crate) fn build_rest_operator(
    bucket: &str,
    credentials: &ProviderCredentials,
    region: &str,
    endpoint: Option<&str>,
) -> Result<Operator, opendal::Error> {
    let mut builder = S3::default()
        .bucket(bucket)
        .region(region)
        .access_key_id(credentials.access_key())
        .secret_access_key(credentials.secret_key())
        .disable_config_load();

    if let Some(ep) = endpoint.or(credentials.provider().endpoint()) {
        builder = builder.endpoint(ep);
    }

    let op = Operator::new(builder)?
        .layer(LoggingLayer::default())
        .finish();

    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fail_in_order() {
        let mut node = ConfigNode::new("connection");
        let err = RestSettings::from_node("s3", &node).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "accessKey", .. }));

        node.set_property("accessKey", "AK");
        node.set_property("secretKey", "SK");
        let err = RestSettings::from_node("s3", &node).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "bucket", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = RestSettings::new("AK".into(), "hunter2".into(), "b".into());
        assert!(!format!("{:?}", settings).contains("hunter2"));

        let credentials = ProviderCredentials::new(CredentialProvider::Aws, "AK", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn test_build_operator_without_io() {
        let credentials = ProviderCredentials::new(CredentialProvider::Google, "AK", "SK");
        let op = build_rest_operator("bucket", &credentials, "auto", None).unwrap();
        assert_eq!(op.info().name(), "bucket");
    }
}
