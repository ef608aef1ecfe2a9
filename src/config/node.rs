//! Generic key/value settings tree.
//!
//! A [`ConfigNode`] holds string attributes (the `type` discriminator lives
//! here), string properties and nested child nodes. Property order is the
//! insertion order, which is also the order written to disk.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Insertion-ordered string map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap(Vec<(String, String)>);

impl OrderedMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a value, replacing an existing entry in place.
    pub fn insert(&mut self, key: &str, value: String) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor;

        impl<'de> Visitor<'de> for OrderedMapVisitor {
            type Value = OrderedMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<OrderedMap, A::Error> {
                let mut map = OrderedMap::default();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    map.insert(&key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor)
    }
}

/// A persisted settings node.
///
/// # Example
///
/// ```
/// use syncremote::config::ConfigNode;
///
/// let mut node = ConfigNode::new("connection");
/// node.set_attribute("type", "local");
/// node.set_property("folder", "/srv/repo");
///
/// assert_eq!(node.property("folder"), Some("/srv/repo"));
/// assert_eq!(node.integer("throttle-kbps", 0), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    name: String,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    attributes: OrderedMap,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    properties: OrderedMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== Attributes ==========

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: &str, value: impl fmt::Display) {
        self.attributes.insert(key, value.to_string());
    }

    pub fn attributes(&self) -> &OrderedMap {
        &self.attributes
    }

    // ========== Properties ==========

    /// Get a property, `None` if absent.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Get a property or the given default.
    pub fn property_or(&self, key: &str, default: &str) -> String {
        self.property(key).unwrap_or(default).to_string()
    }

    /// Get a mandatory property, naming the field when it is missing.
    pub fn require(&self, connection: &'static str, key: &'static str) -> Result<&str, ConfigError> {
        self.property(key).ok_or(ConfigError::MissingField {
            connection,
            field: key,
        })
    }

    /// Get an integer property. Falls back to `default` when the property is
    /// absent or not a valid integer.
    pub fn integer(&self, key: &str, default: i64) -> i64 {
        self.property(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Parse a property strictly: absent is `Ok(None)`, malformed is an error.
    pub fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.property(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    field: key,
                    value: raw.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Get a boolean property. Unrecognised values fall back to `default`.
    pub fn boolean(&self, key: &str, default: bool) -> bool {
        match self.property(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) => match v.as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            None => default,
        }
    }

    pub fn set_property(&mut self, key: &str, value: impl fmt::Display) {
        self.properties.insert(key, value.to_string());
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    /// Remove every property, keeping attributes and children.
    pub fn clear_properties(&mut self) {
        self.properties = OrderedMap::default();
    }

    pub fn properties(&self) -> &OrderedMap {
        &self.properties
    }

    // ========== Children ==========

    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Find a child by name, appending an empty one if there is none.
    pub fn child_or_insert(&mut self, name: &str) -> &mut ConfigNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(ConfigNode::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    // ========== Persistence ==========

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a node from a JSON file.
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Write a node to a JSON file, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json_string()?).map_err(io_err)
    }
}
