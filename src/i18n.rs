//! Localized strings for diagnostics and plugin descriptions.
//!
//! Bundles are JSON files embedded from `locales/` at build time.

use rust_embed::RustEmbed;
use std::collections::HashMap;

use crate::error::ConfigError;

const FALLBACK_LANG: &str = "en";

#[derive(RustEmbed)]
#[folder = "locales/"]
struct Locales;

/// A set of localized strings for one language, with English fallback.
#[derive(Debug, Clone)]
pub struct ResourceBundle {
    lang: String,
    strings: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl ResourceBundle {
    /// Load the bundle for `lang` (e.g. "de" or "de-AT").
    ///
    /// Unknown languages resolve to English.
    pub fn load(lang: &str) -> Result<Self, ConfigError> {
        let fallback = Self::read_bundle(FALLBACK_LANG)?.unwrap_or_default();

        let primary = lang.split(['-', '_']).next().unwrap_or(lang).to_lowercase();
        let (lang, strings) = match Self::read_bundle(&primary)? {
            Some(strings) => (primary, strings),
            None => {
                tracing::debug!("No locale bundle for '{}', using English", lang);
                (FALLBACK_LANG.to_string(), fallback.clone())
            }
        };

        Ok(Self {
            lang,
            strings,
            fallback,
        })
    }

    /// Load the English bundle.
    pub fn english() -> Result<Self, ConfigError> {
        Self::load(FALLBACK_LANG)
    }

    fn read_bundle(lang: &str) -> Result<Option<HashMap<String, String>>, ConfigError> {
        let Some(file) = Locales::get(&format!("{}.json", lang)) else {
            return Ok(None);
        };
        serde_json::from_slice(&file.data)
            .map(Some)
            .map_err(|e| ConfigError::Locale {
                lang: lang.to_string(),
                reason: e.to_string(),
            })
    }

    /// The language actually in use.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Look up a string. Missing keys fall back to English, then to the key.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_bundle() {
        let bundle = ResourceBundle::english().unwrap();
        assert_eq!(bundle.lang(), "en");
        assert_eq!(bundle.get("local_folder"), "Folder");
    }

    #[test]
    fn test_regional_variant_uses_base_language() {
        let bundle = ResourceBundle::load("de-AT").unwrap();
        assert_eq!(bundle.lang(), "de");
        assert_eq!(bundle.get("local_folder"), "Ordner");
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let bundle = ResourceBundle::load("xx").unwrap();
        assert_eq!(bundle.lang(), "en");
        assert_eq!(bundle.get("bucket"), "Bucket");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        let bundle = ResourceBundle::english().unwrap();
        assert_eq!(bundle.get("no_such_key"), "no_such_key");
    }
}
