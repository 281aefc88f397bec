//! Named map sources.
//!
//! The registry maps a display name to a tile URL template. A download
//! request only carries the template, so the registry is also what turns a
//! template back into the style name the cache is keyed by.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Map sources compiled into the binary.
const EMBEDDED_SOURCES: &str = include_str!("../../config/map_sources.json");

/// Style name used for templates that are not in the registry.
pub const DEFAULT_STYLE: &str = "default";

/// Errors raised while loading a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read map sources from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid map sources JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only registry of `name -> url template` pairs.
///
/// Serialises as the plain JSON object it was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MapSourceRegistry {
    sources: BTreeMap<String, String>,
}

impl MapSourceRegistry {
    /// Parses a JSON object of `name -> template`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let sources = serde_json::from_str(json)?;
        Ok(Self { sources })
    }

    /// Loads a registry file, replacing the embedded defaults entirely.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The registry shipped with the crate.
    pub fn embedded() -> Self {
        // Checked by test_embedded_registry_parses
        Self::from_json(EMBEDDED_SOURCES).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Template registered under `name`.
    pub fn template(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Reverse lookup of a template's display name.
    ///
    /// Unknown templates resolve to [`DEFAULT_STYLE`]. When several names
    /// share a template the alphabetically first one wins.
    pub fn style_name_for(&self, template: &str) -> &str {
        self.sources
            .iter()
            .find(|(_, url)| url.as_str() == template)
            .map(|(name, _)| name.as_str())
            .unwrap_or(DEFAULT_STYLE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_registry_parses() {
        let registry = MapSourceRegistry::from_json(EMBEDDED_SOURCES).unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry, MapSourceRegistry::embedded());
        for (_, template) in registry.iter() {
            for placeholder in ["{z}", "{x}", "{y}"] {
                assert!(template.contains(placeholder), "{template}");
            }
        }
    }

    #[test]
    fn test_style_name_lookup() {
        let registry = MapSourceRegistry::embedded();
        let osm = registry.template("OpenStreetMap").unwrap().to_string();

        assert_eq!(registry.style_name_for(&osm), "OpenStreetMap");
        assert_eq!(registry.style_name_for("https://nowhere/{z}/{x}/{y}"), DEFAULT_STYLE);
    }

    #[test]
    fn test_serialises_as_plain_object() {
        let registry = MapSourceRegistry::from_json(r#"{"A": "u1", "B": "u2"}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&registry).unwrap(),
            r#"{"A":"u1","B":"u2"}"#
        );
    }

    #[test]
    fn test_from_file_and_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Local": "http://localhost/{{z}}/{{x}}/{{y}}.png"}}"#).unwrap();

        let registry = MapSourceRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.template("Local"), Some("http://localhost/{z}/{x}/{y}.png"));

        assert!(matches!(
            MapSourceRegistry::from_json("[1, 2]"),
            Err(RegistryError::Parse(_))
        ));
        assert!(matches!(
            MapSourceRegistry::from_file(Path::new("/definitely/not/here.json")),
            Err(RegistryError::Io { .. })
        ));
    }
}
