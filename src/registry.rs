//! Symbol registry: symbol id -> rendering metadata
//!
//! The registry is loaded once from a JSON object keyed by symbol id and is
//! read-only afterwards. Lookups never fall back to a default entry; an
//! unknown id is always an error.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a registry
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read symbol registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse symbol registry JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A lookup for an id the registry does not contain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown symbol '{id}'")]
pub struct UnknownSymbolError {
    pub id: SymbolId,
}

/// Identifier of a symbol class, as predicted by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Rendering metadata for one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Document source emitted for the symbol
    pub command: String,
    /// Emit inside math delimiters
    pub mathmode: bool,
    /// The command is valid in text mode
    pub textmode: bool,
    /// Style hook used by front ends that preview the symbol
    pub css_class: String,
    /// Package the command needs, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Font encoding the command needs, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fontenc: Option<String>,
}

/// Immutable symbol id -> [`SymbolInfo`] table
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    symbols: HashMap<SymbolId, SymbolInfo>,
}

/// Map form that tolerates repeated keys, keeping the last value
struct RegistryEntries {
    symbols: HashMap<SymbolId, SymbolInfo>,
    duplicates: Vec<SymbolId>,
}

impl<'de> Deserialize<'de> for RegistryEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RegistryEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping symbol ids to symbol metadata")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut symbols = HashMap::with_capacity(map.size_hint().unwrap_or(0));
                let mut duplicates = Vec::new();
                while let Some((id, info)) = map.next_entry::<SymbolId, SymbolInfo>()? {
                    if symbols.insert(id.clone(), info).is_some() {
                        duplicates.push(id);
                    }
                }
                Ok(RegistryEntries {
                    symbols,
                    duplicates,
                })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl SymbolRegistry {
    /// Load a registry from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&content)?;
        log::info!(
            "event=registry_load status=ok path={} symbols={}",
            path.display(),
            registry.len()
        );
        Ok(registry)
    }

    /// Load a registry from a JSON string.
    ///
    /// A repeated id keeps its last definition; this is logged, not rejected.
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        let entries: RegistryEntries = serde_json::from_str(content)?;
        for id in &entries.duplicates {
            log::warn!("event=registry_duplicate id={} status=overwritten", id);
        }
        Ok(Self {
            symbols: entries.symbols,
        })
    }

    /// Build a registry from already constructed entries
    pub fn from_entries(entries: impl IntoIterator<Item = (SymbolId, SymbolInfo)>) -> Self {
        Self {
            symbols: entries.into_iter().collect(),
        }
    }

    /// Metadata for `id`, or an error if the registry does not know it
    pub fn lookup(&self, id: &SymbolId) -> Result<&SymbolInfo, UnknownSymbolError> {
        self.symbols
            .get(id)
            .ok_or_else(|| UnknownSymbolError { id: id.clone() })
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.symbols.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<&SymbolId> {
        let mut ids: Vec<&SymbolId> = self.symbols.keys().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "plus": {"command": "+", "mathmode": true, "textmode": false, "css_class": "plus"},
        "x": {"command": "x", "mathmode": false, "textmode": true, "css_class": "x"},
        "therefore": {
            "command": "\\therefore", "mathmode": true, "textmode": false,
            "css_class": "therefore", "package": "amssymb"
        },
        "guillemotleft": {
            "command": "\\guillemotleft", "mathmode": false, "textmode": true,
            "css_class": "guillemotleft", "fontenc": "T1"
        }
    }"#;

    #[test]
    fn test_load_and_lookup() {
        let registry = SymbolRegistry::from_json(SAMPLE).expect("Should parse");
        assert_eq!(registry.len(), 4);

        let plus = registry.lookup(&"plus".into()).unwrap();
        assert_eq!(plus.command, "+");
        assert!(plus.mathmode);
        assert_eq!(plus.package, None);

        let therefore = registry.lookup(&"therefore".into()).unwrap();
        assert_eq!(therefore.package.as_deref(), Some("amssymb"));

        let guillemot = registry.lookup(&"guillemotleft".into()).unwrap();
        assert_eq!(guillemot.fontenc.as_deref(), Some("T1"));
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let registry = SymbolRegistry::from_json(SAMPLE).unwrap();
        let err = registry.lookup(&"does-not-exist".into()).unwrap_err();
        assert_eq!(err.id.as_str(), "does-not-exist");
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let registry = SymbolRegistry::from_json(
            r#"{
                "a": {"command": "first", "mathmode": false, "textmode": true, "css_class": "a"},
                "a": {"command": "second", "mathmode": false, "textmode": true, "css_class": "a"}
            }"#,
        )
        .expect("Duplicates are not fatal");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(&"a".into()).unwrap().command, "second");
    }

    #[test]
    fn test_missing_required_field() {
        let result = SymbolRegistry::from_json(r#"{"a": {"command": "a", "mathmode": true}}"#);
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_not_an_object() {
        assert!(SymbolRegistry::from_json("[1, 2, 3]").is_err());
        assert!(SymbolRegistry::from_json("this is not json").is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = SymbolRegistry::from_file(Path::new("/nonexistent/registry.json"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_ids_sorted() {
        let registry = SymbolRegistry::from_json(SAMPLE).unwrap();
        let ids: Vec<&str> = registry.ids().into_iter().map(SymbolId::as_str).collect();
        assert_eq!(ids, vec!["guillemotleft", "plus", "therefore", "x"]);
    }
}
