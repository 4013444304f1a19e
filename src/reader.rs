//! Translation file reader.
//!
//! A translation file is a flat JSON object mapping string keys to string values,
//! named `{namespace}.{culture}.json`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use tracing::error;

use crate::culture::CultureTag;

/// The (namespace, culture) pair a translation file feeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceFile {
    pub namespace: String,
    pub culture: CultureTag,
}

impl ResourceFile {
    /// Derive the identity from a path such as `Resources/messages.fr-CH.json`.
    ///
    /// Returns `None` when the name carries no valid culture suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let (namespace, culture) = stem.rsplit_once('.')?;
        if namespace.is_empty() {
            return None;
        }

        let culture = CultureTag::parse(culture).ok()?;
        Some(Self {
            namespace: namespace.to_string(),
            culture,
        })
    }
}

impl fmt::Display for ResourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.culture)
    }
}

/// Ordered (key, value) pairs of one file.
///
/// A key repeated in the file keeps its first position and its last value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranslationEntries(pub Vec<(String, String)>);

impl TranslationEntries {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for TranslationEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = TranslationEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat JSON object of string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, String)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                let mut positions: HashMap<String, usize> = HashMap::new();

                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    match positions.get(&key) {
                        Some(&pos) => entries[pos].1 = value,
                        None => {
                            positions.insert(key.clone(), entries.len());
                            entries.push((key, value));
                        }
                    }
                }

                Ok(TranslationEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse translation file content.
///
/// Malformed JSON and non-string values are logged and yield no entries.
pub fn parse_translations(path: &Path, bytes: &[u8]) -> TranslationEntries {
    match serde_json::from_slice::<TranslationEntries>(bytes) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Unable to read {}: {}", path.display(), e);
            TranslationEntries::default()
        }
    }
}
