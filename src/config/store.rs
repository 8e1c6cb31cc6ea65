//! The loaded config file and its load-once source

use super::loader::{load_file, LoadedFile};
use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Read-only view of one config document, addressable by dotted key.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    document: Mapping,
    entries: BTreeMap<String, Value>,
}

impl ConfigStore {
    /// A store with no file behind it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from a parsed document. Keys are lower-cased, and every
    /// leaf is indexed under its dotted path. Sequences are leaves, and null
    /// leaves are left out.
    pub fn from_document(path: Option<PathBuf>, document: Value) -> Self {
        let document = match normalize_keys(document) {
            Value::Mapping(map) => map,
            _ => Mapping::new(),
        };

        let mut entries = BTreeMap::new();
        flatten_into(&document, "", &mut entries);

        Self { path, document, entries }
    }

    /// The file this store was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Mapping {
        &self.document
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The value at `key` rendered as a flag string. Sequences are joined
    /// with `,`. Mappings do not count as a value.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<LoadedFile> for ConfigStore {
    fn from(file: LoadedFile) -> Self {
        Self::from_document(Some(file.path), file.document)
    }
}

#[derive(Debug, Clone)]
enum LoadState {
    Unloaded,
    Loaded(ConfigStore),
}

/// Where the config file comes from, and the store once it has been read.
///
/// The file is read on the first successful [`ConfigSource::load`]. Every
/// later call returns the cached store, even if another path is passed.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    default_name: Option<String>,
    search_paths: Vec<PathBuf>,
    state: LoadState,
}

impl ConfigSource {
    pub fn new(default_name: Option<String>, search_paths: Vec<PathBuf>) -> Self {
        Self { default_name, search_paths, state: LoadState::Unloaded }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn store(&self) -> Option<&ConfigStore> {
        match &self.state {
            LoadState::Loaded(store) => Some(store),
            LoadState::Unloaded => None,
        }
    }

    /// Load the config file if that has not happened yet. A failed load
    /// leaves the source unloaded.
    pub fn load(&mut self, explicit: Option<&Path>) -> Result<&ConfigStore> {
        if let LoadState::Unloaded = self.state {
            let store = load_file(explicit, self.default_name.as_deref(), &self.search_paths)?
                .map(ConfigStore::from)
                .unwrap_or_default();
            self.state = LoadState::Loaded(store);
        } else if let Some(path) = explicit {
            tracing::trace!(file = %path.display(), "Config already loaded, ignoring file");
        }

        match &self.state {
            LoadState::Loaded(store) => Ok(store),
            LoadState::Unloaded => unreachable!("config source was just loaded"),
        }
    }
}

/// Render a scalar or a sequence of scalars the way a flag would hold it.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Mapping(_) => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            Some(parts.join(","))
        }
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
    }
}

fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .filter_map(|(k, v)| {
                    let key = scalar_to_string(&k)?.to_lowercase();
                    Some((Value::String(key), normalize_keys(v)))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn flatten_into(map: &Mapping, prefix: &str, entries: &mut BTreeMap<String, Value>) {
    for (k, v) in map {
        let Some(name) = k.as_str() else { continue };
        let key = if prefix.is_empty() { name.to_string() } else { format!("{}.{}", prefix, name) };
        match v {
            Value::Mapping(nested) => flatten_into(nested, &key, entries),
            Value::Null => {}
            leaf => {
                entries.insert(key, leaf.clone());
            }
        }
    }
}
