//! Merged settings document and typed decoding
//!
//! After binding, the config file, the prefixed environment and the flag
//! values are layered into one nested mapping that can be decoded into any
//! `serde` type. Flag and environment values stay strings in the mapping and
//! are converted to the target's field types while decoding.

use crate::error::{Error, Result};
use crate::merge::{Resolution, Sources};
use crate::tree::CommandTree;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

mod lenient;

use lenient::Lenient;

/// The merged key/value document of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Mapping,
}

impl Settings {
    /// Layer the file document, then the prefixed environment, then every
    /// bound flag value. Later layers win.
    pub fn build(tree: &CommandTree, resolution: &Resolution, sources: &Sources<'_>) -> Self {
        let mut root = sources.store.document().clone();

        if let Some(prefix) = sources.env_prefix {
            for (variable, key, value) in sources.environment.prefixed(prefix) {
                if !insert(&mut root, &key, Value::from(value), false) {
                    tracing::trace!(variable, key = %key, "Environment key collides with existing settings, skipping");
                }
            }
        }

        for binding in resolution.bindings() {
            let Some(value) = tree.flag(binding.flag).value() else { continue };
            for key in &binding.keys {
                insert(&mut root, key.as_str(), Value::from(value), true);
            }
        }

        Self { root }
    }

    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    /// The value at a dotted key, e.g. `noun.verb-flag`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        segments.try_fold(self.root.get(first)?, |node, segment| node.get(segment))
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).map_err(Error::Encode)
    }

    /// Decode into `T`. String scalars parse into numeric and boolean
    /// fields, and numbers or booleans render into string fields.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(Lenient(Value::Mapping(self.root.clone()))).map_err(Error::Decode)
    }

    /// Decode into an existing target. Fields missing from the settings
    /// take the type's `serde` defaults.
    pub fn decode_into<T: DeserializeOwned>(&self, target: &mut T) -> Result<()> {
        *target = self.decode()?;
        Ok(())
    }
}

/// Write `value` at a dotted key. Without `overwrite`, the write is refused
/// when the key already holds a value, or when it would turn a scalar into a
/// mapping or a mapping into a scalar.
fn insert(root: &mut Mapping, key: &str, value: Value, overwrite: bool) -> bool {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else { return false };

    let mut node = root;
    for segment in parents {
        let slot = Value::String(segment.to_string());
        let is_mapping = matches!(node.get(&slot), Some(Value::Mapping(_)));
        if !is_mapping {
            if node.contains_key(&slot) && !overwrite {
                return false;
            }
            node.insert(slot.clone(), Value::Mapping(Mapping::new()));
        }
        node = match node.get_mut(&slot) {
            Some(Value::Mapping(child)) => child,
            _ => return false,
        };
    }

    let slot = Value::String(last.to_string());
    if !overwrite && node.contains_key(&slot) {
        return false;
    }
    node.insert(slot, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::env::Environment;
    use crate::merge::{resolve, MergeOptions};
    use crate::tree::FlagSpec;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Server {
        #[serde(default)]
        host: Option<String>,
        port: u16,
        #[serde(default)]
        debug: bool,
    }

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).expect("yaml")
    }

    #[test]
    fn test_insert_respects_shape_without_overwrite() {
        let mut root = mapping("noun: scalar\ndb:\n  host: h\n");
        assert!(!insert(&mut root, "noun.flag", Value::from("x"), false));
        assert!(!insert(&mut root, "db", Value::from("x"), false));
        assert!(insert(&mut root, "db.port", Value::from(5432), false));
        assert!(insert(&mut root, "noun.flag", Value::from("x"), true));

        let settings = Settings::from_mapping(root);
        assert_eq!(settings.get("noun.flag"), Some(&Value::from("x")));
        assert_eq!(settings.get("db.port"), Some(&Value::from(5432)));
        assert_eq!(settings.get("db.host"), Some(&Value::from("h")));
    }

    #[test]
    fn test_build_layers_file_env_and_flags() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let serve = tree.add_command(root, "serve");
        tree.add_flag(serve, FlagSpec::new("port").with_default("8080"));
        tree.add_flag(serve, FlagSpec::new("host"));

        let store = ConfigStore::from_document(
            None,
            serde_yaml::from_str("serve:\n  host: file-host\nlog: info\n").expect("yaml"),
        );
        let env = Environment::from_pairs([("APP_SERVE_DEBUG", "true"), ("APP_LOG", "debug")]);
        let sources = Sources { store: &store, environment: &env, env_prefix: Some("APP") };
        let options = MergeOptions { prefix_commands: true, ..MergeOptions::default() };

        let resolution = resolve(&mut tree, serve, &sources, options, None).expect("resolve");
        let settings = Settings::build(&tree, &resolution, &sources);

        // the file already holds `log`, so the environment overlay leaves it alone
        assert_eq!(settings.get("log"), Some(&Value::from("info")));
        assert_eq!(settings.get("serve.host"), Some(&Value::from("file-host")));
        assert_eq!(settings.get("host"), Some(&Value::from("file-host")));
        assert_eq!(settings.get("port"), Some(&Value::from("8080")));

        let server: Server = Settings::from_mapping(
            settings.get("serve").and_then(Value::as_mapping).cloned().expect("serve"),
        )
        .decode()
        .expect("decode");
        assert_eq!(
            server,
            Server { host: Some("file-host".into()), port: 8080, debug: true }
        );
    }

    #[test]
    fn test_decode_type_mismatch() {
        let settings = Settings::from_mapping(mapping("port: not-a-number\n"));
        let err = settings.decode::<Server>().expect_err("mismatch");
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_numeric_flag_value_decodes_into_string_and_number_fields() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Named {
            name: String,
            port: u16,
        }

        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let name = tree.add_flag(root, FlagSpec::new("name"));
        tree.flag_mut(name).set_explicit("42");
        tree.add_flag(root, FlagSpec::new("port").with_default("8080"));

        let store = ConfigStore::empty();
        let env = Environment::default();
        let sources = Sources { store: &store, environment: &env, env_prefix: None };
        let resolution =
            resolve(&mut tree, root, &sources, MergeOptions::default(), None).expect("resolve");
        let settings = Settings::build(&tree, &resolution, &sources);

        assert_eq!(settings.get("name"), Some(&Value::from("42")));
        let named: Named = settings.decode().expect("decode");
        assert_eq!(named, Named { name: "42".into(), port: 8080 });
    }

    #[test]
    fn test_decode_into_replaces_target() {
        let settings = Settings::from_mapping(mapping("port: 9000\n"));
        let mut server = Server { host: Some("old".into()), port: 1, debug: true };
        settings.decode_into(&mut server).expect("decode");
        assert_eq!(server, Server { host: None, port: 9000, debug: false });
    }

    #[test]
    fn test_to_yaml_renders_nested_document() {
        let settings = Settings::from_mapping(mapping("noun:\n  nounflag: val1\n"));
        let yaml = settings.to_yaml().expect("yaml");
        assert!(yaml.contains("noun:"));
        assert!(yaml.contains("nounflag: val1"));
    }
}
